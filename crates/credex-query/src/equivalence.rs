//! # Presentation Request Equivalence
//!
//! Two presentation requests are equivalent when they ask for the same thing,
//! regardless of name, version, nonce, group labels, or the order of
//! `names` and `restrictions` arrays.
//!
//! Every group of one request must pair with exactly one distinct group of
//! the other. Group equality is an equivalence relation, so pairing each
//! group with the first unmatched equal group is complete.

use crate::request::{
    AttributeGroup, NonRevokedInterval, PredicateGroup, PresentationRequest, Restriction,
};

/// Whether `a` and `b` request the same attributes, predicates and
/// restrictions.
pub fn are_equivalent(a: &PresentationRequest, b: &PresentationRequest) -> bool {
    if !intervals_equal(a.non_revoked.as_ref(), b.non_revoked.as_ref()) {
        return false;
    }
    let attributes_a: Vec<_> = a.requested_attributes.values().collect();
    let attributes_b: Vec<_> = b.requested_attributes.values().collect();
    let predicates_a: Vec<_> = a.requested_predicates.values().collect();
    let predicates_b: Vec<_> = b.requested_predicates.values().collect();

    all_paired(&attributes_a, &attributes_b, |x, y| attribute_groups_equal(x, y))
        && all_paired(&predicates_a, &predicates_b, |x, y| predicate_groups_equal(x, y))
}

fn all_paired<T>(left: &[&T], right: &[&T], equal: impl Fn(&T, &T) -> bool) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut matched = vec![false; right.len()];
    left.iter().all(|l| {
        let found = right
            .iter()
            .enumerate()
            .find(|(i, r)| !matched[*i] && equal(l, r))
            .map(|(i, _)| i);
        match found {
            Some(i) => {
                matched[i] = true;
                true
            }
            None => false,
        }
    })
}

fn attribute_groups_equal(a: &AttributeGroup, b: &AttributeGroup) -> bool {
    a.attribute_names() == b.attribute_names()
        && intervals_equal(a.non_revoked.as_ref(), b.non_revoked.as_ref())
        && restrictions_equal(a.restrictions.as_deref(), b.restrictions.as_deref())
}

fn predicate_groups_equal(a: &PredicateGroup, b: &PredicateGroup) -> bool {
    a.name == b.name
        && a.p_type == b.p_type
        && a.p_value == b.p_value
        && intervals_equal(a.non_revoked.as_ref(), b.non_revoked.as_ref())
        && restrictions_equal(a.restrictions.as_deref(), b.restrictions.as_deref())
}

fn intervals_equal(a: Option<&NonRevokedInterval>, b: Option<&NonRevokedInterval>) -> bool {
    let default = NonRevokedInterval::default();
    a.unwrap_or(&default) == b.unwrap_or(&default)
}

/// Order-insensitive comparison; duplicates count.
fn restrictions_equal(a: Option<&[Restriction]>, b: Option<&[Restriction]>) -> bool {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    if a.len() != b.len() {
        return false;
    }
    let mut sorted_a: Vec<&Restriction> = a.iter().collect();
    let mut sorted_b: Vec<&Restriction> = b.iter().collect();
    sorted_a.sort();
    sorted_b.sort();
    sorted_a == sorted_b
}
