//! Scope inclusion over whitespace-delimited permission sets.

use std::collections::HashSet;

/// Returns true when every permission named in `required` is present in
/// `allowed`.
///
/// Both arguments are treated as whitespace-delimited sets; ordering and
/// duplicates are irrelevant, and matching is by whole token, never by
/// substring. An empty `required` imposes no restriction. When
/// `super_scope` is set to a non-empty token that appears anywhere in
/// `allowed`, the check passes unconditionally.
pub fn scope_included(required: &str, allowed: &str, super_scope: Option<&str>) -> bool {
    if let Some(sup) = super_scope {
        if !sup.is_empty() && allowed.split_whitespace().any(|tok| tok == sup) {
            return true;
        }
    }
    let mut required_toks = required.split_whitespace().peekable();
    if required_toks.peek().is_none() {
        return true;
    }
    let allowed: HashSet<&str> = allowed.split_whitespace().collect();
    required_toks.all(|tok| allowed.contains(tok))
}
