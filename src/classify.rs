// src/classify.rs
// =============================================================================
// This module implements the three-way partition used everywhere a set of
// resources is compared across versions: pages and images both go through
// the same generic operation.
//
// The invariant: added, deleted, and common are pairwise disjoint and their
// union is exactly old ∪ new. Pure set algebra - deterministic, order
// independent, no mutation of the inputs.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeSet;

/// The result of classifying one resource category across two versions.
#[derive(Debug, Clone, Serialize)]
pub struct Partition<T: Ord> {
    /// Present only in the new tree
    pub added: BTreeSet<T>,
    /// Present only in the old tree
    pub deleted: BTreeSet<T>,
    /// Present in both trees
    pub common: BTreeSet<T>,
}

/// Partitions `old ∪ new` into added / deleted / common.
pub fn classify<T: Ord + Clone>(old: &BTreeSet<T>, new: &BTreeSet<T>) -> Partition<T> {
    Partition {
        added: new.difference(old).cloned().collect(),
        deleted: old.difference(new).cloned().collect(),
        common: old.intersection(new).cloned().collect(),
    }
}
