//! Set-based drift between the two sources.
//!
//! [`compute_diff`] compares names only: an item present on both sides is
//! considered synchronized even when its content differs. [`compute_drift`]
//! additionally reports such content divergence.

use crate::adapters::utils::hash_content;
use mcpbridge_snapshot::McpItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Names only in A, sorted.
    pub only_in_a: Vec<String>,
    /// Names only in B, sorted.
    pub only_in_b: Vec<String>,
}

impl DiffReport {
    pub fn in_sync(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    /// Names on both sides whose documents hash differently, sorted.
    pub diverged: Vec<String>,
}

impl DriftReport {
    pub fn in_sync(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.diverged.is_empty()
    }
}

fn name_set(items: &[McpItem]) -> BTreeSet<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

pub fn compute_diff(a: &[McpItem], b: &[McpItem]) -> DiffReport {
    let names_a = name_set(a);
    let names_b = name_set(b);
    DiffReport {
        only_in_a: names_a.difference(&names_b).map(|s| s.to_string()).collect(),
        only_in_b: names_b.difference(&names_a).map(|s| s.to_string()).collect(),
    }
}

/// Name diff plus a content comparison of the shared names.
///
/// Documents are compared as stored. Items of the two ecosystems that were
/// synced with format conversion will show up as diverged.
pub fn compute_drift(a: &[McpItem], b: &[McpItem]) -> DriftReport {
    let DiffReport {
        only_in_a,
        only_in_b,
    } = compute_diff(a, b);
    let hashes_b: BTreeMap<&str, String> = b
        .iter()
        .map(|item| (item.name.as_str(), content_hash(&item.config)))
        .collect();
    let mut diverged: Vec<String> = a
        .iter()
        .filter(|item| {
            hashes_b
                .get(item.name.as_str())
                .is_some_and(|hash| *hash != content_hash(&item.config))
        })
        .map(|item| item.name.clone())
        .collect();
    diverged.sort();
    diverged.dedup();
    DriftReport {
        only_in_a,
        only_in_b,
        diverged,
    }
}

/// SHA-256 of the canonical (key-sorted) JSON encoding.
pub fn content_hash(config: &Value) -> String {
    // serde_json's map is ordered, so serialization is already canonical.
    let bytes = serde_json::to_vec(config).unwrap_or_default();
    hash_content(&bytes)
}
