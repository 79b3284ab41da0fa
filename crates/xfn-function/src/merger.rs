//! Desired-state merging.
//!
//! Newly synthesized resources override prior entries with the same
//! `(kind, name)` in place; every other prior entry passes through unchanged
//! and keeps its position. New resources are appended in the order they were
//! synthesized. Nothing is ever removed.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;
use xfn_core::{DesiredResource, FunctionError, ResourceKey, Result};

use crate::decoder::PriorEntry;

/// One entry of the merged desired state.
#[derive(Debug, Clone, PartialEq)]
pub enum DesiredEntry {
    /// Carried over from the request untouched.
    Prior(PriorEntry),
    Synthesized(DesiredResource),
}

impl DesiredEntry {
    pub fn is_prior(&self) -> bool {
        matches!(self, Self::Prior(_))
    }
}

pub fn merge(
    prior: IndexMap<ResourceKey, PriorEntry>,
    synthesized: impl IntoIterator<Item = DesiredResource>,
) -> Result<IndexMap<ResourceKey, DesiredEntry>> {
    let mut merged: IndexMap<ResourceKey, DesiredEntry> = prior
        .into_iter()
        .map(|(key, entry)| (key, DesiredEntry::Prior(entry)))
        .collect();

    for resource in synthesized {
        let key = resource.key();
        match merged.get_mut(&key) {
            Some(existing) => {
                debug!(resource = %key, "Superseding prior desired resource");
                *existing = DesiredEntry::Synthesized(resource);
            }
            None => {
                debug!(resource = %key, "Adding desired resource");
                merged.insert(key, DesiredEntry::Synthesized(resource));
            }
        }
    }

    ensure_unique_names(&merged)?;
    Ok(merged)
}

/// Names must be unique across the whole desired set, whatever the kind.
fn ensure_unique_names(desired: &IndexMap<ResourceKey, DesiredEntry>) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(desired.len());
    for key in desired.keys() {
        if let Some(first_kind) = seen.insert(&key.name, &key.kind) {
            return Err(FunctionError::name_collision(&key.name, first_kind, &key.kind));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn resource(kind: &str, name: &str, spec: Value) -> DesiredResource {
        DesiredResource::new("example.org/v1", kind, name).with_spec(spec)
    }

    fn prior(entries: Vec<(&str, &str, &str)>) -> IndexMap<ResourceKey, PriorEntry> {
        entries
            .into_iter()
            .map(|(wire, kind, name)| {
                let value = json!({"apiVersion": "example.org/v1", "kind": kind, "name": name});
                (
                    ResourceKey::new(kind, name),
                    PriorEntry {
                        key: wire.to_string(),
                        value,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_disjoint_merge_is_union() {
        let prior = prior(vec![("logs", "Bucket", "logs"), ("Role/admin", "Role", "admin")]);
        let new = resource("VPC", "xr-vpc", json!({"b": 2}));

        let merged = merge(prior.clone(), vec![new.clone()]).unwrap();

        assert_eq!(merged.len(), 3);
        for (key, entry) in &prior {
            assert_eq!(merged[key], DesiredEntry::Prior(entry.clone()));
        }
        assert_eq!(merged[&new.key()], DesiredEntry::Synthesized(new));
        let order: Vec<String> = merged.keys().map(ToString::to_string).collect();
        assert_eq!(order, vec!["Bucket/logs", "Role/admin", "VPC/xr-vpc"]);
    }

    #[test]
    fn test_synthesized_overrides_prior_in_place() {
        let prior = prior(vec![("vpc", "VPC", "xr-vpc"), ("logs", "Bucket", "logs")]);
        let replacement = resource("VPC", "xr-vpc", json!({"cidrBlock": "10.0.0.0/16"}));

        let merged = merge(prior, vec![replacement.clone()]).unwrap();

        assert_eq!(merged.len(), 2);
        let (first_key, first) = merged.get_index(0).unwrap();
        assert_eq!(first_key, &replacement.key());
        assert_eq!(first, &DesiredEntry::Synthesized(replacement));
        assert!(merged.get_index(1).unwrap().1.is_prior());
    }

    #[test]
    fn test_empty_synthesis_keeps_prior() {
        let prior = prior(vec![("logs", "Bucket", "logs")]);
        let merged = merge(prior.clone(), Vec::new()).unwrap();

        assert_eq!(merged.len(), 1);
        assert!(merged.values().all(DesiredEntry::is_prior));
    }

    #[test]
    fn test_name_collision_across_kinds() {
        let prior = prior(vec![("shared", "Subnet", "shared")]);
        let err = merge(prior, vec![resource("VPC", "shared", json!({}))]).unwrap_err();
        match err {
            FunctionError::NameCollision {
                name,
                first_kind,
                second_kind,
            } => {
                assert_eq!(name, "shared");
                assert_eq!(first_kind, "Subnet");
                assert_eq!(second_kind, "VPC");
            }
            other => panic!("expected name collision, got {other:?}"),
        }
    }
}
