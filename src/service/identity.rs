//! Service identity resolution
//!
//! Maps a container's raw metadata to the name, tags and metadata it is
//! registered under. Pure: no I/O, no retries.
//!
//! Precedence for the name:
//! 1. `SERVICE_NAME` from the container environment
//! 2. the container name, minus the leading `/` and the application prefix
//!
//! The result is always lower-cased. `SERVICE_IGNORE=true` skips the container.

use crate::registry::{META_CONTAINER_ID, META_IMAGE};
use crate::runtime::ContainerSnapshot;
use std::collections::{BTreeMap, HashMap};

/// Environment variable overriding the derived service name
pub const SERVICE_NAME_VAR: &str = "SERVICE_NAME";

/// Environment variable that, when `true`, excludes the container
pub const SERVICE_IGNORE_VAR: &str = "SERVICE_IGNORE";

/// Default application prefix stripped from container names
pub const DEFAULT_NAME_PREFIX: &str = "sentiric-";

/// Tags attached to every registration, in addition to the protocol
pub const BASE_TAGS: &[&str] = &["sentiric", "auto-registered"];

/// Canonical identity of a container in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Lower-cased service name; empty only when `ignored`
    pub name: String,
    pub ignored: bool,
    pub tags: Vec<String>,
    pub meta: BTreeMap<String, String>,
}

impl ServiceDescriptor {
    fn ignored() -> Self {
        Self {
            name: String::new(),
            ignored: true,
            tags: Vec::new(),
            meta: BTreeMap::new(),
        }
    }
}

/// Parses `KEY=VALUE` entries, skipping entries without a separator
///
/// Only the first `=` separates key from value; values are stripped of
/// surrounding quotes and whitespace.
pub fn parse_env(entries: &[String]) -> HashMap<String, String> {
    entries
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(key, value)| (key.to_string(), clean_value(value)))
        .collect()
}

fn clean_value(value: &str) -> String {
    value
        .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
        .to_string()
}

/// Derives the service descriptor for a container
///
/// A descriptor comes back with `ignored` set when the container opted out or
/// when no usable name can be derived.
pub fn resolve_identity(snapshot: &ContainerSnapshot, name_prefix: &str) -> ServiceDescriptor {
    let env = parse_env(&snapshot.env);

    if env.get(SERVICE_IGNORE_VAR).map(String::as_str) == Some("true") {
        return ServiceDescriptor::ignored();
    }

    let name = match env.get(SERVICE_NAME_VAR).filter(|n| !n.is_empty()) {
        Some(explicit) => explicit.clone(),
        None => {
            let bare = snapshot.name.strip_prefix('/').unwrap_or(&snapshot.name);
            let bare = if name_prefix.is_empty() {
                bare
            } else {
                bare.strip_prefix(name_prefix).unwrap_or(bare)
            };
            bare.to_string()
        }
    };

    let name = name.to_lowercase();
    if name.is_empty() {
        return ServiceDescriptor::ignored();
    }

    let mut meta = BTreeMap::new();
    meta.insert(
        META_CONTAINER_ID.to_string(),
        snapshot.short_id().to_string(),
    );
    meta.insert(META_IMAGE.to_string(), snapshot.image.clone());

    ServiceDescriptor {
        name,
        ignored: false,
        tags: BASE_TAGS.iter().map(|t| t.to_string()).collect(),
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn snapshot(name: &str, env: &[&str]) -> ContainerSnapshot {
        ContainerSnapshot {
            id: "0123456789abcdef".to_string(),
            name: name.to_string(),
            env: env.iter().map(|e| e.to_string()).collect(),
            image: "sentiric/auth:1.0".to_string(),
            ..Default::default()
        }
    }

    #[parameterized(
        prefix_stripped = { "/sentiric-auth", &[], "auth" },
        no_prefix = { "/gateway", &[], "gateway" },
        no_slash = { "sentiric-media", &[], "media" },
        upper_case_name = { "/sentiric-Billing", &[], "billing" },
        prefix_only_stripped_at_start = { "/my-sentiric-app", &[], "my-sentiric-app" },
        override_wins = { "/sentiric-auth", &["SERVICE_NAME=AuthSvc"], "authsvc" },
        override_quoted = { "/x", &["SERVICE_NAME=\"Quoted\""], "quoted" },
        override_single_quoted = { "/x", &["SERVICE_NAME=' spaced '"], "spaced" },
        empty_override_falls_back = { "/sentiric-auth", &["SERVICE_NAME="], "auth" },
        malformed_entries_skipped = { "/sentiric-auth", &["GARBAGE", "=", "PATH=/bin"], "auth" },
    )]
    fn test_service_name(name: &str, env: &[&str], expected: &str) {
        let descriptor = resolve_identity(&snapshot(name, env), DEFAULT_NAME_PREFIX);
        assert!(!descriptor.ignored);
        assert_eq!(descriptor.name, expected);
    }

    #[parameterized(
        ignore_true = { &["SERVICE_IGNORE=true"] },
        ignore_quoted = { &["SERVICE_IGNORE=\"true\""] },
        ignore_with_override = { &["SERVICE_NAME=auth", "SERVICE_IGNORE=true"] },
    )]
    fn test_ignored(env: &[&str]) {
        let descriptor = resolve_identity(&snapshot("/sentiric-auth", env), DEFAULT_NAME_PREFIX);
        assert!(descriptor.ignored);
    }

    #[parameterized(
        ignore_false = { &["SERVICE_IGNORE=false"] },
        ignore_upper = { &["SERVICE_IGNORE=TRUE"] },
        ignore_one = { &["SERVICE_IGNORE=1"] },
    )]
    fn test_not_ignored(env: &[&str]) {
        let descriptor = resolve_identity(&snapshot("/sentiric-auth", env), DEFAULT_NAME_PREFIX);
        assert!(!descriptor.ignored);
    }

    #[test]
    fn test_empty_name_is_ignored() {
        let descriptor = resolve_identity(&snapshot("/sentiric-", &[]), DEFAULT_NAME_PREFIX);
        assert!(descriptor.ignored);
        assert!(descriptor.name.is_empty());
    }

    #[test]
    fn test_custom_prefix() {
        let descriptor = resolve_identity(&snapshot("/acme-api", &[]), "acme-");
        assert_eq!(descriptor.name, "api");

        let descriptor = resolve_identity(&snapshot("/sentiric-api", &[]), "");
        assert_eq!(descriptor.name, "sentiric-api");
    }

    #[test]
    fn test_meta_and_tags() {
        let descriptor = resolve_identity(&snapshot("/sentiric-auth", &[]), DEFAULT_NAME_PREFIX);
        assert_eq!(descriptor.meta[META_CONTAINER_ID], "0123456789ab");
        assert_eq!(descriptor.meta[META_IMAGE], "sentiric/auth:1.0");
        assert_eq!(descriptor.tags, vec!["sentiric", "auto-registered"]);
    }

    #[test]
    fn test_parse_env_splits_on_first_separator() {
        let env = parse_env(&["URL=postgres://u:p@h/db?x=1".to_string()]);
        assert_eq!(env["URL"], "postgres://u:p@h/db?x=1");
    }

    #[test]
    fn test_parse_env_skips_entries_without_separator() {
        let env = parse_env(&["NOVALUE".to_string(), "A=1".to_string()]);
        assert_eq!(env.len(), 1);
        assert_eq!(env["A"], "1");
    }
}
