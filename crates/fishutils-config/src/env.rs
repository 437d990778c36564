//! Environment variable fallback.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Prefix of every variable this crate reads.
pub const ENV_PREFIX: &str = "FISHUTILS_";

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

/// Shape of the value a mapped field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Flag,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "FISHUTILS_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "FISHUTILS_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "FISHUTILS_PROCESS_DUPLICATES",
        field_path: "bus.process_duplicates",
        kind: FieldKind::Flag,
    },
    EnvMapping {
        var_name: "FISHUTILS_ERROR_POLICY",
        field_path: "bus.error_policy",
        kind: FieldKind::Text,
    },
];

/// Snapshot the `FISHUTILS_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply environment variable fallbacks to fields that were **not** set by
/// a config file.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if matches!(sources.get(mapping.field_path), Some(ConfigLayer::File(_))) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field(merged, mapping.field_path, coerce(mapping.kind, val));
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Flag fields recognize boolean spellings. Everything else stays a string
/// and is checked when the merged tree is deserialized.
fn coerce(kind: FieldKind, val: &str) -> toml::Value {
    if kind == FieldKind::Text {
        return toml::Value::String(val.to_owned());
    }
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => toml::Value::Boolean(true),
        "false" | "0" | "no" => toml::Value::Boolean(false),
        _ => toml::Value::String(val.to_owned()),
    }
}

/// Set a `section.field` path, creating the section table if needed.
fn set_field(root: &mut toml::Value, path: &str, val: toml::Value) {
    let Some((section, field)) = path.split_once('.') else {
        return;
    };
    let Some(root) = root.as_table_mut() else {
        return;
    };
    let section = root
        .entry(section.to_owned())
        .or_insert(toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section.as_table_mut() {
        table.insert(field.to_owned(), val);
    }
}
