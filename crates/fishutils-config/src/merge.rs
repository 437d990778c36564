//! Deep merge of TOML values with per-field source tracking.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from a file never overrides the layer below.

use std::collections::HashMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// A configuration file.
    File(String),
    /// Environment variable fallback.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::File(path) => write!(f, "file ({path})"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Tracks which layer set each field's value, keyed by dotted path.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording `layer` for every leaf the
/// overlay sets.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Walk a value tree and record every leaf path with `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_leaves_only() {
        let mut base = parse(
            r#"
            [bus]
            cancellable = false
            error_policy = "abort"
        "#,
        );
        let overlay = parse("[bus]\ncancellable = true");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", &ConfigLayer::Defaults, &mut sources);

        let layer = ConfigLayer::File("bus.toml".to_owned());
        deep_merge_tracking(&mut base, &overlay, "", &layer, &mut sources);

        assert_eq!(base["bus"]["cancellable"].as_bool(), Some(true));
        assert_eq!(base["bus"]["error_policy"].as_str(), Some("abort"));
        assert_eq!(sources.get("bus.cancellable"), Some(&layer));
        assert_eq!(
            sources.get("bus.error_policy"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_new_tables_are_recorded() {
        let mut base = parse("[bus]\ncancellable = false");
        let overlay = parse("[logging]\nlevel = \"debug\"\nformat = \"json\"");
        let mut sources = FieldSources::new();

        deep_merge_tracking(
            &mut base,
            &overlay,
            "",
            &ConfigLayer::Environment,
            &mut sources,
        );

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(
            sources.get("logging.format"),
            Some(&ConfigLayer::Environment)
        );
        assert!(!sources.contains_key("bus.cancellable"));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = parse("directives = [\"a\", \"b\"]");
        let overlay = parse("directives = [\"c\"]");
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::Defaults, &mut sources);

        let directives = base["directives"].as_array().unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].as_str(), Some("c"));
    }
}
