//! Descriptor-driven field mapping between raw sources and canonical records.
//!
//! A record's attribute roster is declared as a list of [`FieldRule`]s. Most
//! rules are plain data (copy this source key, else use this default); a rule
//! only carries code when a transform is genuinely required (epoch
//! conversion, media-URL preference, list joining). Import and export both
//! guarantee that every declared target key is present afterwards; a record
//! is never partially populated.

use indexmap::IndexMap;
use serde_json::Value;

/// Flat string-to-string map, insertion ordered.
pub type StringMap = IndexMap<String, String>;

/// Anything a field rule can read a scalar out of.
pub trait FieldSource {
    /// The value at `key` rendered as a string, if present and scalar.
    fn field(&self, key: &str) -> Option<String>;
}

impl FieldSource for StringMap {
    fn field(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl FieldSource for Value {
    fn field(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// How one target field obtains its value.
pub enum Binding<S: ?Sized> {
    /// Copy the value under this source key when present.
    Copy(&'static str),
    /// Custom importer with full access to the source.
    Import(fn(&S) -> Option<String>),
}

/// One field of a record: target key, default, and its binding.
pub struct FieldRule<S: ?Sized = StringMap> {
    pub target: &'static str,
    pub default: &'static str,
    pub binding: Binding<S>,
}

impl<S: ?Sized> FieldRule<S> {
    pub const fn copy(target: &'static str, source: &'static str, default: &'static str) -> Self {
        Self {
            target,
            default,
            binding: Binding::Copy(source),
        }
    }

    /// Shorthand for the common same-key copy.
    pub const fn keep(target: &'static str, default: &'static str) -> Self {
        Self {
            target,
            default,
            binding: Binding::Copy(target),
        }
    }

    pub const fn import(
        target: &'static str,
        default: &'static str,
        import: fn(&S) -> Option<String>,
    ) -> Self {
        Self {
            target,
            default,
            binding: Binding::Import(import),
        }
    }
}

/// Populate a target map from `source` per the rules. Every declared target
/// key ends up present: rule value if the source has one, default otherwise.
pub fn import_fields<S: FieldSource + ?Sized>(rules: &[FieldRule<S>], source: &S) -> StringMap {
    let mut target = StringMap::with_capacity(rules.len());
    for rule in rules {
        let value = match &rule.binding {
            Binding::Copy(source_key) => source.field(source_key),
            Binding::Import(import) => import(source),
        };
        target.insert(
            rule.target.to_string(),
            value.unwrap_or_else(|| rule.default.to_string()),
        );
    }
    target
}

/// Mirror of [`import_fields`]: read a record's attributes back into a flat
/// map under the declared keys, defaulting anything missing.
pub fn export_fields<S: ?Sized>(rules: &[FieldRule<S>], attrs: &StringMap) -> StringMap {
    let mut target = StringMap::with_capacity(rules.len());
    for rule in rules {
        let value = attrs
            .get(rule.target)
            .cloned()
            .unwrap_or_else(|| rule.default.to_string());
        target.insert(rule.target.to_string(), value);
    }
    target
}

/// Delimiter for error lists flattened into a single exported string.
pub const ERROR_DELIMITER: &str = " ;;; ";

/// Split a flattened error string back into a list.
pub fn split_errors(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(ERROR_DELIMITER).map(str::to_string).collect()
}

/// Join an error list for export.
pub fn join_errors(errors: &[String]) -> String {
    errors.join(ERROR_DELIMITER)
}
