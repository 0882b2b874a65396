//! Canonical record for one account.

use crate::mapping::{
    export_fields, import_fields, join_errors, split_errors, FieldRule, StringMap,
};
use crate::records::simplify_text;

/// Declared attribute roster. Every attribute always holds *some* string
/// (the default when nothing was extracted).
static AUTHOR_FIELDS: &[FieldRule] = &[
    FieldRule::keep("author_id", "0"),
    FieldRule::keep("handle", "placeholder_handle"),
    FieldRule::keep("display_name", ""),
    FieldRule::keep("verified_status", "UNKNOWN"),
    FieldRule::keep("avatar_url", ""),
    FieldRule::keep("post_count", "0"),
    FieldRule::keep("follower_count", "0"),
    FieldRule::keep("following_count", "0"),
    FieldRule::keep("can_dm", ""),
    FieldRule::keep("can_media_tag", ""),
    FieldRule::keep("advertiser_type", ""),
    FieldRule::keep("withheld_in_countries", ""),
    FieldRule::keep("premium_subscriber", ""),
    FieldRule::keep("requires_consent", ""),
    FieldRule::keep("graduated_access", ""),
    FieldRule::keep("super_follow_eligible", ""),
];

/// Canonical normalized record for one account.
#[derive(Debug, Clone)]
pub struct Author {
    attrs: StringMap,
    errors: Vec<String>,
}

impl Author {
    /// An author with every attribute at its default.
    pub fn new() -> Self {
        Self::from_map(&StringMap::new())
    }

    /// Import from a flat source map per the declared rules. An `errors` key
    /// holding a ` ;;; `-joined string is split back into the error list.
    pub fn from_map(source: &StringMap) -> Self {
        let attrs = import_fields(AUTHOR_FIELDS, source);
        let errors = source.get("errors").map(|e| split_errors(e)).unwrap_or_default();
        Self { attrs, errors }
    }

    pub fn fields() -> impl Iterator<Item = &'static str> {
        AUTHOR_FIELDS.iter().map(|rule| rule.target)
    }

    pub fn get(&self, key: &str) -> &str {
        self.attrs.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Set a declared attribute. Undeclared keys are dropped with a
    /// diagnostic so the roster invariant holds.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        match self.attrs.get_mut(key) {
            Some(slot) => *slot = value.into(),
            None => tracing::debug!(key, "ignoring undeclared author attribute"),
        }
    }

    pub fn id(&self) -> &str {
        self.get("author_id")
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Flatten to a string map with every declared key plus `errors`.
    pub fn export(&self) -> StringMap {
        let mut map = export_fields(AUTHOR_FIELDS, &self.attrs);
        map.insert("errors".to_string(), join_errors(&self.errors));
        map
    }

    /// Terse one-line form for verbose diagnostics.
    pub fn debug_summary(&self) -> String {
        let mut parts = Vec::new();

        if self.id() == "0" {
            parts.push("NO_ID".to_string());
        } else {
            parts.push(format!("id={}", self.id()));
        }

        match self.get("handle") {
            "" => parts.push("NO_HANDLE".to_string()),
            "placeholder_handle" => parts.push("DEFAULT_HANDLE".to_string()),
            handle => parts.push(format!("handle={handle}")),
        }

        parts.push(format!(
            "name={}",
            simplify_text(self.get("display_name"), 20)
        ));
        parts.push(format!("verified={}", self.get("verified_status")));

        parts.join(", ")
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_field() {
        let author = Author::new();
        assert_eq!(author.get("author_id"), "0");
        assert_eq!(author.get("handle"), "placeholder_handle");
        assert_eq!(author.get("verified_status"), "UNKNOWN");
        assert_eq!(author.export().len(), 17); // 16 declared + errors
    }

    #[test]
    fn test_error_round_trip() {
        let mut author = Author::new();
        author.add_error("cannot find avatar");
        author.add_error("cannot find handle");

        let exported = author.export();
        assert_eq!(
            exported.get("errors").unwrap(),
            "cannot find avatar ;;; cannot find handle"
        );

        let restored = Author::from_map(&exported);
        assert_eq!(restored.errors().len(), 2);
    }

    #[test]
    fn test_undeclared_attribute_is_dropped() {
        let mut author = Author::new();
        author.set("no_such_field", "value");
        assert_eq!(author.get("no_such_field"), "");
    }
}
