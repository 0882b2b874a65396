//! Canonical record for one social-media item.

use crate::mapping::{
    export_fields, import_fields, join_errors, split_errors, FieldRule, StringMap,
};
use crate::records::{is_empty_or_zero, simplify_text, Author};

/// Prefix under which the embedded author's export lands in a post export.
pub const AUTHOR_KEY_PREFIX: &str = "author__";

/// Declared attribute roster. Every attribute always holds *some* string
/// (the default when nothing was extracted), so a post is never partially
/// populated.
static POST_FIELDS: &[FieldRule] = &[
    FieldRule::keep("post_id", "0"),
    FieldRule::keep("author_id", "0"),
    FieldRule::keep("conversation_id", "0"),
    FieldRule::keep("repost_id", "0"),
    FieldRule::keep("quoted_post_id", ""),
    FieldRule::keep("quoted_post_href", ""),
    FieldRule::keep("text", ""),
    FieldRule::keep("html", ""),
    FieldRule::keep("language", ""),
    FieldRule::keep("mentions", ""),
    FieldRule::keep("suggestion_json", ""),
    FieldRule::keep("has_cards", ""),
    FieldRule::keep("created_at", ""),
    FieldRule::keep("timestamp", "0"),
    FieldRule::keep("reply_count", "0"),
    FieldRule::keep("repost_count", "0"),
    FieldRule::keep("favorite_count", "0"),
    FieldRule::keep("quote_count", "0"),
    FieldRule::keep("view_count", "0"),
    FieldRule::keep("photo_link", ""),
    FieldRule::keep("photo_image", ""),
    FieldRule::keep("video_thumb", ""),
    FieldRule::keep("avatar_url", ""),
    FieldRule::keep("permalink", ""),
    FieldRule::keep("reply_to_post_id", ""),
    FieldRule::keep("reply_to_handle", ""),
    FieldRule::keep("reply_to_author_id", "0"),
    FieldRule::keep("reply_users_json", ""),
    FieldRule::keep("author_handle", ""),
    FieldRule::keep("author_display_name", ""),
    FieldRule::keep("author_username", ""),
    FieldRule::keep("verified_text", ""),
    FieldRule::keep("follows_you", ""),
    FieldRule::keep("you_follow", ""),
    FieldRule::keep("you_block", ""),
    FieldRule::keep("is_pinned", ""),
    FieldRule::keep("is_top_post", ""),
    FieldRule::keep("has_parent_post", ""),
    FieldRule::keep("component_context", ""),
    FieldRule::keep("disclosure_type", ""),
    FieldRule::keep("item_id", ""),
    FieldRule::keep("stats_initialized", ""),
    FieldRule::keep("quality", "unknown_quality"),
    FieldRule::keep("pass_number", "0"),
    FieldRule::keep("pass_index", "0"),
    FieldRule::keep("previous_post_id", "0"),
    FieldRule::keep("next_post_id", "0"),
];

/// Canonical normalized record for one social-media item, with its embedded
/// author. Owned by the collection once added; merges mutate it in place.
#[derive(Debug, Clone)]
pub struct Post {
    attrs: StringMap,
    errors: Vec<String>,
    author: Author,
}

impl Post {
    /// A post with every attribute at its default and a default author.
    pub fn new() -> Self {
        Self::from_map(&StringMap::new())
    }

    /// Import from a flat source map per the declared rules. `author__`-
    /// prefixed keys populate the embedded author; an `errors` key holding a
    /// ` ;;; `-joined string is split back into the error list.
    pub fn from_map(source: &StringMap) -> Self {
        let attrs = import_fields(POST_FIELDS, source);
        let errors = source.get("errors").map(|e| split_errors(e)).unwrap_or_default();

        let author_source: StringMap = source
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(AUTHOR_KEY_PREFIX)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect();
        let author = Author::from_map(&author_source);

        Self {
            attrs,
            errors,
            author,
        }
    }

    pub fn fields() -> impl Iterator<Item = &'static str> {
        POST_FIELDS.iter().map(|rule| rule.target)
    }

    pub fn get(&self, key: &str) -> &str {
        self.attrs.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Set a declared attribute. Undeclared keys are dropped with a
    /// diagnostic so the roster invariant holds.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        match self.attrs.get_mut(key) {
            Some(slot) => *slot = value.into(),
            None => tracing::debug!(key, "ignoring undeclared post attribute"),
        }
    }

    pub fn id(&self) -> &str {
        self.get("post_id")
    }

    pub fn has_id(&self) -> bool {
        !is_empty_or_zero(self.id())
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn author_mut(&mut self) -> &mut Author {
        &mut self.author
    }

    pub fn set_author(&mut self, author: Author) {
        self.author = author;
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Fill-gap merge: for every declared field, take the incoming value
    /// only if this record's value is still empty-or-zero and the incoming
    /// one is not. Populated fields are never overwritten, so the merge is
    /// commutative in effect: arrival order does not change which values
    /// end up filled.
    pub fn merge_from(&mut self, other: &Post) {
        for rule in POST_FIELDS {
            let mine = self.get(rule.target);
            let theirs = other.get(rule.target);
            if is_empty_or_zero(mine) && !is_empty_or_zero(theirs) {
                let value = theirs.to_string();
                self.set(rule.target, value);
            }
        }

        if self.errors.is_empty() && !other.errors.is_empty() {
            self.errors = other.errors.clone();
        }
    }

    /// Flatten to a string map with every declared key, the joined `errors`
    /// string, and the embedded author under `author__` keys.
    pub fn export(&self) -> StringMap {
        let mut map = export_fields(POST_FIELDS, &self.attrs);
        map.insert("errors".to_string(), join_errors(&self.errors));

        for (key, value) in self.author.export() {
            map.insert(format!("{AUTHOR_KEY_PREFIX}{key}"), value);
        }

        map
    }

    /// Terse one-line form for verbose diagnostics.
    pub fn debug_summary(&self) -> String {
        let mut parts = Vec::new();

        if self.has_id() {
            parts.push(format!("id={}", self.id()));
        } else {
            parts.push("NO_ID".to_string());
        }

        parts.push(format!("text={}", simplify_text(self.get("text"), 20)));
        parts.push(format!("quality={}", self.get("quality")));
        parts.push(format!(
            "replies={} reposts={} favorites={} views={}",
            self.get("reply_count"),
            self.get("repost_count"),
            self.get("favorite_count"),
            self.get("view_count"),
        ));

        if self.get("permalink").is_empty() {
            parts.push("NO_PERMALINK".to_string());
        }

        parts.push(format!("author=[{}]", self.author.debug_summary()));

        parts.join(", ")
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}
