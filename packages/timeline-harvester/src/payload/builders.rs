//! Descriptor-driven record builders for raw payload objects.
//!
//! A raw object may carry its fields at the top level, under a nested
//! `legacy` sub-object, or both, with the id under different keys depending
//! on API version. Both builders import through the same descriptor list
//! against both scopes, merge favoring values already present from the
//! top-level pass, and fall back to the numeric-only id fields last.

use chrono::DateTime;
use serde_json::Value;

use crate::extract::resolver::{resolve, Resolution, Strategy};
use crate::mapping::{import_fields, FieldRule, StringMap};
use crate::payload::is_all_digits;
use crate::records::{is_empty_or_zero, Author, Post};

/// Source timestamp format, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

fn media_entry<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    match value.pointer(path)? {
        Value::Array(items) => items.first(),
        object @ Value::Object(_) => Some(object),
        _ => None,
    }
}

fn import_mentions(value: &Value) -> Option<String> {
    let mentions = value.pointer("/entities/user_mentions")?.as_array()?;
    let names: Vec<&str> = mentions
        .iter()
        .filter_map(|mention| mention.get("screen_name").and_then(Value::as_str))
        .collect();
    Some(names.join(","))
}

fn import_photo_link(value: &Value) -> Option<String> {
    media_entry(value, "/entities/media")?
        .get("expanded_url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn import_photo_image(value: &Value) -> Option<String> {
    let media = media_entry(value, "/entities/media")?;
    media
        .get("media_url_https")
        .or_else(|| media.get("media_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn import_video_thumb(value: &Value) -> Option<String> {
    let media = media_entry(value, "/extended_entities/media")?;
    media.get("video_info")?;
    media
        .get("media_url_https")
        .or_else(|| media.get("media_url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn import_timestamp(value: &Value) -> Option<String> {
    let created_at = value.get("created_at").and_then(Value::as_str)?;
    Some(
        DateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
            .map(|parsed| parsed.timestamp().to_string())
            .unwrap_or_else(|_| "0".to_string()),
    )
}

fn import_has_cards(value: &Value) -> Option<String> {
    Some(if value.get("card").is_some() { "1" } else { "0" }.to_string())
}

static POST_RULES: &[FieldRule<Value>] = &[
    FieldRule::copy("post_id", "id_str", "0"),
    FieldRule::copy("author_id", "user_id_str", "0"),
    FieldRule::copy("conversation_id", "conversation_id_str", ""),
    FieldRule::copy("created_at", "created_at", ""),
    FieldRule::copy("text", "full_text", ""),
    FieldRule::copy("language", "lang", "en"),
    FieldRule::copy("reply_to_post_id", "in_reply_to_status_id_str", ""),
    FieldRule::copy("reply_to_handle", "in_reply_to_screen_name", ""),
    FieldRule::copy("reply_to_author_id", "in_reply_to_user_id_str", ""),
    FieldRule::copy("reply_count", "reply_count", "0"),
    FieldRule::copy("repost_count", "retweet_count", "0"),
    FieldRule::copy("favorite_count", "favorite_count", "0"),
    FieldRule::copy("quote_count", "quote_count", "0"),
    FieldRule::copy("view_count", "view_count", "0"),
    FieldRule::import("mentions", "", import_mentions),
    FieldRule::import("photo_link", "", import_photo_link),
    FieldRule::import("photo_image", "", import_photo_image),
    FieldRule::import("video_thumb", "", import_video_thumb),
    FieldRule::import("timestamp", "0", import_timestamp),
    FieldRule::import("has_cards", "0", import_has_cards),
];

fn import_premium(value: &Value) -> Option<String> {
    value
        .get("is_blue_verified")
        .or_else(|| value.get("ext_is_blue_verified"))
        .and_then(Value::as_bool)
        .map(|flag| flag.to_string())
}

fn import_withheld(value: &Value) -> Option<String> {
    let countries = value.get("withheld_in_countries")?.as_array()?;
    let codes: Vec<&str> = countries.iter().filter_map(Value::as_str).collect();
    Some(codes.join(" ;;; "))
}

static AUTHOR_RULES: &[FieldRule<Value>] = &[
    FieldRule::copy("author_id", "id_str", ""),
    FieldRule::copy("handle", "screen_name", ""),
    FieldRule::copy("display_name", "name", ""),
    FieldRule::copy("avatar_url", "profile_image_url_https", ""),
    FieldRule::copy("verified_status", "verified", ""),
    FieldRule::copy("post_count", "statuses_count", ""),
    FieldRule::copy("follower_count", "followers_count", ""),
    FieldRule::copy("following_count", "friends_count", ""),
    FieldRule::copy("can_dm", "can_dm", ""),
    FieldRule::copy("can_media_tag", "can_media_tag", ""),
    FieldRule::copy("advertiser_type", "advertiser_account_type", ""),
    FieldRule::copy("requires_consent", "require_some_consent", ""),
    FieldRule::copy("graduated_access", "has_graduated_access", ""),
    FieldRule::copy("super_follow_eligible", "super_follow_eligible", ""),
    FieldRule::import("premium_subscriber", "", import_premium),
    FieldRule::import("withheld_in_countries", "", import_withheld),
];

/// Fill gaps in the top-level import from the legacy-scope import. A gap is
/// an empty-or-zero value; populated top-level values always win.
fn fill_from_legacy(primary: &mut StringMap, legacy: &StringMap) {
    for (key, value) in primary.iter_mut() {
        if !is_empty_or_zero(value) {
            continue;
        }
        if let Some(fallback) = legacy.get(key) {
            if !is_empty_or_zero(fallback) {
                *value = fallback.clone();
            }
        }
    }
}

fn numeric_primary_id(value: &Value) -> Option<String> {
    let id = value.get("id").and_then(Value::as_str)?;
    is_all_digits(id).then(|| id.to_string())
}

fn numeric_secondary_id(value: &Value) -> Option<String> {
    let id = value.get("rest_id").and_then(Value::as_str)?;
    is_all_digits(id).then(|| id.to_string())
}

/// Last-resort id recovery when the declared descriptor found nothing.
fn id_fallback(id_key: &str, merged: &mut StringMap, value: &Value) {
    if !is_empty_or_zero(merged.get(id_key).map(String::as_str).unwrap_or("")) {
        return;
    }

    let chain: &[Strategy<Value, String>] = &[
        ("numeric_primary", numeric_primary_id),
        ("numeric_secondary", numeric_secondary_id),
    ];
    if let Resolution::Resolved { value: id, .. } = resolve(id_key, chain, value) {
        merged.insert(id_key.to_string(), id);
    }
}

fn import_both_scopes(rules: &[FieldRule<Value>], value: &Value) -> StringMap {
    let mut merged = import_fields(rules, value);
    if let Some(legacy) = value.get("legacy") {
        let fallback = import_fields(rules, legacy);
        fill_from_legacy(&mut merged, &fallback);
    }
    merged
}

/// Build a canonical post from one raw tweet object.
pub fn post_from_value(value: &Value) -> Post {
    let mut merged = import_both_scopes(POST_RULES, value);
    id_fallback("post_id", &mut merged, value);

    // one level of the quoted/nested union is unwrapped
    if let Some(quoted_id) = value
        .pointer("/quoted_status_result/result/rest_id")
        .and_then(Value::as_str)
    {
        merged.insert("quoted_post_id".to_string(), quoted_id.to_string());
    }
    if let Some(quoted_href) = value
        .pointer("/legacy/quoted_status_permalink/expanded")
        .and_then(Value::as_str)
    {
        merged.insert("quoted_post_href".to_string(), quoted_href.to_string());
    }

    Post::from_map(&merged)
}

/// Build a canonical author from one raw user object.
pub fn author_from_value(value: &Value) -> Author {
    let mut merged = import_both_scopes(AUTHOR_RULES, value);
    id_fallback("author_id", &mut merged, value);

    let verified = merged
        .get("verified_status")
        .map(String::as_str)
        .unwrap_or("");
    let status = if verified == "true" { "VERIFIED" } else { "UNKNOWN" };
    merged.insert("verified_status".to_string(), status.to_string());

    Author::from_map(&merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_scope_fills_gaps() {
        let raw = json!({
            "rest_id": "100",
            "legacy": {
                "id_str": "100",
                "full_text": "hello from legacy",
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "favorite_count": 5,
                "reply_count": 2,
                "lang": "de"
            }
        });

        let post = post_from_value(&raw);
        assert_eq!(post.id(), "100");
        assert_eq!(post.get("text"), "hello from legacy");
        assert_eq!(post.get("favorite_count"), "5");
        assert_eq!(post.get("reply_count"), "2");
        assert_eq!(post.get("language"), "de");
        assert_eq!(post.get("timestamp"), "1539202764");
    }

    #[test]
    fn test_top_level_wins_over_legacy() {
        let raw = json!({
            "id_str": "1",
            "full_text": "top",
            "legacy": { "id_str": "2", "full_text": "legacy" }
        });

        let post = post_from_value(&raw);
        assert_eq!(post.id(), "1");
        assert_eq!(post.get("text"), "top");
    }

    #[test]
    fn test_id_fallback_prefers_numeric_primary() {
        let opaque = json!({ "id": "VGhpbmc6MQ==", "rest_id": "42" });
        assert_eq!(post_from_value(&opaque).id(), "42");

        let numeric = json!({ "id": "7", "rest_id": "42" });
        assert_eq!(post_from_value(&numeric).id(), "7");
    }

    #[test]
    fn test_media_and_mention_transforms() {
        let raw = json!({
            "id_str": "9",
            "entities": {
                "user_mentions": [
                    { "screen_name": "alice" },
                    { "screen_name": "bob" }
                ],
                "media": [{
                    "expanded_url": "https://social.example/jdoe/status/9/photo/1",
                    "media_url_https": "https://images.example/nine.jpg"
                }]
            },
            "card": {}
        });

        let post = post_from_value(&raw);
        assert_eq!(post.get("mentions"), "alice,bob");
        assert_eq!(
            post.get("photo_link"),
            "https://social.example/jdoe/status/9/photo/1"
        );
        assert_eq!(post.get("photo_image"), "https://images.example/nine.jpg");
        assert_eq!(post.get("has_cards"), "1");
    }

    #[test]
    fn test_quoted_union_unwrapped_one_level() {
        let raw = json!({
            "id_str": "10",
            "quoted_status_result": { "result": { "rest_id": "77" } },
            "legacy": { "quoted_status_permalink": { "expanded": "https://social.example/x/status/77" } }
        });

        let post = post_from_value(&raw);
        assert_eq!(post.get("quoted_post_id"), "77");
        assert_eq!(
            post.get("quoted_post_href"),
            "https://social.example/x/status/77"
        );
    }

    #[test]
    fn test_author_from_value() {
        let raw = json!({
            "rest_id": "7",
            "legacy": {
                "screen_name": "jdoe",
                "name": "John Doe",
                "verified": true,
                "followers_count": 1234,
                "withheld_in_countries": ["DE", "FR"]
            },
            "is_blue_verified": false
        });

        let author = author_from_value(&raw);
        assert_eq!(author.id(), "7");
        assert_eq!(author.get("handle"), "jdoe");
        assert_eq!(author.get("verified_status"), "VERIFIED");
        assert_eq!(author.get("follower_count"), "1234");
        assert_eq!(author.get("withheld_in_countries"), "DE ;;; FR");
        assert_eq!(author.get("premium_subscriber"), "false");
    }

    #[test]
    fn test_unverified_author_is_unknown() {
        let raw = json!({ "id_str": "8", "screen_name": "x", "verified": false });
        let author = author_from_value(&raw);
        assert_eq!(author.get("verified_status"), "UNKNOWN");
    }

    #[test]
    fn test_malformed_timestamp_is_zero() {
        let raw = json!({ "id_str": "11", "created_at": "not a date" });
        let post = post_from_value(&raw);
        assert_eq!(post.get("timestamp"), "0");
        assert_eq!(post.get("created_at"), "not a date");
    }
}
