//! Batch decoding of intercepted payload text.
//!
//! Each payload string is parsed and classified independently: a malformed
//! string records a batch-level error naming its position, an unrecognized
//! shape is dropped with a diagnostic, and the rest of the batch always
//! continues.

use serde_json::Value;

use crate::payload::{
    author_from_value, classify, decode_instructions, extract_raw, post_from_value,
    unwrap_envelope, Instruction, Shape,
};
use crate::records::{Author, Post};

/// Everything decoded from one batch of payload strings.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub posts: Vec<Post>,
    pub authors: Vec<Author>,
    pub instructions: Vec<Instruction>,
    pub errors: Vec<String>,
}

/// Parse and decode a batch of raw JSON-text payloads.
pub fn parse_batch(payloads: &[String]) -> DecodedBatch {
    let mut batch = DecodedBatch::default();

    for (position, raw) in payloads.iter().enumerate() {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(error) => {
                batch
                    .errors
                    .push(format!("cannot parse payload at position {position}: {error}"));
                continue;
            }
        };

        let value = unwrap_envelope(&value);
        let shape = classify(value);

        match shape {
            Shape::Ignored(kind) => {
                tracing::debug!(position, ?kind, "skipping recognized payload shape");
                continue;
            }
            Shape::Unrecognized => {
                tracing::debug!(position, "dropping unrecognized payload shape");
                continue;
            }
            _ => {}
        }

        tracing::debug!(position, shape = shape.name(), "decoding payload");

        let raw_batch = extract_raw(shape, value);

        batch
            .posts
            .extend(raw_batch.tweets.iter().map(post_from_value));
        batch
            .authors
            .extend(raw_batch.users.iter().map(author_from_value));

        let decoded = decode_instructions(&raw_batch.instructions);
        batch.posts.extend(decoded.tweets.iter().map(post_from_value));
        batch
            .authors
            .extend(decoded.users.iter().map(author_from_value));
        batch.instructions.extend(decoded.instructions);
        batch.errors.extend(decoded.errors);
    }

    tracing::debug!(
        posts = batch.posts.len(),
        authors = batch.authors.len(),
        instructions = batch.instructions.len(),
        errors = batch.errors.len(),
        "payload batch decoded"
    );

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_records_position_and_continues() {
        let payloads = vec![
            "{not json".to_string(),
            r#"{"globalObjects":{"tweets":{"1":{"id_str":"1","full_text":"hi"}},"users":{}},"timeline":{"instructions":[]}}"#.to_string(),
        ];

        let batch = parse_batch(&payloads);
        assert_eq!(batch.errors.len(), 1);
        assert!(batch.errors[0].contains("position 0"));
        assert_eq!(batch.posts.len(), 1);
        assert_eq!(batch.posts[0].id(), "1");
    }

    #[test]
    fn test_ignored_and_unrecognized_are_dropped_silently() {
        let payloads = vec![
            r#"{"discoverable_by_email":true}"#.to_string(),
            r#"{"nothing":"known"}"#.to_string(),
        ];

        let batch = parse_batch(&payloads);
        assert!(batch.errors.is_empty());
        assert!(batch.posts.is_empty());
        assert!(batch.authors.is_empty());
    }

    #[test]
    fn test_threaded_conversation_end_to_end() {
        let payload = serde_json::json!({
            "data": { "threaded_conversation_with_injections_v2": { "instructions": [{
                "type": "TimelineAddEntries",
                "entries": [{
                    "content": { "entryType": "TimelineTimelineItem",
                        "itemContent": { "tweet_results": { "result": {
                            "__typename": "Tweet",
                            "rest_id": "300",
                            "legacy": { "id_str": "300", "full_text": "threaded" },
                            "core": { "user_results": { "result": {
                                "__typename": "User",
                                "id": "VXNlcjoz",
                                "rest_id": "3",
                                "legacy": { "screen_name": "threader" }
                            } } }
                        } } } }
                }]
            }] } }
        });

        let batch = parse_batch(&[payload.to_string()]);
        assert_eq!(batch.posts.len(), 1);
        assert_eq!(batch.posts[0].id(), "300");
        assert_eq!(batch.posts[0].get("text"), "threaded");
        assert_eq!(batch.authors.len(), 1);
        assert_eq!(batch.authors[0].id(), "3");
        assert_eq!(batch.authors[0].get("handle"), "threader");
        assert_eq!(batch.instructions.len(), 1);
    }
}
