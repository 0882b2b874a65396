//! Decoding of deeply-nested, union-typed timeline instructions.
//!
//! An add-entries instruction carries cursor entries (ignored), single
//! timeline items (one embedded tweet, whose embedded author is unwrapped
//! one level), and timeline modules (item lists whose members may pair a
//! post id with a conversation-section label; those pairs are preserved as
//! a side list of provenance tags). A terminate instruction carries only a
//! direction flag. Traversal is read-only: extracted objects are cloned out
//! and the embedded author is detached from the clone, never from the input.

use serde_json::Value;

use crate::payload::normalize_author_id;

/// Provenance pair harvested from a timeline module item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTag {
    pub post_id: String,
    pub display_type: String,
    pub section: String,
}

/// One decoded timeline instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Entries were added; provenance tags collected along the way.
    AddEntries { tags: Vec<SectionTag> },
    /// The timeline terminated in the given direction.
    Terminate { direction: String },
}

/// Everything decoded from one payload's raw instruction list.
#[derive(Debug, Default)]
pub struct DecodedInstructions {
    pub instructions: Vec<Instruction>,
    /// Tweet objects embedded in entries, detached from their authors
    pub tweets: Vec<Value>,
    /// Author objects embedded in entries, id-normalized
    pub users: Vec<Value>,
    pub errors: Vec<String>,
}

/// Instruction-object keys the source emits that carry nothing we keep.
const IGNORABLE_KEYS: &[&str] = &[
    "addEntries",
    "clearCache",
    "clearEntriesUnreadState",
    "markEntriesUnreadGreaterThanSortIndex",
];

fn typename(value: &Value) -> Option<&str> {
    value.get("__typename").and_then(Value::as_str)
}

/// Clone a tweet result out, detaching and returning its embedded author.
fn take_tweet(result: &Value, out: &mut DecodedInstructions) {
    if typename(result) != Some("Tweet") {
        return;
    }

    let mut tweet = result.clone();

    if let Some(user) = tweet.pointer("/core/user_results/result") {
        if typename(user) == Some("User") {
            let mut user = user.clone();
            normalize_author_id(&mut user);
            out.users.push(user);

            if let Some(holder) = tweet.pointer_mut("/core/user_results") {
                if let Some(map) = holder.as_object_mut() {
                    map.remove("result");
                }
            }
        }
    }

    out.tweets.push(tweet);
}

fn decode_timeline_item(entry: &Value, out: &mut DecodedInstructions) {
    if let Some(result) = entry.pointer("/content/itemContent/tweet_results/result") {
        take_tweet(result, out);
    }

    if let Some(user) = entry.pointer("/core/user_results/result") {
        if typename(user) == Some("User") {
            let mut user = user.clone();
            normalize_author_id(&mut user);
            out.users.push(user);
        }
    }

    if let Some(items) = entry.pointer("/content/items").and_then(Value::as_array) {
        for item in items {
            let entry_id = item.get("entryId").and_then(Value::as_str).unwrap_or("");
            if entry_id.contains("whoToFollow") {
                continue;
            }
            if let Some(result) = item.pointer("/item/itemContent/tweet_results/result") {
                take_tweet(result, out);
            }
        }
    }
}

fn decode_timeline_module(entry: &Value, tags: &mut Vec<SectionTag>, out: &mut DecodedInstructions) {
    let Some(items) = entry.pointer("/content/items").and_then(Value::as_array) else {
        return;
    };

    let display_type = entry
        .pointer("/content/displayType")
        .and_then(Value::as_str)
        .unwrap_or("");

    for item in items {
        let post_id = item
            .pointer("/item/itemContent/tweet_results/result/rest_id")
            .and_then(Value::as_str);
        let section = item
            .pointer("/item/clientEventInfo/details/conversationDetails/conversationSection")
            .and_then(Value::as_str);

        if let (Some(post_id), Some(section)) = (post_id, section) {
            tags.push(SectionTag {
                post_id: post_id.to_string(),
                display_type: display_type.to_string(),
                section: section.to_string(),
            });
        }

        if let Some(result) = item.pointer("/item/itemContent/tweet_results/result") {
            take_tweet(result, out);
        }
    }
}

fn decode_add_entries(value: &Value, out: &mut DecodedInstructions) -> Instruction {
    let mut tags = Vec::new();

    let Some(entries) = value.get("entries").and_then(Value::as_array) else {
        out.errors
            .push("add-entries instruction without entries".to_string());
        return Instruction::AddEntries { tags };
    };

    for entry in entries {
        match entry.pointer("/content/entryType").and_then(Value::as_str) {
            // cursors carry pagination state we never follow
            Some("TimelineTimelineCursor") => {}
            Some("TimelineTimelineItem") => decode_timeline_item(entry, out),
            Some("TimelineTimelineModule") => decode_timeline_module(entry, &mut tags, out),
            _ => {}
        }
    }

    Instruction::AddEntries { tags }
}

fn terminate(value: &Value) -> Instruction {
    Instruction::Terminate {
        direction: value
            .get("direction")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    }
}

/// Decode a payload's raw instruction objects. Unknown instruction objects
/// record a batch error and are skipped; recognized-but-empty forms are
/// skipped silently.
pub fn decode_instructions(raw: &[Value]) -> DecodedInstructions {
    let mut out = DecodedInstructions::default();

    for value in raw {
        match value.get("type").and_then(Value::as_str) {
            Some("TimelineAddEntries") => {
                let instruction = decode_add_entries(value, &mut out);
                out.instructions.push(instruction);
                continue;
            }
            Some("TimelineTerminateTimeline") => {
                out.instructions.push(terminate(value));
                continue;
            }
            _ => {}
        }

        if let Some(legacy) = value.get("terminateTimeline") {
            out.instructions.push(terminate(legacy));
        } else if IGNORABLE_KEYS.iter().any(|key| value.get(key).is_some()) {
            tracing::trace!("skipping ignorable instruction object");
        } else {
            out.errors.push("unrecognized instruction object".to_string());
        }
    }

    out
}
