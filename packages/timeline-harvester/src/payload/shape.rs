//! Classification of decoded payloads into known top-level shapes.
//!
//! Payload shapes vary by endpoint and API version and are undocumented.
//! Classification evaluates a fixed list of structural predicates in order;
//! several shapes are recognized only to be explicitly ignored, and an
//! unrecognized shape is dropped with a diagnostic rather than treated as an
//! error. A matched shape yields the raw tweet / user / instruction objects
//! via a read-only traversal; input payloads are never mutated.

use serde_json::Value;

use crate::payload::normalize_author_id;

/// Shapes recognized only to be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredKind {
    /// Screen-name lookup response
    ScreenNameLookup,
    /// Animation/media descriptor blob
    MediaDescriptor,
    /// Account settings blob
    UserSettings,
    /// Domain-suggestion blob
    DomainSuggestions,
    /// Hashflag campaign array
    Hashflags,
}

/// One recognized top-level payload structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Legacy `globalObjects`/`timeline` response
    GlobalTimeline,
    /// Single user under `data.user.result` without a timeline
    IncompleteUser,
    /// Array of user results under `data.users`
    IncompleteUserList,
    /// Array whose elements pair a `token` with a `user`
    UserList,
    /// `data.threaded_conversation_with_injections_v2`
    ThreadedConversation,
    /// Nested `timeline_v2.timeline`
    TimelineV2,
    /// Recognized but deliberately skipped
    Ignored(IgnoredKind),
    /// No predicate matched
    Unrecognized,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::GlobalTimeline => "global_timeline",
            Shape::IncompleteUser => "incomplete_user",
            Shape::IncompleteUserList => "incomplete_user_list",
            Shape::UserList => "user_list",
            Shape::ThreadedConversation => "threaded_conversation",
            Shape::TimelineV2 => "timeline_v2",
            Shape::Ignored(_) => "ignored",
            Shape::Unrecognized => "unrecognized",
        }
    }
}

/// Raw objects pulled out of one classified payload.
#[derive(Debug, Default)]
pub struct RawBatch {
    pub tweets: Vec<Value>,
    pub users: Vec<Value>,
    pub instructions: Vec<Value>,
}

/// Some capture tooling wraps the payload under a single `JSON` key.
pub fn unwrap_envelope(value: &Value) -> &Value {
    value.get("JSON").unwrap_or(value)
}

/// Classify a decoded payload by evaluating the structural predicates in
/// fixed order; the first match wins.
pub fn classify(value: &Value) -> Shape {
    if value.pointer("/data/user_result_by_screen_name").is_some() {
        return Shape::Ignored(IgnoredKind::ScreenNameLookup);
    }

    if value.get("w").is_some()
        && value.get("h").is_some()
        && (value.get("nm").is_some() || value.get("assets").is_some())
    {
        return Shape::Ignored(IgnoredKind::MediaDescriptor);
    }

    if value.get("discoverable_by_email").is_some() {
        return Shape::Ignored(IgnoredKind::UserSettings);
    }

    if value.pointer("/data/viewer/article_nudge_domains").is_some() {
        return Shape::Ignored(IgnoredKind::DomainSuggestions);
    }

    if let Some(items) = value.as_array() {
        if items
            .first()
            .is_some_and(|first| first.get("starting_timestamp_ms").is_some())
        {
            return Shape::Ignored(IgnoredKind::Hashflags);
        }
    }

    if let Some(users) = value.pointer("/data/users").and_then(Value::as_array) {
        if users.first().is_some_and(|first| first.get("result").is_some()) {
            return Shape::IncompleteUserList;
        }
    }

    if value.pointer("/data/user/result").is_some()
        && value.pointer("/data/user/result/timeline_v2").is_none()
    {
        return Shape::IncompleteUser;
    }

    if value.get("globalObjects").is_some() || value.get("timeline").is_some() {
        return Shape::GlobalTimeline;
    }

    if let Some(items) = value.as_array() {
        if items.first().is_some_and(|first| first.get("token").is_some()) {
            return Shape::UserList;
        }
    }

    if value
        .pointer("/data/threaded_conversation_with_injections_v2")
        .is_some()
    {
        return Shape::ThreadedConversation;
    }

    if value
        .pointer("/data/user/result/timeline_v2/timeline")
        .is_some()
    {
        return Shape::TimelineV2;
    }

    Shape::Unrecognized
}

fn collect_members(container: Option<&Value>, out: &mut Vec<Value>) {
    match container {
        Some(Value::Object(map)) => out.extend(map.values().cloned()),
        Some(Value::Array(items)) => out.extend(items.iter().cloned()),
        _ => {}
    }
}

/// Extract the raw tweet / user / instruction objects a matched shape
/// carries. Ignored and unrecognized shapes yield nothing.
pub fn extract_raw(shape: Shape, value: &Value) -> RawBatch {
    let mut batch = RawBatch::default();

    match shape {
        Shape::GlobalTimeline => {
            collect_members(value.pointer("/globalObjects/tweets"), &mut batch.tweets);
            collect_members(value.pointer("/globalObjects/users"), &mut batch.users);
            collect_members(value.pointer("/timeline/tweets"), &mut batch.tweets);
            collect_members(value.pointer("/timeline/users"), &mut batch.users);
            collect_members(
                value.pointer("/timeline/instructions"),
                &mut batch.instructions,
            );
        }
        Shape::IncompleteUser => {
            if let Some(user) = value.pointer("/data/user/result") {
                let mut user = user.clone();
                normalize_author_id(&mut user);
                batch.users.push(user);
            }
        }
        Shape::IncompleteUserList => {
            if let Some(users) = value.pointer("/data/users").and_then(Value::as_array) {
                for entry in users {
                    if let Some(user) = entry.get("result") {
                        let mut user = user.clone();
                        normalize_author_id(&mut user);
                        batch.users.push(user);
                    }
                }
            }
        }
        Shape::UserList => {
            if let Some(items) = value.as_array() {
                for entry in items {
                    if let Some(user) = entry.get("user") {
                        batch.users.push(user.clone());
                    }
                }
            }
        }
        Shape::ThreadedConversation => {
            collect_members(
                value.pointer("/data/threaded_conversation_with_injections_v2/instructions"),
                &mut batch.instructions,
            );
        }
        Shape::TimelineV2 => {
            collect_members(
                value.pointer("/data/user/result/timeline_v2/timeline/instructions"),
                &mut batch.instructions,
            );
        }
        Shape::Ignored(_) | Shape::Unrecognized => {}
    }

    batch
}
