//! Assembly of the run's output sequence.
//!
//! Every run, document-driven or payload-driven, delivers one ordered
//! sequence of flat string-to-string maps through a single completion
//! callback. Each map carries a `map_type` discriminator; there is exactly
//! one `metadata` record and exactly one provenance-qualities record per
//! run. No failure mode escapes as a panic across this boundary: everything
//! the run learned, including why it stopped, travels as data.

use chrono::{DateTime, Utc};

use crate::config::HarvestConfig;
use crate::mapping::{join_errors, StringMap};
use crate::payload::{parse_batch, Instruction};
use crate::records::{Author, PostCollection};

/// Discriminator key present in every output map.
pub const MAP_TYPE_KEY: &str = "map_type";
pub const MAP_TYPE_POST: &str = "tweet";
pub const MAP_TYPE_AUTHOR: &str = "user";
pub const MAP_TYPE_METADATA: &str = "metadata";
pub const MAP_TYPE_QUALITIES: &str = "tweetid_to_supposed_qualities";

/// Run-level outcome carried in the single metadata record.
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub url: String,
    pub request_date: String,
    pub completed: bool,
    pub error_code: String,
    pub error_message: String,
    /// Last `state.status` compound the orchestrator reached
    pub last_compound: String,
    /// Set when the content selector never appeared
    pub content_note: String,
    /// Set when no expand-replies control was found
    pub expand_note: String,
    pub ticks: u32,
    pub elapsed_ms: i64,
    pub batch_errors: Vec<String>,

    started_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new(url: impl Into<String>) -> Self {
        let started_at = Utc::now();
        Self {
            url: url.into(),
            request_date: started_at.to_rfc2822(),
            completed: true,
            error_code: String::new(),
            error_message: String::new(),
            last_compound: String::new(),
            content_note: String::new(),
            expand_note: String::new(),
            ticks: 0,
            elapsed_ms: 0,
            batch_errors: Vec::new(),
            started_at,
        }
    }

    /// Record the failure that aborts the run.
    pub fn fail(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.completed = false;
        self.error_code = code.into();
        self.error_message = message.into();
    }

    /// Stamp the elapsed wall-clock time.
    pub fn finish_timing(&mut self) {
        self.elapsed_ms = (Utc::now() - self.started_at).num_milliseconds();
    }

    pub fn to_map(&self) -> StringMap {
        let mut map = StringMap::new();
        map.insert(MAP_TYPE_KEY.to_string(), MAP_TYPE_METADATA.to_string());
        map.insert("url".to_string(), self.url.clone());
        map.insert("request_date".to_string(), self.request_date.clone());
        map.insert("completed".to_string(), self.completed.to_string());
        map.insert("error_code".to_string(), self.error_code.clone());
        map.insert("error_message".to_string(), self.error_message.clone());
        map.insert("last_compound".to_string(), self.last_compound.clone());
        map.insert("content_selector".to_string(), self.content_note.clone());
        map.insert("expand_replies".to_string(), self.expand_note.clone());
        map.insert("ticks".to_string(), self.ticks.to_string());
        map.insert("elapsed_ms".to_string(), self.elapsed_ms.to_string());
        map.insert("errors".to_string(), join_errors(&self.batch_errors));
        map
    }
}

/// Aggregate the provenance-tag pairs harvested from add-entries
/// instructions into the run's single qualities record.
pub fn qualities_record(instructions: &[Instruction]) -> StringMap {
    let mut map = StringMap::new();
    map.insert(MAP_TYPE_KEY.to_string(), MAP_TYPE_QUALITIES.to_string());

    for instruction in instructions {
        if let Instruction::AddEntries { tags } = instruction {
            for tag in tags {
                map.insert(tag.post_id.clone(), tag.section.clone());
            }
        }
    }

    map
}

fn tag(mut map: StringMap, map_type: &str) -> StringMap {
    map.insert(MAP_TYPE_KEY.to_string(), map_type.to_string());
    map
}

/// Assemble the full output sequence: the qualities record, every post,
/// every standalone author, and the metadata record last.
pub fn assemble_run(
    collection: &PostCollection,
    authors: &[Author],
    instructions: &[Instruction],
    metadata: &RunMetadata,
) -> Vec<StringMap> {
    let mut records = Vec::with_capacity(collection.len() + authors.len() + 2);

    records.push(qualities_record(instructions));

    for post in collection.export_all() {
        records.push(tag(post, MAP_TYPE_POST));
    }

    for author in authors {
        records.push(tag(author.export(), MAP_TYPE_AUTHOR));
    }

    records.push(metadata.to_map());

    records
}

/// Decode a batch of intercepted payload strings and deliver the resulting
/// record sequence through `on_complete`: the payload-side counterpart of
/// [`crate::run::Runner::run`].
pub fn harvest_payloads(
    config: &HarvestConfig,
    payloads: &[String],
    on_complete: impl FnOnce(Vec<StringMap>),
) {
    let mut metadata = RunMetadata::new(config.url.clone());

    let batch = parse_batch(payloads);

    if config.debug.is_verbose() {
        for post in &batch.posts {
            tracing::debug!("decoded post: {}", post.debug_summary());
        }
        for author in &batch.authors {
            tracing::debug!("decoded author: {}", author.debug_summary());
        }
    }

    let mut collection = PostCollection::new();
    collection.add_all(batch.posts);

    metadata.batch_errors = batch.errors;
    metadata.finish_timing();

    on_complete(assemble_run(
        &collection,
        &batch.authors,
        &batch.instructions,
        &metadata,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageType;
    use crate::payload::SectionTag;
    use crate::records::Post;

    #[test]
    fn test_assemble_run_record_order_and_uniqueness() {
        let mut collection = PostCollection::new();
        let mut post = Post::new();
        post.set("post_id", "1");
        collection.add(post);

        let authors = vec![Author::new()];
        let instructions = vec![Instruction::AddEntries {
            tags: vec![SectionTag {
                post_id: "1".to_string(),
                display_type: "VerticalConversation".to_string(),
                section: "LowQuality".to_string(),
            }],
        }];
        let metadata = RunMetadata::new("https://social.example/x");

        let records = assemble_run(&collection, &authors, &instructions, &metadata);
        assert_eq!(records.len(), 4);

        let types: Vec<&str> = records
            .iter()
            .map(|r| r.get(MAP_TYPE_KEY).unwrap().as_str())
            .collect();
        assert_eq!(
            types,
            [MAP_TYPE_QUALITIES, MAP_TYPE_POST, MAP_TYPE_AUTHOR, MAP_TYPE_METADATA]
        );

        assert_eq!(records[0].get("1").unwrap(), "LowQuality");
        assert_eq!(records[3].get("completed").unwrap(), "true");
    }

    #[test]
    fn test_metadata_failure_fields() {
        let mut metadata = RunMetadata::new("https://social.example/x");
        metadata.fail("runner_too_many_iterations", "retrieval exceeded the tick cap");
        metadata.ticks = 1001;

        let map = metadata.to_map();
        assert_eq!(map.get("completed").unwrap(), "false");
        assert_eq!(map.get("error_code").unwrap(), "runner_too_many_iterations");
        assert_eq!(map.get("ticks").unwrap(), "1001");
    }

    #[test]
    fn test_harvest_payloads_delivers_once() {
        let config = HarvestConfig::new(PageType::Timeline, "https://social.example/x");
        let payloads = vec![
            "broken".to_string(),
            r#"{"globalObjects":{"tweets":{"5":{"id_str":"5","full_text":"hi"}},"users":{"7":{"id_str":"7","screen_name":"j"}}},"timeline":{"instructions":[]}}"#.to_string(),
        ];

        let mut delivered: Option<Vec<StringMap>> = None;
        harvest_payloads(&config, &payloads, |records| delivered = Some(records));

        let records = delivered.expect("callback runs exactly once");
        // qualities + 1 post + 1 author + metadata
        assert_eq!(records.len(), 4);

        let metadata = records.last().unwrap();
        assert_eq!(metadata.get(MAP_TYPE_KEY).unwrap(), MAP_TYPE_METADATA);
        assert!(metadata.get("errors").unwrap().contains("position 0"));
        assert_eq!(metadata.get("completed").unwrap(), "true");
    }
}
