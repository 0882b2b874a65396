//! End-to-end decoding of a mixed batch of intercepted payloads: multiple
//! shapes, a malformed entry, recognized-ignored blobs, and instruction
//! provenance tags all land in one delivered record sequence.

use serde_json::json;

use timeline_harvester::interchange::{
    MAP_TYPE_KEY, MAP_TYPE_AUTHOR, MAP_TYPE_METADATA, MAP_TYPE_POST, MAP_TYPE_QUALITIES,
};
use timeline_harvester::{harvest_payloads, HarvestConfig, PageType, StringMap};

fn global_timeline_payload() -> String {
    json!({
        "globalObjects": {
            "tweets": {
                "100": {
                    "id_str": "100",
                    "user_id_str": "7",
                    "full_text": "from the legacy endpoint",
                    "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                    "favorite_count": 12,
                    "reply_count": 3,
                    "retweet_count": 4,
                    "lang": "en"
                }
            },
            "users": {
                "7": {
                    "id_str": "7",
                    "screen_name": "legacyuser",
                    "name": "Legacy User",
                    "verified": true,
                    "followers_count": 9000
                }
            }
        },
        "timeline": { "instructions": [] }
    })
    .to_string()
}

fn threaded_conversation_payload() -> String {
    json!({
        "data": { "threaded_conversation_with_injections_v2": { "instructions": [
            {
                "type": "TimelineAddEntries",
                "entries": [
                    { "content": { "entryType": "TimelineTimelineCursor", "value": "c1" } },
                    { "content": {
                        "entryType": "TimelineTimelineItem",
                        "itemContent": { "tweet_results": { "result": {
                            "__typename": "Tweet",
                            "rest_id": "200",
                            "legacy": {
                                "id_str": "200",
                                "full_text": "a graphql reply",
                                "lang": "de"
                            },
                            "core": { "user_results": { "result": {
                                "__typename": "User",
                                "id": "VXNlcjo4",
                                "rest_id": "8",
                                "legacy": { "screen_name": "graphqluser", "name": "GraphQL User" }
                            } } }
                        } } }
                    } },
                    { "content": {
                        "entryType": "TimelineTimelineModule",
                        "displayType": "VerticalConversation",
                        "items": [{ "item": {
                            "itemContent": { "tweet_results": { "result": {
                                "__typename": "Tweet",
                                "rest_id": "201",
                                "legacy": { "id_str": "201", "full_text": "a buried reply" }
                            } } },
                            "clientEventInfo": { "details": { "conversationDetails": {
                                "conversationSection": "AbusiveQuality"
                            } } }
                        } }]
                    } }
                ]
            },
            { "type": "TimelineTerminateTimeline", "direction": "Bottom" }
        ] } }
    })
    .to_string()
}

fn run_batch(payloads: Vec<String>) -> Vec<StringMap> {
    let config = HarvestConfig::new(PageType::Timeline, "https://social.example/feed");
    let mut delivered = None;
    harvest_payloads(&config, &payloads, |records| delivered = Some(records));
    delivered.expect("delivery callback must run")
}

fn of_type<'a>(records: &'a [StringMap], map_type: &str) -> Vec<&'a StringMap> {
    records
        .iter()
        .filter(|record| record.get(MAP_TYPE_KEY).unwrap() == map_type)
        .collect()
}

#[test]
fn mixed_batch_decodes_every_recognized_payload() {
    let records = run_batch(vec![
        global_timeline_payload(),
        "{{{ not json".to_string(),
        json!({ "discoverable_by_email": true }).to_string(),
        json!({ "utterly": "unknown" }).to_string(),
        threaded_conversation_payload(),
    ]);

    let posts = of_type(&records, MAP_TYPE_POST);
    let authors = of_type(&records, MAP_TYPE_AUTHOR);

    // 100 from the legacy shape; 200 and 201 from the threaded conversation
    let ids: Vec<&str> = posts.iter().map(|p| p.get("post_id").unwrap().as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&"100"));
    assert!(ids.contains(&"200"));
    assert!(ids.contains(&"201"));

    // the embedded graphql author was detached and id-normalized
    assert_eq!(authors.len(), 2);
    let graphql_author = authors
        .iter()
        .find(|a| a.get("handle").unwrap() == "graphqluser")
        .unwrap();
    assert_eq!(graphql_author.get("author_id").unwrap(), "8");
}

#[test]
fn legacy_fields_fill_canonical_posts() {
    let records = run_batch(vec![global_timeline_payload()]);
    let posts = of_type(&records, MAP_TYPE_POST);

    let post = posts[0];
    assert_eq!(post.get("text").unwrap(), "from the legacy endpoint");
    assert_eq!(post.get("favorite_count").unwrap(), "12");
    assert_eq!(post.get("reply_count").unwrap(), "3");
    assert_eq!(post.get("repost_count").unwrap(), "4");
    assert_eq!(post.get("timestamp").unwrap(), "1539202764");
    assert_eq!(post.get("author_id").unwrap(), "7");

    let authors = of_type(&records, MAP_TYPE_AUTHOR);
    assert_eq!(authors[0].get("verified_status").unwrap(), "VERIFIED");
    assert_eq!(authors[0].get("follower_count").unwrap(), "9000");
}

#[test]
fn qualities_record_aggregates_section_tags() {
    let records = run_batch(vec![threaded_conversation_payload()]);

    let qualities = of_type(&records, MAP_TYPE_QUALITIES);
    assert_eq!(qualities.len(), 1);
    assert_eq!(qualities[0].get("201").unwrap(), "AbusiveQuality");
    // the item entry carries no section pair, so only the module's post
    // appears in the aggregate
    assert_eq!(qualities[0].len(), 2);
}

#[test]
fn parse_failures_are_recorded_and_non_fatal() {
    let records = run_batch(vec![
        "broken".to_string(),
        global_timeline_payload(),
        "also broken".to_string(),
    ]);

    let metadata = of_type(&records, MAP_TYPE_METADATA);
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].get("completed").unwrap(), "true");

    let errors = metadata[0].get("errors").unwrap();
    assert!(errors.contains("position 0"));
    assert!(errors.contains("position 2"));

    assert_eq!(of_type(&records, MAP_TYPE_POST).len(), 1);
}

#[test]
fn empty_batch_still_delivers_singleton_records() {
    let records = run_batch(Vec::new());

    assert_eq!(records.len(), 2);
    assert_eq!(of_type(&records, MAP_TYPE_QUALITIES).len(), 1);
    assert_eq!(of_type(&records, MAP_TYPE_METADATA).len(), 1);
    assert_eq!(*records.last().unwrap().get(MAP_TYPE_KEY).unwrap(), MAP_TYPE_METADATA);
}
