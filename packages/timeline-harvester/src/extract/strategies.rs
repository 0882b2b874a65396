//! Per-field-group extraction strategies over one rendered post element.
//!
//! Each strategy encodes a structural query path plus an interpretation
//! rule, and declines (returns `None`) rather than guessing. The chains in
//! [`super::document`] decide ordering.

use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

use crate::dom::{element_text, parent_element, selector};
use crate::link::PostLink;
use crate::phrase::NumericPhrase;

/// Reply/repost/favorite counts pulled from one source, plus the quote
/// count when the source carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionCounts {
    pub reply: String,
    pub repost: String,
    pub favorite: String,
    pub quote: String,
}

/// Text, markup, and language of the post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText {
    pub text: String,
    pub html: String,
    pub language: String,
}

/// Photo permalink and image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRefs {
    pub link: String,
    pub image: String,
}

/// Author display name and handle as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorNames {
    pub display_name: String,
    pub handle: String,
}

fn classify_href(element: &ElementRef<'_>) -> Option<PostLink> {
    element.value().attr("href").and_then(PostLink::classify)
}

/// Post id from a timestamp-bearing element whose direct parent is an
/// anchor classified as a status link.
pub fn post_id_from_timestamp_link(element: &ElementRef<'_>) -> Option<String> {
    for time in element.select(&selector("time")) {
        if time.value().attr("datetime").is_none() {
            continue;
        }
        let Some(parent) = parent_element(&time) else {
            continue;
        };
        if parent.value().name() != "a" {
            continue;
        }
        if let Some(link) = classify_href(&parent) {
            if link.is_status() {
                return link.post_id().map(str::to_string);
            }
        }
    }

    None
}

/// Post id from any anchor classified as an interaction link. Historical
/// fallback; never the sole source of truth.
pub fn post_id_from_interaction_link(element: &ElementRef<'_>) -> Option<String> {
    for anchor in element.select(&selector("a")) {
        if let Some(link) = classify_href(&anchor) {
            if link.is_interaction() {
                return link.post_id().map(str::to_string);
            }
        }
    }

    None
}

/// Interaction counts from a single accessibility label carrying the
/// reply/repost/favorite triple.
pub fn interactions_from_group_label(element: &ElementRef<'_>) -> Option<InteractionCounts> {
    static TRIPLE: OnceLock<Regex> = OnceLock::new();
    let triple = TRIPLE.get_or_init(|| Regex::new(r"(\d+) .*, (\d+) .*, (\d+) ").unwrap());

    for labeled in element.select(&selector("div[aria-label]")) {
        let Some(label) = labeled.value().attr("aria-label") else {
            continue;
        };
        if let Some(caps) = triple.captures(label) {
            return Some(InteractionCounts {
                reply: caps[1].to_string(),
                repost: caps[2].to_string(),
                favorite: caps[3].to_string(),
                quote: String::new(),
            });
        }
    }

    None
}

/// Interaction counts from independent single-count accessibility labels.
pub fn interactions_from_single_labels(element: &ElementRef<'_>) -> Option<InteractionCounts> {
    static REPLY: OnceLock<Regex> = OnceLock::new();
    static REPOST: OnceLock<Regex> = OnceLock::new();
    static FAVORITE: OnceLock<Regex> = OnceLock::new();
    static QUOTE: OnceLock<Regex> = OnceLock::new();

    let reply = REPLY.get_or_init(|| Regex::new(r"(?i)(\d+) repl").unwrap());
    let repost = REPOST.get_or_init(|| Regex::new(r"(?i)(\d+) (?:retweet|repost)").unwrap());
    let favorite = FAVORITE.get_or_init(|| Regex::new(r"(?i)(\d+) like").unwrap());
    let quote = QUOTE.get_or_init(|| Regex::new(r"(?i)(\d+) quote").unwrap());

    for labeled in element.select(&selector("div[aria-label]")) {
        let Some(label) = labeled.value().attr("aria-label") else {
            continue;
        };

        let mut counts = InteractionCounts::default();
        let mut found = false;

        for (regex, slot) in [
            (reply, &mut counts.reply),
            (repost, &mut counts.repost),
            (favorite, &mut counts.favorite),
            (quote, &mut counts.quote),
        ] {
            if let Some(caps) = regex.captures(label) {
                *slot = caps[1].to_string();
                found = true;
            }
        }

        if found {
            return Some(counts);
        }
    }

    None
}

/// View count from an analytics anchor whose accessibility label carries a
/// number.
pub fn views_from_analytics_label(element: &ElementRef<'_>) -> Option<String> {
    for anchor in element.select(&selector("a[aria-label]")) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("analytics") {
            continue;
        }
        let Some(label) = anchor.value().attr("aria-label") else {
            continue;
        };
        if let Some(count) = NumericPhrase::new(label).number(0) {
            return Some(count.to_string());
        }
    }

    None
}

/// Post body from the language-tagged text container.
pub fn text_from_language_container(element: &ElementRef<'_>) -> Option<PostText> {
    for container in element.select(&selector("[lang]")) {
        let Some(language) = container.value().attr("lang") else {
            continue;
        };
        let text = element_text(&container);
        if language.is_empty() || text.is_empty() {
            continue;
        }
        return Some(PostText {
            text,
            html: container.inner_html(),
            language: language.to_string(),
        });
    }

    None
}

/// Photo permalink and image from an anchor classified as a photo link that
/// contains the rendered image.
pub fn photo_from_photo_link(element: &ElementRef<'_>) -> Option<PhotoRefs> {
    for anchor in element.select(&selector("a")) {
        let Some(link) = classify_href(&anchor) else {
            continue;
        };
        if !link.is_photo() {
            continue;
        }
        for img in anchor.select(&selector("img")) {
            if let Some(src) = img.value().attr("src") {
                return Some(PhotoRefs {
                    link: link.source().unwrap_or_default().to_string(),
                    image: src.to_string(),
                });
            }
        }
    }

    None
}

/// Permalink verbatim from the timestamp anchor's href.
pub fn permalink_from_timestamp_link(element: &ElementRef<'_>) -> Option<String> {
    for time in element.select(&selector("time")) {
        if time.value().attr("datetime").is_none() {
            continue;
        }
        let Some(parent) = parent_element(&time) else {
            continue;
        };
        if let Some(link) = classify_href(&parent) {
            if link.is_status() {
                return link.source().map(str::to_string);
            }
        }
    }

    None
}

/// Normalized permalink from any role=link anchor in the status family.
pub fn permalink_from_role_links(element: &ElementRef<'_>) -> Option<String> {
    for anchor in element.select(&selector("a[role=\"link\"]")) {
        if let Some(link) = classify_href(&anchor) {
            if link.is_status() {
                return link.status_path();
            }
        }
    }

    None
}

/// Date string from a timestamp element's machine-readable attribute.
pub fn date_from_timestamp(element: &ElementRef<'_>) -> Option<String> {
    element
        .select(&selector("time"))
        .find_map(|time| time.value().attr("datetime").map(str::to_string))
}

/// Avatar image inside an anchor classified as a bare profile link.
pub fn avatar_from_profile_link(element: &ElementRef<'_>) -> Option<String> {
    for anchor in element.select(&selector("a")) {
        if !matches!(classify_href(&anchor), Some(PostLink::Profile { .. })) {
            continue;
        }
        for img in anchor.select(&selector("img")) {
            if let Some(src) = img.value().attr("src") {
                return Some(src.to_string());
            }
        }
    }

    None
}

/// Display name and handle from the spans of a profile-link anchor. The
/// handle is the span rendered with a leading `@`; a missing display name
/// falls back to the handle.
pub fn names_from_profile_link(element: &ElementRef<'_>) -> Option<AuthorNames> {
    for anchor in element.select(&selector("a")) {
        if !matches!(classify_href(&anchor), Some(PostLink::Profile { .. })) {
            continue;
        }

        let mut handle = String::new();
        let mut display_name = String::new();

        for span in anchor.select(&selector("span")) {
            let text = element_text(&span);
            if text.is_empty() {
                continue;
            }
            if text.starts_with('@') {
                if handle.is_empty() {
                    handle = text;
                }
            } else if display_name.is_empty() && !span.select(&selector("span")).any(|_| true) {
                display_name = text;
            }
        }

        if !handle.is_empty() {
            if display_name.is_empty() {
                display_name = handle.clone();
            }
            return Some(AuthorNames {
                display_name,
                handle,
            });
        }
    }

    None
}

/// `VERIFIED` when a badge icon labeled as verified is present.
pub fn verified_from_badge(element: &ElementRef<'_>) -> Option<String> {
    for svg in element.select(&selector("svg")) {
        let label = svg.value().attr("aria-label").unwrap_or_default();
        let testid = svg.value().attr("data-testid").unwrap_or_default();
        let combined = format!("{label} {testid}").to_lowercase();
        if combined.contains("verified") {
            return Some("VERIFIED".to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    fn first_article(html: &scraper::Html) -> ElementRef<'_> {
        html.select(&selector("article")).next().unwrap()
    }

    const SAMPLE: &str = r#"
        <article>
          <div><a href="/jdoe"><img src="https://images.example/avatar.jpg"/></a></div>
          <div><a href="/jdoe"><span>John Doe</span><span>@jdoe</span></a>
            <svg aria-label="Verified account"></svg></div>
          <a href="/jdoe/status/12345"><time datetime="2023-05-01T10:00:00.000Z">May 1</time></a>
          <div lang="en"><span>hello world</span></div>
          <div aria-label="3 replies, 5 reposts, 9 likes "></div>
          <a aria-label="120 views" href="/jdoe/status/12345/analytics"></a>
          <a href="/jdoe/status/12345/photo/1"><img src="https://images.example/photo.jpg"/></a>
        </article>
    "#;

    #[test]
    fn test_post_id_from_timestamp_link() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);
        assert_eq!(
            post_id_from_timestamp_link(&article),
            Some("12345".to_string())
        );
    }

    #[test]
    fn test_interactions_from_group_label() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);
        let counts = interactions_from_group_label(&article).unwrap();
        assert_eq!(counts.reply, "3");
        assert_eq!(counts.repost, "5");
        assert_eq!(counts.favorite, "9");
    }

    #[test]
    fn test_interactions_from_single_labels() {
        let html = parse_document(
            r#"<article><div aria-label="7 Replies"></div>
               <div aria-label="2 Retweets, and more"></div></article>"#,
        );
        let article = first_article(&html);
        let counts = interactions_from_single_labels(&article).unwrap();
        assert_eq!(counts.reply, "7");
        // first label wins; the second is never reached
        assert_eq!(counts.repost, "");
    }

    #[test]
    fn test_views_from_analytics_label() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);
        assert_eq!(
            views_from_analytics_label(&article),
            Some("120".to_string())
        );
    }

    #[test]
    fn test_text_from_language_container() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);
        let body = text_from_language_container(&article).unwrap();
        assert_eq!(body.text, "hello world");
        assert_eq!(body.language, "en");
        assert!(body.html.contains("<span>"));
    }

    #[test]
    fn test_photo_from_photo_link() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);
        let photo = photo_from_photo_link(&article).unwrap();
        assert_eq!(photo.link, "/jdoe/status/12345/photo/1");
        assert_eq!(photo.image, "https://images.example/photo.jpg");
    }

    #[test]
    fn test_permalink_strategies() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);
        assert_eq!(
            permalink_from_timestamp_link(&article),
            Some("/jdoe/status/12345".to_string())
        );

        let html = parse_document(
            r#"<article><a role="link" href="/jdoe/status/777/likes">9 likes</a></article>"#,
        );
        let article = first_article(&html);
        assert_eq!(
            permalink_from_role_links(&article),
            Some("/jdoe/status/777".to_string())
        );
    }

    #[test]
    fn test_avatar_and_names_and_badge() {
        let html = parse_document(SAMPLE);
        let article = first_article(&html);

        assert_eq!(
            avatar_from_profile_link(&article),
            Some("https://images.example/avatar.jpg".to_string())
        );

        let names = names_from_profile_link(&article).unwrap();
        assert_eq!(names.handle, "@jdoe");
        assert_eq!(names.display_name, "John Doe");

        assert_eq!(verified_from_badge(&article), Some("VERIFIED".to_string()));
    }

    #[test]
    fn test_strategies_decline_on_empty_markup() {
        let html = parse_document("<article><div>bare</div></article>");
        let article = first_article(&html);

        assert_eq!(post_id_from_timestamp_link(&article), None);
        assert_eq!(interactions_from_group_label(&article), None);
        assert_eq!(views_from_analytics_label(&article), None);
        assert_eq!(text_from_language_container(&article), None);
        assert_eq!(photo_from_photo_link(&article), None);
        assert_eq!(date_from_timestamp(&article), None);
        assert_eq!(names_from_profile_link(&article), None);
        assert_eq!(verified_from_badge(&article), None);
    }
}
