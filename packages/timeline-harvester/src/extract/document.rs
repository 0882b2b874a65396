//! Assembles a post and its embedded author from one rendered content item.
//!
//! Each field group runs its own fallback chain independently: exhausting
//! one chain annotates the record and leaves that group at its defaults, but
//! never blocks the other groups.

use scraper::ElementRef;

use crate::extract::resolver::{resolve, Resolution, Strategy};
use crate::extract::strategies::{
    avatar_from_profile_link, date_from_timestamp, interactions_from_group_label,
    interactions_from_single_labels, names_from_profile_link, permalink_from_role_links,
    permalink_from_timestamp_link, photo_from_photo_link, post_id_from_interaction_link,
    post_id_from_timestamp_link, text_from_language_container, verified_from_badge,
    views_from_analytics_label, AuthorNames, InteractionCounts, PhotoRefs, PostText,
};
use crate::records::Post;

/// Reads rendered post elements into canonical records.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract one post (and its embedded author) from `element`.
    pub fn extract(&self, element: &ElementRef<'_>) -> Post {
        let mut post = Post::new();

        let id_chain: &[Strategy<ElementRef<'_>, String>] = &[
            ("timestamp_link", post_id_from_timestamp_link),
            ("interaction_link", post_id_from_interaction_link),
        ];
        match resolve("post_id", id_chain, element) {
            Resolution::Resolved { value, .. } => post.set("post_id", value),
            Resolution::Exhausted => post.add_error("cannot find post id"),
        }

        let interaction_chain: &[Strategy<ElementRef<'_>, InteractionCounts>] = &[
            ("group_label", interactions_from_group_label),
            ("single_labels", interactions_from_single_labels),
        ];
        match resolve("interactions", interaction_chain, element) {
            Resolution::Resolved { value, .. } => {
                post.set("reply_count", value.reply);
                post.set("repost_count", value.repost);
                post.set("favorite_count", value.favorite);
                post.set("quote_count", value.quote);
            }
            Resolution::Exhausted => post.add_error("cannot find interaction counts"),
        }

        let views_chain: &[Strategy<ElementRef<'_>, String>] =
            &[("analytics_label", views_from_analytics_label)];
        match resolve("view_count", views_chain, element) {
            Resolution::Resolved { value, .. } => post.set("view_count", value),
            Resolution::Exhausted => post.add_error("cannot find view count"),
        }

        let text_chain: &[Strategy<ElementRef<'_>, PostText>] =
            &[("language_container", text_from_language_container)];
        match resolve("text", text_chain, element) {
            Resolution::Resolved { value, .. } => {
                post.set("text", value.text);
                post.set("html", value.html);
                post.set("language", value.language);
            }
            Resolution::Exhausted => post.add_error("cannot find post text"),
        }

        let photo_chain: &[Strategy<ElementRef<'_>, PhotoRefs>] =
            &[("photo_link", photo_from_photo_link)];
        match resolve("photo", photo_chain, element) {
            Resolution::Resolved { value, .. } => {
                post.set("photo_link", value.link);
                post.set("photo_image", value.image);
            }
            Resolution::Exhausted => post.add_error("cannot find photos"),
        }

        let permalink_chain: &[Strategy<ElementRef<'_>, String>] = &[
            ("timestamp_link", permalink_from_timestamp_link),
            ("role_links", permalink_from_role_links),
        ];
        match resolve("permalink", permalink_chain, element) {
            Resolution::Resolved { value, .. } => post.set("permalink", value),
            Resolution::Exhausted => post.add_error("cannot find permalink"),
        }

        let date_chain: &[Strategy<ElementRef<'_>, String>] =
            &[("timestamp", date_from_timestamp)];
        match resolve("date", date_chain, element) {
            Resolution::Resolved { value, .. } => post.set("created_at", value),
            Resolution::Exhausted => post.add_error("cannot find date"),
        }

        let avatar_chain: &[Strategy<ElementRef<'_>, String>] =
            &[("profile_link", avatar_from_profile_link)];
        match resolve("avatar", avatar_chain, element) {
            Resolution::Resolved { value, .. } => {
                post.set("avatar_url", value.clone());
                post.author_mut().set("avatar_url", value);
            }
            Resolution::Exhausted => post.author_mut().add_error("cannot find avatar"),
        }

        let names_chain: &[Strategy<ElementRef<'_>, AuthorNames>] =
            &[("profile_link", names_from_profile_link)];
        match resolve("author_names", names_chain, element) {
            Resolution::Resolved { value, .. } => {
                post.set("author_handle", value.handle.clone());
                post.set("author_display_name", value.display_name.clone());
                post.author_mut().set("handle", value.handle);
                post.author_mut().set("display_name", value.display_name);
            }
            Resolution::Exhausted => post.author_mut().add_error("cannot find handle"),
        }

        let verified_chain: &[Strategy<ElementRef<'_>, String>] =
            &[("badge", verified_from_badge)];
        if let Resolution::Resolved { value, .. } = resolve("verified", verified_chain, element) {
            post.set("verified_text", value.clone());
            post.author_mut().set("verified_status", value);
        }

        if !post.has_id() {
            tracing::debug!("content item without a recoverable post id");
        }

        post
    }
}
