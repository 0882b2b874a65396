//! Insertion-ordered, dedup-by-id store for posts.

use indexmap::IndexMap;

use crate::mapping::StringMap;
use crate::records::Post;

/// What happened to a post offered to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The post had no id and was dropped
    NotAdded,
    /// First time this id was seen; the post was appended
    Appended,
    /// The id was already present; gaps in the existing record were filled
    Merged,
}

/// An insertion-ordered set of posts keyed by id. Never holds two posts with
/// the same id.
#[derive(Debug, Default)]
pub struct PostCollection {
    posts: IndexMap<String, Post>,
}

impl PostCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one post. A post without an id is not added; an unseen id is
    /// appended; a seen id is merged into the existing record per the
    /// fill-gap rule.
    pub fn add(&mut self, post: Post) -> AddOutcome {
        if !post.has_id() {
            tracing::debug!("dropping post without id");
            return AddOutcome::NotAdded;
        }

        let id = post.id().to_string();
        match self.posts.get_mut(&id) {
            Some(existing) => {
                existing.merge_from(&post);
                AddOutcome::Merged
            }
            None => {
                self.posts.insert(id, post);
                AddOutcome::Appended
            }
        }
    }

    /// Add many posts; returns how many were appended or merged.
    pub fn add_all(&mut self, posts: impl IntoIterator<Item = Post>) -> usize {
        let mut count = 0;
        for post in posts {
            if !matches!(self.add(post), AddOutcome::NotAdded) {
                count += 1;
            }
        }
        count
    }

    pub fn find(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    /// Export every post, in insertion order.
    pub fn export_all(&self) -> Vec<StringMap> {
        self.posts.values().map(Post::export).collect()
    }

    /// Multi-line dump for verbose diagnostics.
    pub fn debug_summary(&self) -> String {
        if self.posts.is_empty() {
            return "no posts".to_string();
        }

        self.posts
            .values()
            .map(|post| format!("  {}", post.debug_summary()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
