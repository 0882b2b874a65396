//! Classification of URL-like strings found in rendered post markup.
//!
//! Every anchor href on a post element is one of a small set of link kinds:
//! help-center links, shortener redirects, hashtag searches, bare profile
//! links, and the status-link family (optionally photo/repost/favorite/reply
//! flavored). Classification runs the patterns in a fixed priority order and
//! stops at the first match; a string no pattern accepts is `Invalid` and
//! carries a message embedding the offending input.

use regex::Regex;
use std::sync::OnceLock;

/// Marker substring identifying a help-center link wherever it appears.
const HELP_MARKER: &str = "help.twitter.com/using-twitter";

struct LinkPatterns {
    shortened: Regex,
    hashtag: Regex,
    bare: Regex,
    photo: Regex,
    repost: Regex,
    favorite: Regex,
    reply: Regex,
    status: Regex,
}

fn patterns() -> &'static LinkPatterns {
    static PATTERNS: OnceLock<LinkPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LinkPatterns {
        // https://t.co/AbC123
        shortened: Regex::new(r"https?://t\.co/(\w+)\??(\w+)?").unwrap(),
        // /hashtag/sometag?src=...
        hashtag: Regex::new(r"/hashtag/([a-zA-Z0-9_-]+)\?").unwrap(),
        // /handle and nothing else
        bare: Regex::new(r"^/([a-zA-Z0-9_]+)$").unwrap(),
        // handle/status/12345/photo/1
        photo: Regex::new(r"/?([a-zA-Z0-9_]+)/status/(\d+)/photo/(\d+)").unwrap(),
        // handle/status/12345/retweet...
        repost: Regex::new(r"/?([a-zA-Z0-9_]+)/status/(\d+)/retweet").unwrap(),
        // handle/status/12345/like...
        favorite: Regex::new(r"/?([a-zA-Z0-9_]+)/status/(\d+)/like").unwrap(),
        // handle/status/12345/repl...
        reply: Regex::new(r"/?([a-zA-Z0-9_]+)/status/(\d+)/repl").unwrap(),
        // handle/status/12345 with optional trailing segment
        status: Regex::new(r"/?([a-zA-Z0-9_]+)/status/(\d+)(?:/)?(.*)?").unwrap(),
    })
}

/// Sub-kind of a status link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Plain,
    Photo { index: String },
    Repost,
    Favorite,
    Reply,
}

/// One classified link. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostLink {
    /// Contains the help-center marker
    Help,
    /// Shortener redirect with its opaque code
    Shortened { code: String, extra: String },
    /// Hashtag search link
    Hashtag { tag: String },
    /// Bare profile link
    Profile { handle: String },
    /// Status link, optionally photo/repost/favorite/reply flavored
    Status {
        handle: String,
        post_id: String,
        kind: StatusKind,
        extra: String,
        /// The input string as given, trimmed
        source: String,
    },
    /// No pattern matched
    Invalid { message: String },
}

impl PostLink {
    /// Classify a trimmed URL/path string. Blank input yields `None`,
    /// distinguishable from a string that was evaluated and rejected.
    /// Patterns run in fixed priority order; the first match wins.
    pub fn classify(input: &str) -> Option<PostLink> {
        let source = input.trim();
        if source.is_empty() {
            return None;
        }

        let p = patterns();

        if source.contains(HELP_MARKER) {
            return Some(PostLink::Help);
        }

        if let Some(caps) = p.shortened.captures(source) {
            return Some(PostLink::Shortened {
                code: caps[1].to_string(),
                extra: caps.get(2).map_or(String::new(), |m| m.as_str().to_string()),
            });
        }

        if let Some(caps) = p.hashtag.captures(source) {
            return Some(PostLink::Hashtag {
                tag: caps[1].to_string(),
            });
        }

        if let Some(caps) = p.bare.captures(source) {
            return Some(PostLink::Profile {
                handle: caps[1].to_string(),
            });
        }

        if let Some(caps) = p.photo.captures(source) {
            return Some(PostLink::Status {
                handle: caps[1].to_string(),
                post_id: caps[2].to_string(),
                kind: StatusKind::Photo {
                    index: caps[3].to_string(),
                },
                extra: String::new(),
                source: source.to_string(),
            });
        }

        for (regex, kind) in [
            (&p.repost, StatusKind::Repost),
            (&p.favorite, StatusKind::Favorite),
            (&p.reply, StatusKind::Reply),
        ] {
            if let Some(caps) = regex.captures(source) {
                return Some(PostLink::Status {
                    handle: caps[1].to_string(),
                    post_id: caps[2].to_string(),
                    kind,
                    extra: String::new(),
                    source: source.to_string(),
                });
            }
        }

        if let Some(caps) = p.status.captures(source) {
            return Some(PostLink::Status {
                handle: caps[1].to_string(),
                post_id: caps[2].to_string(),
                kind: StatusKind::Plain,
                extra: caps.get(3).map_or(String::new(), |m| m.as_str().to_string()),
                source: source.to_string(),
            });
        }

        Some(PostLink::Invalid {
            message: format!("unclassifiable link: {source}"),
        })
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, PostLink::Invalid { .. })
    }

    pub fn is_status(&self) -> bool {
        matches!(self, PostLink::Status { .. })
    }

    pub fn is_photo(&self) -> bool {
        matches!(
            self,
            PostLink::Status {
                kind: StatusKind::Photo { .. },
                ..
            }
        )
    }

    /// True for repost/favorite/reply status links.
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            PostLink::Status {
                kind: StatusKind::Repost | StatusKind::Favorite | StatusKind::Reply,
                ..
            }
        )
    }

    pub fn handle(&self) -> Option<&str> {
        match self {
            PostLink::Profile { handle } | PostLink::Status { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn post_id(&self) -> Option<&str> {
        match self {
            PostLink::Status { post_id, .. } => Some(post_id),
            _ => None,
        }
    }

    /// The input string a status link was classified from.
    pub fn source(&self) -> Option<&str> {
        match self {
            PostLink::Status { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Canonical `/handle/status/id` path for any status-family link.
    pub fn status_path(&self) -> Option<String> {
        match self {
            PostLink::Status {
                handle, post_id, ..
            } => Some(format!("/{handle}/status/{post_id}")),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PostLink::Invalid { message } => Some(message),
            _ => None,
        }
    }
}
