use serde::Serialize;

/// Discriminator values stored in the `target_kind` column.
pub const TARGET_VIDEO: &str = "video";
pub const TARGET_COMMENT: &str = "comment";
pub const TARGET_TWEET: &str = "tweet";

/// Which of the two reaction tables an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// The entity a like or dislike applies to. Exactly one target per row,
/// enforced here at the type level and persisted as a (kind, id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Video(i32),
    Comment(i32),
    Tweet(i32),
}

impl ReactionTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            ReactionTarget::Video(_) => TARGET_VIDEO,
            ReactionTarget::Comment(_) => TARGET_COMMENT,
            ReactionTarget::Tweet(_) => TARGET_TWEET,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            ReactionTarget::Video(id)
            | ReactionTarget::Comment(id)
            | ReactionTarget::Tweet(id) => *id,
        }
    }
}

/// Read-time reaction facts for one target, always recomputed from the
/// likes/dislikes tables.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub likes_count: i64,
    pub is_liked: bool,
    pub dislikes_count: i64,
    pub is_disliked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_maps_to_kind_and_id() {
        assert_eq!(ReactionTarget::Video(7).kind(), "video");
        assert_eq!(ReactionTarget::Comment(9).kind(), "comment");
        assert_eq!(ReactionTarget::Tweet(3).kind(), "tweet");
        assert_eq!(ReactionTarget::Video(7).id(), 7);
        assert_eq!(ReactionTarget::Tweet(3).id(), 3);
    }
}
