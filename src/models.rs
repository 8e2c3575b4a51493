use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A post in the feed. `parent_id` is `None` for a top-level echo and set to
/// the parent echo's id for a comment; an echo's children are exactly the
/// echoes whose `parent_id` equals its id.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Echo {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub community_id: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A like on an echo. At most one per (echo, user); created and destroyed
/// only by the toggle operation.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Reaction {
    pub echo_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Community {
    pub id: String,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub bio: Option<String>,
}

/// Lightweight user projection used wherever a page renders an author or a
/// reacted-user list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CommunityProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub image: Option<String>,
}

/// A comment with its author resolved. `children` holds the next comment
/// level when the query populates one, otherwise it is empty.
#[derive(Serialize, Debug, Clone)]
pub struct CommentNode {
    pub echo: Echo,
    pub author: UserProfile,
    pub children: Vec<CommentNode>,
}

/// An echo with author, community and comments resolved, the shape a detail
/// or feed page renders in one pass.
#[derive(Serialize, Debug, Clone)]
pub struct PopulatedEcho {
    pub echo: Echo,
    pub author: UserProfile,
    pub community: Option<CommunityProfile>,
    pub children: Vec<CommentNode>,
}

/// One page of top-level echoes, newest first. `has_more` is true iff
/// strictly more top-level echoes exist beyond this page.
#[derive(Serialize, Debug, Clone)]
pub struct FeedPage {
    pub echoes: Vec<PopulatedEcho>,
    pub has_more: bool,
}

/// Whether a (echo, user) reaction exists after a toggle.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    Present,
    Absent,
}

/// Reaction data for a rendered page: the optional parent echo plus every
/// listed echo, with the per-echo vectors aligned positionally with the
/// input echo ids.
#[derive(Serialize, Debug, Clone)]
pub struct ReactionsData {
    pub parent_reacted_users: Vec<UserProfile>,
    pub parent_reacted_by_viewer: bool,
    pub reacted_users: Vec<Vec<UserProfile>>,
    pub reacted_by_viewer: Vec<bool>,
}
