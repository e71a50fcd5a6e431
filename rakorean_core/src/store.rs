// The abstract record store behind the forum.
// The engine only ever talks to it through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::PostId;

/// Number of posts fetched by a full reload.
pub const POST_FETCH_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: PostId,
    pub owner_id: Option<String>,
    pub category: String,
    pub title: String,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: PostId,
    pub user_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LikeRecord {
    pub post_id: PostId,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPostRecord {
    pub owner_id: String,
    pub category: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommentRecord {
    pub post_id: PostId,
    pub user_id: String,
    pub content: String,
}

/// Record CRUD over the four tables the forum uses.
/// Access control is enforced by the store itself; every method may fail with `RemoteFailure`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Latest posts, newest first, at most `limit`.
    async fn posts(&self, limit: usize) -> Result<Vec<PostRecord>>;
    async fn insert_post(&self, post: &NewPostRecord) -> Result<PostRecord>;

    /// Comments of a post, oldest first.
    async fn comments(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
    async fn insert_comment(&self, comment: &NewCommentRecord) -> Result<CommentRecord>;

    /// Likes given by a user.
    async fn likes(&self, user_id: &str) -> Result<Vec<LikeRecord>>;
    async fn insert_like(&self, like: &LikeRecord) -> Result<()>;
    async fn delete_like(&self, like: &LikeRecord) -> Result<()>;

    /// Single profile lookup. `None` when no profile exists for the id.
    async fn profile(&self, user_id: &str) -> Result<Option<ProfileRecord>>;
}
