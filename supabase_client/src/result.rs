use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// Row of `community_posts`.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostResult {
    pub id: String,
    pub user_id: Option<String>,
    pub category: String,
    pub title: String,
    pub content: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Row of `community_comments`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentResult {
    pub id: String,
    pub post_id: String,
    pub user_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Row of `community_likes`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LikeResult {
    pub post_id: String,
    pub user_id: String,
}

/// Row of `profiles`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProfileResult {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewPost<'a> {
    pub user_id: &'a str,
    pub category: &'a str,
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewComment<'a> {
    pub post_id: &'a str,
    pub user_id: &'a str,
    pub content: &'a str,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewLike<'a> {
    pub post_id: &'a str,
    pub user_id: &'a str,
}
