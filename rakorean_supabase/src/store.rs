use async_trait::async_trait;

use rakorean_core::{identity::Identity, store::*, Error, Result};
use supabase_client::{NewComment, NewLike, NewPost, SupabaseClient, SupabaseConfig};

use crate::util;

/// The forum's record store, backed by the hosted Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: SupabaseClient,
}

impl SupabaseStore {
    /// Connect on behalf of the session's principal, or as anon.
    pub fn new(config: &SupabaseConfig, identity: &Identity) -> Result<Self> {
        let client = SupabaseClient::new(config, identity.access_token()).map_err(Error::remote)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn posts(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let posts = self.client.posts(limit).await.map_err(Error::remote)?;
        tracing::debug!("Fetched {} posts", posts.len());
        Ok(posts.into_iter().map(util::post_record).collect())
    }

    async fn insert_post(&self, post: &NewPostRecord) -> Result<PostRecord> {
        let new_post = NewPost {
            user_id: &post.owner_id,
            category: &post.category,
            title: &post.title,
            content: &post.content,
        };
        let result = self.client.insert_post(&new_post).await.map_err(Error::remote)?;
        Ok(util::post_record(result))
    }

    async fn comments(&self, post_id: &str) -> Result<Vec<CommentRecord>> {
        let comments = self.client.comments(post_id).await.map_err(Error::remote)?;
        Ok(comments.into_iter().map(util::comment_record).collect())
    }

    async fn insert_comment(&self, comment: &NewCommentRecord) -> Result<CommentRecord> {
        let new_comment = NewComment {
            post_id: &comment.post_id,
            user_id: &comment.user_id,
            content: &comment.content,
        };
        let result = self.client.insert_comment(&new_comment).await.map_err(Error::remote)?;
        Ok(util::comment_record(result))
    }

    async fn likes(&self, user_id: &str) -> Result<Vec<LikeRecord>> {
        let likes = self.client.likes(user_id).await.map_err(Error::remote)?;
        Ok(likes.into_iter().map(util::like_record).collect())
    }

    async fn insert_like(&self, like: &LikeRecord) -> Result<()> {
        let new_like = NewLike {
            post_id: &like.post_id,
            user_id: &like.user_id,
        };
        self.client.insert_like(&new_like).await.map_err(Error::remote)
    }

    async fn delete_like(&self, like: &LikeRecord) -> Result<()> {
        self.client
            .delete_like(&like.post_id, &like.user_id)
            .await
            .map_err(Error::remote)
    }

    async fn profile(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        let profile = self.client.profile(user_id).await.map_err(Error::remote)?;
        Ok(profile.map(util::profile_record))
    }
}
