use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{Category, Comment, Post, PostId, Tag};

/// In-memory mirror of the remote posts. The only place rendering reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostCache {
    /// Display order, newest first after a full load
    order: Vec<PostId>,
    /// post_id -> Post
    posts: HashMap<PostId, Post>,
}

impl PostCache {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            posts: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, post_id: &str) -> Option<&Post> {
        self.posts.get(post_id)
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.posts.contains_key(post_id)
    }

    /// Posts in load order.
    pub fn all(&self) -> impl Iterator<Item = &Post> + '_ {
        self.order.iter().filter_map(|id| self.posts.get(id))
    }

    /// Replace the post with the same id in place, or append it.
    pub fn upsert(&mut self, post: Post) {
        if !self.posts.contains_key(&post.id) {
            self.order.push(post.id.clone());
        }
        self.posts.insert(post.id.clone(), post);
    }

    /// Put a post in front of all others. An existing entry with the same id is moved.
    pub fn prepend(&mut self, post: Post) {
        self.order.retain(|id| id != &post.id);
        self.order.insert(0, post.id.clone());
        self.posts.insert(post.id.clone(), post);
    }

    /// Drop everything and load `posts` in the given order.
    pub fn replace_all(&mut self, posts: impl IntoIterator<Item = Post>) {
        self.order.clear();
        self.posts.clear();
        for post in posts {
            self.upsert(post);
        }
    }

    pub fn append_comment(&mut self, post_id: &str, comment: Comment) -> Result<()> {
        self.get_mut(post_id)?.comments.push(comment);
        Ok(())
    }

    pub fn set_comments(&mut self, post_id: &str, comments: Vec<Comment>) -> Result<()> {
        self.get_mut(post_id)?.comments = comments;
        Ok(())
    }

    pub fn set_like_count(&mut self, post_id: &str, likes: u32) -> Result<()> {
        self.get_mut(post_id)?.likes = likes;
        Ok(())
    }

    pub fn filter_by_tag(&self, tag: Tag) -> Vec<&Post> {
        self.all().filter(|post| post.tag == tag).collect()
    }

    pub fn filter_by_category(&self, category: Category) -> Vec<&Post> {
        let tags = category.tags();
        self.all().filter(|post| tags.contains(&post.tag)).collect()
    }

    fn get_mut(&mut self, post_id: &str) -> Result<&mut Post> {
        self.posts
            .get_mut(post_id)
            .ok_or_else(|| Error::NotFound(post_id.to_string()))
    }
}
