// Rendering of forum views.
// A render tree is derived from the cache on every call and never stored; the presentation
// layer turns it into markup and owns its own event wiring.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

use std::cmp::Reverse;
use std::collections::HashSet;

use rakorean_util::format_time_ago;

use crate::cache::PostCache;
use crate::identity::Identity;
use crate::model::{Category, Comment, Post, PostId, Tag};

/// Number of trending posts on the home view.
pub const HOME_POST_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Category(Category),
    PostDetail(PostId),
}

/// Everything a render reads. Identical contexts give identical trees.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub cache: &'a PostCache,
    /// Posts the principal has liked
    pub liked: &'a HashSet<PostId>,
    pub identity: &'a Identity,
    /// Reference point of relative times
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderTree {
    Home(HomeView),
    Feed(FeedView),
    PostDetail(PostDetailView),
    PostNotFound { viewer: ViewerView, post_id: PostId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerView {
    pub signed_in: bool,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeView {
    pub viewer: ViewerView,
    pub trending: Vec<PostCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedView {
    pub viewer: ViewerView,
    pub category: Category,
    pub title: String,
    pub posts: Vec<PostCard>,
    /// Whether the "new post" affordance is offered
    pub can_create: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub post_id: PostId,
    pub tag: Tag,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub likes: u32,
    pub liked: bool,
    pub comment_count: usize,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetailView {
    pub viewer: ViewerView,
    pub post_id: PostId,
    pub tag: Tag,
    /// Section the "back" link leads to
    pub category: Option<Category>,
    pub title: String,
    pub content: String,
    pub author: String,
    pub age: String,
    pub likes: u32,
    pub liked: bool,
    pub comments: Vec<CommentView>,
    /// Whether the comment box is offered
    pub can_comment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub author: String,
    pub content: String,
    pub age: String,
}

pub fn render(view: &View, ctx: &RenderContext) -> RenderTree {
    match view {
        View::Home => RenderTree::Home(render_home(ctx)),
        View::Category(category) => RenderTree::Feed(render_feed(*category, ctx)),
        View::PostDetail(post_id) => match ctx.cache.get(post_id) {
            Some(post) => RenderTree::PostDetail(render_post_detail(post, ctx)),
            None => RenderTree::PostNotFound {
                viewer: viewer(ctx),
                post_id: post_id.clone(),
            },
        },
    }
}

fn render_home(ctx: &RenderContext) -> HomeView {
    // Stable sort, so ties keep cache order
    let trending = ctx
        .cache
        .all()
        .sorted_by_key(|post| Reverse(post.engagement()))
        .take(HOME_POST_COUNT)
        .map(|post| post_card(post, ctx))
        .collect();
    HomeView {
        viewer: viewer(ctx),
        trending,
    }
}

fn render_feed(category: Category, ctx: &RenderContext) -> FeedView {
    let posts = ctx
        .cache
        .filter_by_category(category)
        .into_iter()
        .map(|post| post_card(post, ctx))
        .collect();
    FeedView {
        viewer: viewer(ctx),
        category,
        title: format!("{} Community", category.title()),
        posts,
        can_create: ctx.identity.is_authenticated(),
    }
}

fn render_post_detail(post: &Post, ctx: &RenderContext) -> PostDetailView {
    PostDetailView {
        viewer: viewer(ctx),
        post_id: post.id.clone(),
        tag: post.tag,
        category: post.tag.category(),
        title: post.title.clone(),
        content: post.content.clone(),
        author: post.author.clone(),
        age: format_time_ago(post.created_at, ctx.now),
        likes: post.likes,
        liked: ctx.liked.contains(&post.id),
        comments: post.comments.iter().map(|c| comment_view(c, ctx)).collect(),
        can_comment: ctx.identity.is_authenticated(),
    }
}

fn post_card(post: &Post, ctx: &RenderContext) -> PostCard {
    PostCard {
        post_id: post.id.clone(),
        tag: post.tag,
        title: post.title.clone(),
        summary: post.summary.clone(),
        author: post.author.clone(),
        likes: post.likes,
        liked: ctx.liked.contains(&post.id),
        comment_count: post.comments.len(),
        age: format_time_ago(post.created_at, ctx.now),
    }
}

fn comment_view(comment: &Comment, ctx: &RenderContext) -> CommentView {
    CommentView {
        author: comment.author.clone(),
        content: comment.content.clone(),
        age: format_time_ago(comment.created_at, ctx.now),
    }
}

fn viewer(ctx: &RenderContext) -> ViewerView {
    ViewerView {
        signed_in: ctx.identity.is_authenticated(),
        display_name: ctx.identity.display_name().map(str::to_string),
    }
}
