// The synchronization engine.
// It is the only writer of the post cache: reads reconcile the cache against the store,
// writes hit the store first and are mirrored locally only once the store has accepted them.

use futures::future::join_all;
use itertools::Itertools;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use rakorean_util::{email_local_part, non_blank};

use crate::cache::PostCache;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::model::{Category, Comment, Post, PostId, Tag, ANONYMOUS, DEFAULT_USER};
use crate::store::*;
use crate::view::{self, RenderContext, RenderTree, View};

/// State shared between the engine and the renderer.
#[derive(Debug, Clone, Default)]
pub struct ForumState {
    pub cache: PostCache,
    /// Posts the principal has liked
    pub liked: HashSet<PostId>,
}

/// Outcome of a full reload. Posts are committed even if some dependent step failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub posts: usize,
    /// Posts whose comments could not be loaded
    pub comment_failures: Vec<PostId>,
    /// Set when the like-set could not be refreshed
    pub like_failure: Option<String>,
}

/// Whether the reload that follows a new post went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    Reloaded(LoadSummary),
    /// The reload failed; the optimistic entry stays in the cache
    Stale { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCreated {
    pub post: Post,
    pub reconciliation: Reconciliation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub post_id: PostId,
    pub liked: bool,
    pub likes: u32,
}

pub struct SyncEngine<S> {
    store: S,
    identity: Identity,
    state: RwLock<ForumState>,
    /// Serializes like toggles and like reloads so each toggle decides on committed state.
    toggles: Mutex<()>,
}

impl<S: RemoteStore> SyncEngine<S> {
    pub fn new(store: S, identity: Identity) -> Self {
        Self {
            store,
            identity,
            state: RwLock::new(ForumState::default()),
            toggles: Mutex::new(()),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read access to the cache and like-set. Holding the guard blocks commits.
    pub async fn state(&self) -> RwLockReadGuard<'_, ForumState> {
        self.state.read().await
    }

    /// Render a view from the current cache.
    pub async fn render(&self, view: &View) -> RenderTree {
        let state = self.state.read().await;
        let ctx = RenderContext {
            cache: &state.cache,
            liked: &state.liked,
            identity: &self.identity,
            now: chrono::Utc::now(),
        };
        view::render(view, &ctx)
    }

    /// Reload every post, then their comments and the principal's likes.
    /// If the posts cannot be fetched the cache is left as it was.
    pub async fn load_all(&self) -> Result<LoadSummary> {
        let mut records = self.store.posts(POST_FETCH_LIMIT).await?;
        records.sort_by_key(|r| Reverse(r.created_at));

        let names = self.resolve_names(records.iter().filter_map(|r| r.owner_id.as_deref())).await;
        let posts = records
            .into_iter()
            .map(|record| {
                let author = author_name(&names, record.owner_id.as_deref(), ANONYMOUS);
                post_from_record(record, author)
            })
            .collect::<Vec<_>>();
        let post_ids = posts.iter().map(|post| post.id.clone()).collect::<Vec<_>>();

        self.state.write().await.cache.replace_all(posts);
        tracing::info!("Loaded {} posts", post_ids.len());

        // Each comment load commits its own post, so they can run side by side
        let results = join_all(post_ids.iter().map(|post_id| self.load_comments(post_id))).await;
        let comment_failures = post_ids
            .iter()
            .zip(results)
            .filter_map(|(post_id, result)| match result {
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!("Cannot load comments of post {}: {}", post_id, err);
                    Some(post_id.clone())
                }
            })
            .collect::<Vec<_>>();

        let like_failure = match self.load_likes().await {
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("Cannot load likes: {}", err);
                Some(err.to_string())
            }
        };

        Ok(LoadSummary {
            posts: post_ids.len(),
            comment_failures,
            like_failure,
        })
    }

    /// Reload the comments of one post, oldest first. Returns the number of comments.
    pub async fn load_comments(&self, post_id: &str) -> Result<usize> {
        let mut records = self.store.comments(post_id).await?;
        records.sort_by_key(|r| r.created_at);

        let names = self.resolve_names(records.iter().filter_map(|r| r.user_id.as_deref())).await;
        let comments = records
            .into_iter()
            .map(|record| Comment {
                author: author_name(&names, record.user_id.as_deref(), ANONYMOUS),
                content: record.content,
                created_at: record.created_at,
            })
            .collect::<Vec<_>>();
        let count = comments.len();

        self.state.write().await.cache.set_comments(post_id, comments)?;
        tracing::debug!("Loaded {} comments of post {}", count, post_id);
        Ok(count)
    }

    /// Replace the like-set with the principal's likes. Returns `None` without a principal.
    pub async fn load_likes(&self) -> Result<Option<usize>> {
        let Some(user_id) = self.identity.principal_id() else {
            return Ok(None);
        };
        // A toggle must not land between the fetch and the commit
        let _toggle = self.toggles.lock().await;
        let liked = self
            .store
            .likes(user_id)
            .await?
            .into_iter()
            .map(|like| like.post_id)
            .collect::<HashSet<_>>();
        let count = liked.len();

        self.state.write().await.liked = liked;
        tracing::debug!("Loaded {} likes of user {}", count, user_id);
        Ok(Some(count))
    }

    /// Create a post, show it at the top right away, then reload everything.
    pub async fn create_post(&self, category: Category, title: &str, content: &str) -> Result<PostCreated> {
        let principal = self.identity.require("create a post")?;
        let (Some(title), Some(content)) = (non_blank(title), non_blank(content)) else {
            return Err(Error::Validation("title and content must not be empty".to_string()));
        };

        let new_post = NewPostRecord {
            owner_id: principal.id.clone(),
            category: category.slug().to_string(),
            title: title.to_string(),
            content: content.to_string(),
        };
        let record = self.store.insert_post(&new_post).await?;

        let author = self
            .resolve_one(record.owner_id.as_deref())
            .await
            .or_else(|| self.identity.display_name().map(str::to_string))
            .unwrap_or_else(|| ANONYMOUS.to_string());
        let mut post = post_from_record(record, author);
        post.likes = 0;

        self.state.write().await.cache.prepend(post.clone());
        tracing::info!("Created post {} in {}", post.id, category);

        let reconciliation = match self.load_all().await {
            Ok(summary) => Reconciliation::Reloaded(summary),
            Err(err) => {
                tracing::warn!("Cannot reload after creating post {}: {}", post.id, err);
                Reconciliation::Stale { error: err.to_string() }
            }
        };

        Ok(PostCreated { post, reconciliation })
    }

    /// Like or unlike a post. The store is updated first; nothing changes locally if it fails.
    pub async fn toggle_like(&self, post_id: &str) -> Result<LikeState> {
        let principal = self.identity.require("like a post")?;
        let _toggle = self.toggles.lock().await;

        let was_liked = {
            let state = self.state.read().await;
            if !state.cache.contains(post_id) {
                return Err(Error::NotFound(post_id.to_string()));
            }
            state.liked.contains(post_id)
        };

        let like = LikeRecord {
            post_id: post_id.to_string(),
            user_id: principal.id.clone(),
        };
        if was_liked {
            self.store.delete_like(&like).await?;
        } else {
            self.store.insert_like(&like).await?;
        }

        // Count and like-set change under one write lock
        let mut state = self.state.write().await;
        let ForumState { cache, liked } = &mut *state;
        let current = cache
            .get(post_id)
            .map(|post| post.likes)
            .ok_or_else(|| Error::NotFound(post_id.to_string()))?;
        let likes = if was_liked {
            liked.remove(post_id);
            current.saturating_sub(1)
        } else {
            liked.insert(post_id.to_string());
            current.saturating_add(1)
        };
        cache.set_like_count(post_id, likes)?;

        tracing::info!(
            "User {} {} post {} ({} likes)",
            principal.id,
            if was_liked { "unliked" } else { "liked" },
            post_id,
            likes
        );
        Ok(LikeState {
            post_id: post_id.to_string(),
            liked: !was_liked,
            likes,
        })
    }

    /// Add a comment to a cached post. No reload follows.
    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<Comment> {
        let principal = self.identity.require("comment on a post")?;
        let Some(text) = non_blank(text) else {
            return Err(Error::Validation("comment must not be empty".to_string()));
        };
        if !self.state.read().await.cache.contains(post_id) {
            return Err(Error::NotFound(post_id.to_string()));
        }

        let new_comment = NewCommentRecord {
            post_id: post_id.to_string(),
            user_id: principal.id.clone(),
            content: text.to_string(),
        };
        let record = self.store.insert_comment(&new_comment).await?;

        let author = self
            .resolve_one(record.user_id.as_deref())
            .await
            .or_else(|| self.identity.display_name().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let comment = Comment {
            author,
            content: record.content,
            created_at: record.created_at,
        };

        self.state.write().await.cache.append_comment(post_id, comment.clone())?;
        tracing::info!("User {} commented on post {}", principal.id, post_id);
        Ok(comment)
    }
}

impl<S: RemoteStore> SyncEngine<S> {
    /// Look up each distinct user once. Users without a usable name are left out.
    async fn resolve_names<'a>(&self, user_ids: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
        let user_ids = user_ids.unique().collect::<Vec<_>>();
        let names = join_all(user_ids.iter().map(|user_id| self.lookup_name(user_id))).await;
        user_ids
            .into_iter()
            .zip(names)
            .filter_map(|(user_id, name)| name.map(|name| (user_id.to_string(), name)))
            .collect()
    }

    async fn resolve_one(&self, user_id: Option<&str>) -> Option<String> {
        match user_id {
            Some(user_id) => self.lookup_name(user_id).await,
            None => None,
        }
    }

    /// A failed lookup only costs the name, never the surrounding operation.
    async fn lookup_name(&self, user_id: &str) -> Option<String> {
        match self.store.profile(user_id).await {
            Ok(Some(profile)) => profile_name(&profile),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("Cannot resolve profile {}: {}", user_id, err);
                None
            }
        }
    }
}

fn profile_name(profile: &ProfileRecord) -> Option<String> {
    profile
        .display_name
        .as_deref()
        .and_then(non_blank)
        .or_else(|| profile.email.as_deref().and_then(email_local_part))
        .map(str::to_string)
}

fn author_name(names: &HashMap<String, String>, user_id: Option<&str>, fallback: &str) -> String {
    user_id
        .and_then(|id| names.get(id))
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn post_from_record(record: PostRecord, author: String) -> Post {
    let likes = u32::try_from(record.likes_count.max(0)).unwrap_or(u32::MAX);
    Post::new(
        record.id,
        Tag::from_remote(&record.category),
        record.title,
        record.content,
        author,
        likes,
        record.created_at,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::identity::Principal;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct FakeData {
        posts: Vec<PostRecord>,
        comments: Vec<CommentRecord>,
        likes: HashSet<LikeRecord>,
        profiles: HashMap<String, ProfileRecord>,
        fail_posts: bool,
        fail_likes: bool,
        fail_like_writes: bool,
        fail_comments_of: HashSet<String>,
        fail_profiles_of: HashSet<String>,
        next_id: u32,
        /// Store call that parks once after reading, until released
        pause_in: Option<&'static str>,
    }

    #[derive(Default)]
    struct FakeStore {
        data: StdMutex<FakeData>,
        parked: Notify,
        release: Notify,
    }

    fn unavailable() -> Error {
        Error::remote("service unavailable")
    }

    impl FakeStore {
        fn with(f: impl FnOnce(&mut FakeData)) -> Self {
            let store = FakeStore::default();
            f(&mut store.data.lock().unwrap());
            store
        }

        fn update(&self, f: impl FnOnce(&mut FakeData)) {
            f(&mut self.data.lock().unwrap());
        }

        async fn pause(&self, call: &str) {
            let pause = {
                let mut data = self.data.lock().unwrap();
                let pause = data.pause_in == Some(call);
                if pause {
                    data.pause_in = None;
                }
                pause
            };
            if pause {
                self.parked.notify_one();
                self.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl RemoteStore for FakeStore {
        async fn posts(&self, limit: usize) -> Result<Vec<PostRecord>> {
            let data = self.data.lock().unwrap();
            if data.fail_posts {
                return Err(unavailable());
            }
            Ok(data.posts.iter().take(limit).cloned().collect())
        }

        async fn insert_post(&self, post: &NewPostRecord) -> Result<PostRecord> {
            let mut data = self.data.lock().unwrap();
            data.next_id += 1;
            let record = PostRecord {
                id: format!("new-{}", data.next_id),
                owner_id: Some(post.owner_id.clone()),
                category: post.category.clone(),
                title: post.title.clone(),
                content: post.content.clone(),
                likes_count: 0,
                created_at: base_time() + Duration::minutes(data.next_id as i64),
            };
            data.posts.insert(0, record.clone());
            Ok(record)
        }

        async fn comments(&self, post_id: &str) -> Result<Vec<CommentRecord>> {
            let comments = {
                let data = self.data.lock().unwrap();
                if data.fail_comments_of.contains(post_id) {
                    return Err(unavailable());
                }
                data.comments.iter().filter(|c| c.post_id == post_id).cloned().collect()
            };
            self.pause("comments").await;
            Ok(comments)
        }

        async fn insert_comment(&self, comment: &NewCommentRecord) -> Result<CommentRecord> {
            let mut data = self.data.lock().unwrap();
            data.next_id += 1;
            let record = CommentRecord {
                id: format!("comment-{}", data.next_id),
                post_id: comment.post_id.clone(),
                user_id: Some(comment.user_id.clone()),
                content: comment.content.clone(),
                created_at: base_time() + Duration::minutes(data.next_id as i64),
            };
            data.comments.push(record.clone());
            Ok(record)
        }

        async fn likes(&self, user_id: &str) -> Result<Vec<LikeRecord>> {
            let likes = {
                let data = self.data.lock().unwrap();
                if data.fail_likes {
                    return Err(unavailable());
                }
                data.likes.iter().filter(|l| l.user_id == user_id).cloned().collect()
            };
            self.pause("likes").await;
            Ok(likes)
        }

        async fn insert_like(&self, like: &LikeRecord) -> Result<()> {
            let mut data = self.data.lock().unwrap();
            if data.fail_like_writes {
                return Err(unavailable());
            }
            data.likes.insert(like.clone());
            Ok(())
        }

        async fn delete_like(&self, like: &LikeRecord) -> Result<()> {
            let mut data = self.data.lock().unwrap();
            if data.fail_like_writes {
                return Err(unavailable());
            }
            data.likes.remove(like);
            Ok(())
        }

        async fn profile(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
            let data = self.data.lock().unwrap();
            if data.fail_profiles_of.contains(user_id) {
                return Err(unavailable());
            }
            Ok(data.profiles.get(user_id).cloned())
        }
    }

    fn post_record(id: &str, owner: Option<&str>, category: &str, likes: i64, minutes_ago: i64) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            owner_id: owner.map(str::to_string),
            category: category.to_string(),
            title: format!("title of {}", id),
            content: format!("content of {}", id),
            likes_count: likes,
            created_at: base_time() - Duration::minutes(minutes_ago),
        }
    }

    fn comment_record(post_id: &str, user: &str, content: &str, minute: i64) -> CommentRecord {
        CommentRecord {
            id: format!("{}-{}", post_id, content),
            post_id: post_id.to_string(),
            user_id: Some(user.to_string()),
            content: content.to_string(),
            created_at: base_time() + Duration::minutes(minute),
        }
    }

    fn profile(id: &str, display_name: Option<&str>, email: Option<&str>) -> (String, ProfileRecord) {
        (
            id.to_string(),
            ProfileRecord {
                id: id.to_string(),
                display_name: display_name.map(str::to_string),
                email: email.map(str::to_string),
            },
        )
    }

    fn signed_in(display_name: Option<&str>) -> Identity {
        Identity::authenticated(Principal {
            id: "me".to_string(),
            display_name: display_name.map(str::to_string),
            email: None,
            access_token: "token".to_string(),
        })
    }

    fn seeded_store() -> FakeStore {
        FakeStore::with(|data| {
            data.posts = vec![
                post_record("p1", Some("sarah"), "culture", 24, 10),
                post_record("p2", Some("mike"), "grammar", 156, 20),
                post_record("p3", None, "kcontent", 3, 30),
            ];
            data.profiles.extend([
                profile("sarah", Some("Sarah J."), Some("sarah@example.com")),
                profile("mike", None, Some("mike.t@example.com")),
            ]);
            data.comments = vec![comment_record("p1", "mike", "first", 1)];
        })
    }

    async fn loaded_engine(store: FakeStore, identity: Identity) -> SyncEngine<FakeStore> {
        let engine = SyncEngine::new(store, identity);
        engine.load_all().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_load_all_populates_cache() {
        let store = seeded_store();
        store.update(|data| {
            data.likes.insert(LikeRecord {
                post_id: "p2".to_string(),
                user_id: "me".to_string(),
            });
        });
        let engine = SyncEngine::new(store, signed_in(None));

        let summary = engine.load_all().await.unwrap();
        assert_eq!(summary.posts, 3);
        assert!(summary.comment_failures.is_empty());
        assert!(summary.like_failure.is_none());

        let state = engine.state().await;
        let ids: Vec<_> = state.cache.all().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);

        let p1 = state.cache.get("p1").unwrap();
        assert_eq!(p1.author, "Sarah J.");
        assert_eq!(p1.tag, Tag::Culture);
        assert_eq!(p1.likes, 24);
        assert_eq!(p1.comments.len(), 1);
        assert_eq!(p1.comments[0].author, "mike.t");

        assert_eq!(state.cache.get("p2").unwrap().author, "mike.t");
        assert_eq!(state.cache.get("p3").unwrap().author, ANONYMOUS);
        assert_eq!(state.cache.get("p3").unwrap().tag, Tag::KPop);
        assert_eq!(state.liked, HashSet::from(["p2".to_string()]));
    }

    #[tokio::test]
    async fn test_load_all_orders_newest_first_and_truncates() {
        let store = FakeStore::with(|data| {
            let mut long = post_record("long", None, "tips", 0, 50);
            long.content = "단".repeat(130);
            data.posts = vec![long, post_record("recent", None, "tips", 0, 1)];
        });
        let engine = loaded_engine(store, Identity::anonymous()).await;

        let state = engine.state().await;
        let ids: Vec<_> = state.cache.all().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["recent", "long"]);

        let long = state.cache.get("long").unwrap();
        assert_eq!(long.summary, format!("{}...", "단".repeat(100)));
        assert_eq!(long.content.chars().count(), 130);
    }

    #[tokio::test]
    async fn test_failed_profile_lookup_falls_back_to_anonymous() {
        let store = seeded_store();
        store.update(|data| {
            data.fail_profiles_of.insert("sarah".to_string());
        });
        let engine = SyncEngine::new(store, Identity::anonymous());

        let summary = engine.load_all().await.unwrap();
        assert_eq!(summary.posts, 3);
        let state = engine.state().await;
        assert_eq!(state.cache.get("p1").unwrap().author, ANONYMOUS);
        assert_eq!(state.cache.get("p2").unwrap().author, "mike.t");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_stale_cache() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        let before = engine.state().await.cache.clone();

        engine.store().update(|data| data.fail_posts = true);
        let result = engine.load_all().await;

        assert!(matches!(result, Err(Error::RemoteFailure(_))));
        let state = engine.state().await;
        assert_eq!(state.cache.len(), 3);
        assert_eq!(state.cache, before);
    }

    #[tokio::test]
    async fn test_empty_load_renders_empty_state() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        engine.store().update(|data| data.posts.clear());

        let summary = engine.load_all().await.unwrap();
        assert_eq!(summary.posts, 0);
        assert!(engine.state().await.cache.is_empty());

        let RenderTree::Feed(feed) = engine.render(&View::Category(Category::Culture)).await else {
            panic!("expected a feed");
        };
        assert!(feed.posts.is_empty());
    }

    #[tokio::test]
    async fn test_comment_failure_is_reported_not_fatal() {
        let store = seeded_store();
        store.update(|data| {
            data.fail_comments_of.insert("p1".to_string());
        });
        let engine = SyncEngine::new(store, Identity::anonymous());

        let summary = engine.load_all().await.unwrap();
        assert_eq!(summary.posts, 3);
        assert_eq!(summary.comment_failures, vec!["p1".to_string()]);
        assert!(engine.state().await.cache.get("p1").unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_comments_are_sorted_by_creation_time() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        engine.store().update(|data| {
            data.comments = vec![
                comment_record("p2", "sarah", "C1", 1),
                comment_record("p2", "sarah", "C2", 3),
                comment_record("p2", "sarah", "C3", 2),
            ];
        });

        let count = engine.load_comments("p2").await.unwrap();
        assert_eq!(count, 3);
        let state = engine.state().await;
        let contents: Vec<_> = state.cache.get("p2").unwrap().comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["C1", "C3", "C2"]);
    }

    #[tokio::test]
    async fn test_load_comments_of_unknown_post() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        let result = engine.load_comments("gone").await;
        assert!(matches!(result, Err(Error::NotFound(id)) if id == "gone"));
    }

    #[tokio::test]
    async fn test_load_likes_without_principal_is_noop() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        assert_eq!(engine.load_likes().await.unwrap(), None);
        assert!(engine.state().await.liked.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip_never_goes_negative() {
        let store = FakeStore::with(|data| {
            data.posts = vec![post_record("p1", None, "grammar", 0, 5)];
        });
        let engine = loaded_engine(store, signed_in(None)).await;

        let liked = engine.toggle_like("p1").await.unwrap();
        assert!(liked.liked);
        assert_eq!(liked.likes, 1);

        let unliked = engine.toggle_like("p1").await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.likes, 0);

        let state = engine.state().await;
        assert_eq!(state.cache.get("p1").unwrap().likes, 0);
        assert!(state.liked.is_empty());
        assert!(engine.store().data.lock().unwrap().likes.is_empty());
    }

    #[tokio::test]
    async fn test_unlike_floors_at_zero() {
        let store = FakeStore::with(|data| {
            data.posts = vec![post_record("p1", None, "grammar", 0, 5)];
            data.likes.insert(LikeRecord {
                post_id: "p1".to_string(),
                user_id: "me".to_string(),
            });
        });
        let engine = loaded_engine(store, signed_in(None)).await;

        let state = engine.toggle_like("p1").await.unwrap();
        assert!(!state.liked);
        assert_eq!(state.likes, 0);
    }

    #[tokio::test]
    async fn test_rejected_like_leaves_cache_untouched() {
        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        engine.store().update(|data| data.fail_like_writes = true);

        let result = engine.toggle_like("p1").await;
        assert!(matches!(result, Err(Error::RemoteFailure(_))));

        let state = engine.state().await;
        assert_eq!(state.cache.get("p1").unwrap().likes, 24);
        assert!(state.liked.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_requires_principal_and_cached_post() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        assert!(matches!(engine.toggle_like("p1").await, Err(Error::AuthRequired(_))));

        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        assert!(matches!(engine.toggle_like("gone").await, Err(Error::NotFound(_))));
        assert!(engine.store().data.lock().unwrap().likes.is_empty());
    }

    #[tokio::test]
    async fn test_create_post_validation() {
        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        let before = engine.state().await.cache.clone();

        let result = engine.create_post(Category::Grammar, "", "some content").await;
        assert!(matches!(result, Err(Error::Validation(_))));
        let result = engine.create_post(Category::Grammar, "title", "   ").await;
        assert!(matches!(result, Err(Error::Validation(_))));

        assert_eq!(engine.state().await.cache, before);
        assert_eq!(engine.store().data.lock().unwrap().posts.len(), 3);
    }

    #[tokio::test]
    async fn test_create_post_requires_principal() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        let result = engine.create_post(Category::Tips, "title", "content").await;
        assert!(matches!(result, Err(Error::AuthRequired(_))));
        assert_eq!(engine.state().await.cache.len(), 3);
    }

    #[tokio::test]
    async fn test_create_post_prepends_and_reconciles() {
        let engine = loaded_engine(seeded_store(), signed_in(Some("Minji"))).await;

        let created = engine
            .create_post(Category::KContent, "  Ditto meaning?  ", "Is it Korean or English?")
            .await
            .unwrap();
        assert_eq!(created.post.id, "new-1");
        assert_eq!(created.post.title, "Ditto meaning?");
        assert_eq!(created.post.tag, Tag::KPop);
        assert_eq!(created.post.author, "Minji");
        assert_eq!(created.post.likes, 0);
        assert!(matches!(created.reconciliation, Reconciliation::Reloaded(ref s) if s.posts == 4));

        let state = engine.state().await;
        assert_eq!(state.cache.len(), 4);
        assert_eq!(state.cache.all().next().unwrap().id, "new-1");
    }

    #[tokio::test]
    async fn test_create_post_keeps_optimistic_entry_when_reload_fails() {
        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        engine.store().update(|data| data.fail_posts = true);

        let created = engine.create_post(Category::Culture, "Bowing", "What angle?").await.unwrap();
        assert!(matches!(created.reconciliation, Reconciliation::Stale { .. }));
        assert_eq!(created.post.author, ANONYMOUS);

        let state = engine.state().await;
        assert_eq!(state.cache.len(), 4);
        assert_eq!(state.cache.all().next().unwrap().id, created.post.id);
    }

    #[tokio::test]
    async fn test_add_comment() {
        let engine = loaded_engine(seeded_store(), signed_in(Some("Minji"))).await;

        let comment = engine.add_comment("p1", "  Deeper bow = more respect.  ").await.unwrap();
        assert_eq!(comment.author, "Minji");
        assert_eq!(comment.content, "Deeper bow = more respect.");

        let state = engine.state().await;
        let comments = &state.cache.get("p1").unwrap().comments;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1], comment);
    }

    #[tokio::test]
    async fn test_add_comment_author_falls_back_to_user() {
        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        let comment = engine.add_comment("p2", "hello").await.unwrap();
        assert_eq!(comment.author, DEFAULT_USER);
    }

    #[tokio::test]
    async fn test_add_comment_rejections() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        assert!(matches!(engine.add_comment("p1", "hi").await, Err(Error::AuthRequired(_))));

        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        assert!(matches!(engine.add_comment("p1", " \n ").await, Err(Error::Validation(_))));
        assert!(matches!(engine.add_comment("gone", "hi").await, Err(Error::NotFound(_))));

        assert_eq!(engine.state().await.cache.get("p1").unwrap().comments.len(), 1);
        assert_eq!(engine.store().data.lock().unwrap().comments.len(), 1);
    }

    #[tokio::test]
    async fn test_render_after_like_reflects_new_state() {
        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        engine.toggle_like("p3").await.unwrap();

        let RenderTree::PostDetail(detail) = engine.render(&View::PostDetail("p3".to_string())).await else {
            panic!("expected a post detail");
        };
        assert!(detail.liked);
        assert_eq!(detail.likes, 4);
    }

    #[tokio::test]
    async fn test_load_all_fetches_at_most_the_limit() {
        let store = FakeStore::with(|data| {
            data.posts = (0..150)
                .map(|i| post_record(&format!("p{}", i), None, "tips", 0, i))
                .collect();
        });
        let engine = loaded_engine(store, Identity::anonymous()).await;

        let state = engine.state().await;
        assert_eq!(state.cache.len(), POST_FETCH_LIMIT);
        assert_eq!(state.cache.all().next().unwrap().id, "p0");
        assert!(!state.cache.contains("p100"));
    }

    #[tokio::test]
    async fn test_like_failure_is_reported_not_fatal() {
        let store = seeded_store();
        store.update(|data| data.fail_likes = true);
        let engine = SyncEngine::new(store, signed_in(None));

        let summary = engine.load_all().await.unwrap();
        assert_eq!(summary.posts, 3);
        assert!(summary.like_failure.is_some());

        let state = engine.state().await;
        assert_eq!(state.cache.len(), 3);
        assert!(state.liked.is_empty());
    }

    #[tokio::test]
    async fn test_load_comments_of_post_dropped_during_fetch() {
        let engine = loaded_engine(seeded_store(), Identity::anonymous()).await;
        engine.store().update(|data| data.pause_in = Some("comments"));

        let (result, _) = tokio::join!(engine.load_comments("p1"), async {
            engine.store().parked.notified().await;
            engine.state.write().await.cache.replace_all(Vec::<Post>::new());
            engine.store().release.notify_one();
        });

        assert!(matches!(result, Err(Error::NotFound(id)) if id == "p1"));
        assert!(engine.state().await.cache.is_empty());
    }

    #[tokio::test]
    async fn test_loaded_authors_ignore_session_name() {
        let store = FakeStore::with(|data| {
            data.posts = vec![post_record("p1", Some("me"), "grammar", 0, 5)];
            data.comments = vec![comment_record("p1", "me", "mine", 1)];
        });
        let engine = loaded_engine(store, signed_in(Some("Minji"))).await;

        let state = engine.state().await;
        let post = state.cache.get("p1").unwrap();
        assert_eq!(post.author, ANONYMOUS);
        assert_eq!(post.comments[0].author, ANONYMOUS);
    }

    #[tokio::test]
    async fn test_like_count_saturates_at_max() {
        let store = FakeStore::with(|data| {
            data.posts = vec![post_record("p1", None, "grammar", i64::MAX, 5)];
        });
        let engine = loaded_engine(store, signed_in(None)).await;
        assert_eq!(engine.state().await.cache.get("p1").unwrap().likes, u32::MAX);

        let state = engine.toggle_like("p1").await.unwrap();
        assert!(state.liked);
        assert_eq!(state.likes, u32::MAX);
    }

    #[tokio::test]
    async fn test_toggle_waits_for_pending_like_reload() {
        let engine = loaded_engine(seeded_store(), signed_in(None)).await;
        engine.store().update(|data| data.pause_in = Some("likes"));

        let (reload, (toggle, _)) = tokio::join!(engine.load_likes(), async {
            engine.store().parked.notified().await;
            tokio::join!(engine.toggle_like("p1"), async {
                engine.store().release.notify_one();
            })
        });

        assert_eq!(reload.unwrap(), Some(0));
        let toggle = toggle.unwrap();
        assert!(toggle.liked);
        assert_eq!(toggle.likes, 25);

        let state = engine.state().await;
        assert_eq!(state.liked, HashSet::from(["p1".to_string()]));
        assert_eq!(state.cache.get("p1").unwrap().likes, 25);
    }
}
