mod error;
mod result;

use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};

use rakorean_util::build_params;

pub use crate::error::Error;
use crate::error::Result;
pub use crate::result::*;

const POSTS_TABLE: &str = "community_posts";
const COMMENTS_TABLE: &str = "community_comments";
const LIKES_TABLE: &str = "community_likes";
const PROFILES_TABLE: &str = "profiles";

/// Project settings of the hosted store.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, like `https://xxxxx.supabase.co`.
    pub url: String,
    /// Public anon key. Row-level security guards the tables.
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    rest_url: Url,
    client: reqwest::Client,
}

impl SupabaseClient {
    /// Create a client. With an `access_token` requests run as that user, otherwise as anon.
    pub fn new(config: &SupabaseConfig, access_token: Option<&str>) -> Result<SupabaseClient> {
        let bearer = format!("Bearer {}", access_token.unwrap_or(&config.anon_key));

        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&config.anon_key)?);
        headers.insert(header::AUTHORIZATION, header::HeaderValue::from_str(&bearer)?);

        let client = Client::builder().default_headers(headers).build()?;
        let rest_url = Url::parse(&format!("{}/rest/v1/", config.url.trim_end_matches('/')))?;

        Ok(SupabaseClient { rest_url, client })
    }

    /// Latest posts, newest first.
    pub async fn posts(&self, limit: usize) -> Result<Vec<PostResult>> {
        let params = build_params! {
            required select => "*",
            required order => "created_at.desc",
            required limit,
        };
        self.select(POSTS_TABLE, &params).await
    }

    /// Comments of a post, oldest first.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<CommentResult>> {
        let params = build_params! {
            required select => "*",
            eq post_id,
            required order => "created_at.asc",
        };
        self.select(COMMENTS_TABLE, &params).await
    }

    /// Likes the user has given.
    pub async fn likes(&self, user_id: &str) -> Result<Vec<LikeResult>> {
        let params = build_params! {
            required select => "post_id,user_id",
            eq user_id,
        };
        self.select(LIKES_TABLE, &params).await
    }

    /// Look up a single profile. `None` if no row matches.
    pub async fn profile(&self, user_id: &str) -> Result<Option<ProfileResult>> {
        let params = build_params! {
            required select => "id,display_name,email",
            eq id => user_id,
            required limit => 1,
        };
        let profiles: Vec<ProfileResult> = self.select(PROFILES_TABLE, &params).await?;
        Ok(profiles.into_iter().next())
    }

    pub async fn insert_post(&self, post: &NewPost<'_>) -> Result<PostResult> {
        self.insert(POSTS_TABLE, post).await
    }

    pub async fn insert_comment(&self, comment: &NewComment<'_>) -> Result<CommentResult> {
        self.insert(COMMENTS_TABLE, comment).await
    }

    pub async fn insert_like(&self, like: &NewLike<'_>) -> Result<()> {
        let url = self.table_url(LIKES_TABLE, &[])?;
        let request = self
            .client
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(like);
        self.execute(LIKES_TABLE, request).await?;
        Ok(())
    }

    pub async fn delete_like(&self, post_id: &str, user_id: &str) -> Result<()> {
        let params = build_params! {
            eq post_id,
            eq user_id,
        };
        let url = self.table_url(LIKES_TABLE, &params)?;
        let request = self.client.request(Method::DELETE, url);
        self.execute(LIKES_TABLE, request).await?;
        Ok(())
    }
}

impl SupabaseClient {
    fn table_url(&self, table: &str, params: &[(String, String)]) -> Result<Url> {
        let mut url = self.rest_url.join(table)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn select<R>(&self, table: &str, params: &[(String, String)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = self.table_url(table, params)?;
        let content = self.execute(table, self.client.get(url)).await?;
        serde_json::from_str(&content).map_err(|e| e.into())
    }

    async fn insert<B, R>(&self, table: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.table_url(table, &[])?;
        let request = self
            .client
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body);
        let content = self.execute(table, request).await?;
        let rows: Vec<R> = serde_json::from_str(&content)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResponse(table.to_string()))
    }

    async fn execute(&self, table: &str, request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        tracing::debug!("{} {} -> {}", table, response.url().path(), response.status());

        let status_error = response.error_for_status_ref().err();
        let content = response.text().await?;
        log(table, &content).await?;
        if let Some(status_error) = status_error {
            return Err(status_error.into());
        }
        Ok(content)
    }
}

async fn log(name: &str, content: &str) -> Result<()> {
    use std::path::PathBuf;
    use tokio::{fs::File, io::AsyncWriteExt};

    if let Ok(dir) = std::env::var("CLIENT_LOG_DIR") {
        let time = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
        let filepath = PathBuf::from(dir).join(format!("supabase_{}_{}.json", name, time));
        let mut file = File::create(filepath).await?;
        file.write_all(content.as_bytes()).await?;
    }
    Ok(())
}
