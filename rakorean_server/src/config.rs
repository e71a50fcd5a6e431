use anyhow::Context;

use std::env;

use rakorean_core::identity::{Identity, Principal};
use supabase_client::SupabaseConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub supabase: SupabaseConfig,
    /// Session to start with, when the environment carries one
    pub identity: Identity,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let supabase = SupabaseConfig {
            url: required("SUPABASE_URL")?,
            anon_key: required("SUPABASE_ANON_KEY")?,
        };
        let address = required("SERVER_ADDRESS")?;

        let identity = match (optional("RAKOREAN_ACCESS_TOKEN"), optional("RAKOREAN_USER_ID")) {
            (Some(access_token), Some(id)) => Identity::authenticated(Principal {
                id,
                display_name: optional("RAKOREAN_DISPLAY_NAME"),
                email: optional("RAKOREAN_EMAIL"),
                access_token,
            }),
            _ => {
                tracing::info!("No session in environment, starting anonymous");
                Identity::anonymous()
            }
        };

        Ok(Self {
            address,
            supabase,
            identity,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
