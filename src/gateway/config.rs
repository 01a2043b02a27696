use anyhow::{bail, Context, Result};
use std::net::SocketAddr;

pub const DEFAULT_UPSTREAM_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_VISION_MODEL: &str = "google/gemini-2.5-pro";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_key: String,
    pub upstream_url: String,
    pub chat_model: String,
    pub vision_model: String,
    pub bind: SocketAddr,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let Some(api_key) = get("AI_GATEWAY_API_KEY") else {
            bail!("AI_GATEWAY_API_KEY is not configured");
        };

        let bind = get("GATEWAY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("Invalid GATEWAY_BIND address: {bind}"))?;

        Ok(Self {
            api_key,
            upstream_url: get("AI_GATEWAY_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            chat_model: get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            vision_model: get("VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            bind,
        })
    }
}
