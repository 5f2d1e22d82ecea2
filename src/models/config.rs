//! Configuration model loaded from external sources.

use serde::Deserialize;

use crate::api::client::Actor;
use crate::api::resolver::{DEFAULT_FALLBACK_URLS, candidate_urls};

fn default_fallback_urls() -> Vec<String> {
    DEFAULT_FALLBACK_URLS.iter().map(ToString::to_string).collect()
}

fn default_actor_id() -> String {
    "frontend-operator".to_string()
}

fn default_actor_roles() -> String {
    "admin,billing,user".to_string()
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub templates_dir: String,
    pub secret: String,
    /// Preferred backend base URL, probed before the fallbacks.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_fallback_urls")]
    pub api_fallback_urls: Vec<String>,
    #[serde(default = "default_actor_id")]
    pub actor_id: String,
    #[serde(default = "default_actor_roles")]
    pub actor_roles: String,
}

impl ServerConfig {
    /// Backend base URLs in probing order.
    pub fn api_candidates(&self) -> Vec<String> {
        candidate_urls(self.api_base_url.as_deref(), &self.api_fallback_urls)
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.actor_id.as_str(), self.actor_roles.as_str())
    }
}
