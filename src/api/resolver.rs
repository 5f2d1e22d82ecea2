//! Discovery of a live backend among candidate base URLs.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use crate::api::client::{Actor, ApiClient};
use crate::api::{ApiError, ApiResult};

/// Base URLs probed after the configured one.
pub const DEFAULT_FALLBACK_URLS: [&str; 4] = [
    "http://localhost:8010",
    "http://localhost:8000",
    "http://127.0.0.1:8010",
    "http://127.0.0.1:8000",
];

/// Which application needs the backend; decides the paths it must expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Console,
    Portal,
}

impl Capability {
    pub fn required_paths(&self) -> &'static [&'static str] {
        match self {
            Self::Console => &["/api/v1/customers", "/api/v1/offers", "/api/v1/contracts"],
            Self::Portal => &["/api/v1/landing/bootstrap"],
        }
    }
}

/// Configured URL first, then the fallbacks; trimmed, blanks skipped,
/// duplicates dropped keeping the first occurrence.
pub fn candidate_urls<S: AsRef<str>>(configured: Option<&str>, fallbacks: &[S]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    let all = configured
        .into_iter()
        .chain(fallbacks.iter().map(AsRef::as_ref));
    for candidate in all {
        let normalized = candidate.trim();
        if normalized.is_empty() || unique.iter().any(|u| u == normalized) {
            continue;
        }
        unique.push(normalized.to_string());
    }
    unique
}

#[derive(Deserialize)]
struct ServiceDescription {
    paths: Option<Map<String, Value>>,
}

/// Probes candidates in order and returns the first one that is healthy and
/// exposes every path the capability needs.
#[derive(Clone, Debug)]
pub struct ApiBaseResolver {
    http: reqwest::Client,
    actor: Actor,
    candidates: Vec<String>,
}

impl ApiBaseResolver {
    pub fn new(candidates: Vec<String>, actor: Actor) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            actor,
            candidates,
        })
    }

    pub async fn resolve(&self, capability: Capability) -> ApiResult<String> {
        for base in &self.candidates {
            match self.probe(base, capability).await {
                Ok(()) => {
                    log::info!("Resolved backend for {capability:?} at {base}");
                    return Ok(base.clone());
                }
                Err(reason) => log::debug!("Skipping backend candidate {base}: {reason}"),
            }
        }
        log::warn!(
            "No backend candidate answered for {capability:?}: {}",
            self.candidates.join(", ")
        );
        Err(ApiError::Unreachable(self.candidates.clone()))
    }

    async fn probe(&self, base: &str, capability: Capability) -> Result<(), String> {
        let root = base.trim_end_matches('/');

        let health = self
            .http
            .get(format!("{root}/api/v1/health"))
            .headers(self.actor.headers().map_err(|e| e.to_string())?)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !health.status().is_success() {
            return Err(format!("health check returned {}", health.status()));
        }

        let description = self
            .http
            .get(format!("{root}/openapi.json"))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !description.status().is_success() {
            return Err(format!("service description returned {}", description.status()));
        }
        let description: ServiceDescription =
            description.json().await.map_err(|e| e.to_string())?;
        let paths = description
            .paths
            .ok_or_else(|| "service description has no paths".to_string())?;

        match capability
            .required_paths()
            .iter()
            .find(|path| !paths.contains_key(**path))
        {
            Some(missing) => Err(format!("missing {missing}")),
            None => Ok(()),
        }
    }
}

/// Lazily resolved backend handles, one per application.
///
/// A successful resolution is kept for the life of the process; a failed one
/// is not, so the next request probes again.
pub struct Backend {
    resolver: ApiBaseResolver,
    console: OnceCell<ApiClient>,
    portal: OnceCell<ApiClient>,
}

impl Backend {
    pub fn new(resolver: ApiBaseResolver) -> Self {
        Self {
            resolver,
            console: OnceCell::new(),
            portal: OnceCell::new(),
        }
    }

    pub async fn console(&self) -> ApiResult<&ApiClient> {
        self.client(&self.console, Capability::Console).await
    }

    pub async fn portal(&self) -> ApiResult<&ApiClient> {
        self.client(&self.portal, Capability::Portal).await
    }

    async fn client<'a>(
        &'a self,
        cell: &'a OnceCell<ApiClient>,
        capability: Capability,
    ) -> ApiResult<&'a ApiClient> {
        cell.get_or_try_init(|| async {
            let base = self.resolver.resolve(capability).await?;
            ApiClient::new(&base, self.resolver.actor.clone())
        })
        .await
    }
}
