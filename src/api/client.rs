//! HTTP execution shared by every backend call.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::envelope::error_message;
use crate::api::{ApiError, ApiResult};
use crate::domain::types::IdempotencyKey;

pub const ACTOR_ID_HEADER: &str = "X-Actor-Id";
pub const ACTOR_ROLES_HEADER: &str = "X-Actor-Roles";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Path prefix of every versioned endpoint.
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Identity attached to every backend call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub roles: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, roles: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into(),
        }
    }

    pub(crate) fn headers(&self) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACTOR_ID_HEADER,
            HeaderValue::from_str(&self.id)
                .map_err(|e| ApiError::Config(format!("invalid actor id header: {e}")))?,
        );
        headers.insert(
            ACTOR_ROLES_HEADER,
            HeaderValue::from_str(&self.roles)
                .map_err(|e| ApiError::Config(format!("invalid actor roles header: {e}")))?,
        );
        Ok(headers)
    }
}

/// One call against the versioned API, built before it is sent.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
    idempotency_key: Option<IdempotencyKey>,
}

impl ApiRequest {
    /// `segments` are appended to `/api/v1` and percent-encoded individually.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            method,
            segments: segments
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
            query: Vec::new(),
            body: None,
            idempotency_key: None,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::POST, segments)
    }

    pub fn put<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::PUT, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Method::DELETE, segments)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds the pair only when `value` is present.
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// First page of 100 items, the page size list screens use.
    pub fn first_page(self) -> Self {
        self.query("page", 1).query("size", 100)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn idempotency_key(mut self, key: &IdempotencyKey) -> Self {
        self.idempotency_key = Some(key.clone());
        self
    }

    fn url(&self, base: &Url) -> ApiResult<Url> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Config(base.to_string()))?;
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(&self.segments);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    fn sends_json(&self) -> bool {
        self.body.is_some() && matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }
}

/// Backend client bound to one resolved base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    actor: Actor,
}

impl ApiClient {
    pub fn new(base_url: &str, actor: Actor) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Self::with_http(http, base_url, actor)
    }

    /// Reuses an existing connection pool.
    pub fn with_http(http: reqwest::Client, base_url: &str, actor: Actor) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::Config(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url,
            actor,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }

    /// Sends the request and returns the raw body of a 2xx response.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<(StatusCode, Vec<u8>)> {
        let url = request.url(&self.base_url)?;
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(self.actor.headers()?);

        if let Some(key) = &request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key.as_str());
        }
        if request.sends_json() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            log::debug!("{} {:?} failed: {message}", request.method, request.segments);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok((status, body))
    }

    /// Sends the request and decodes the JSON body; 204 and empty bodies decode from `null`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let (status, body) = self.execute(request).await?;
        if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Actor::new("frontend-operator", "admin,billing,user")).unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[tokio::test]
    async fn get_carries_actor_headers_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/customers"))
            .and(query_param("page", "1"))
            .and(query_param("size", "100"))
            .and(header("X-Actor-Id", "frontend-operator"))
            .and(header("X-Actor-Roles", "admin,billing,user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let named: Named = client(&server)
            .send(ApiRequest::get(["customers"]).first_page())
            .await
            .unwrap();
        assert_eq!(named.name, "ok");
    }

    #[tokio::test]
    async fn get_without_body_has_no_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("content-type") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({"name": "up"}))
                }
            })
            .mount(&server)
            .await;

        let named: Named = client(&server).send(ApiRequest::get(["health"])).await.unwrap();
        assert_eq!(named.name, "up");
    }

    #[tokio::test]
    async fn post_sends_json_and_idempotency_key() {
        let server = MockServer::start().await;
        let key = IdempotencyKey::generate("payment");
        Mock::given(method("POST"))
            .and(path("/api/v1/collections/payments"))
            .and(header("content-type", "application/json"))
            .and(header("Idempotency-Key", key.as_str()))
            .and(body_json(json!({"name": "pay"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "done"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::post(["collections", "payments"])
            .json(&json!({"name": "pay"}))
            .unwrap()
            .idempotency_key(&key);
        let named: Named = client(&server).send(request).await.unwrap();
        assert_eq!(named.name, "done");
    }

    #[tokio::test]
    async fn segments_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/landing/clients/AB%2F12/subscriptions"))
            .and(query_param("lookup_token", "a b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get(["landing", "clients", "AB/12", "subscriptions"])
            .query("lookup_token", "a b");
        let named: Named = client(&server).send(request).await.unwrap();
        assert_eq!(named.name, "x");
    }

    #[tokio::test]
    async fn no_content_decodes_into_unit_and_option() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/offers/o-1"))
            .and(header_exists("X-Actor-Id"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/offers/o-2"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let api = client(&server);
        let unit: () = api.send(ApiRequest::delete(["offers", "o-1"])).await.unwrap();
        assert_eq!(unit, ());
        let empty: Option<Named> = api
            .send(ApiRequest::put(["offers", "o-2"]).json(&json!({})).unwrap())
            .await
            .unwrap();
        assert_eq!(empty, None);
    }

    #[tokio::test]
    async fn error_envelope_becomes_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/offers"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": {
                "code": "validation_error",
                "message": "Invalid offer",
                "details": {"errors": [{"loc": ["body", "monthly_fee"], "msg": "must be > 0"}]}
            }})))
            .mount(&server)
            .await;

        let err = client(&server)
            .send::<Named>(ApiRequest::post(["offers"]).json(&json!({})).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), "Invalid offer: monthly_fee - must be > 0");
    }

    #[tokio::test]
    async fn base_path_of_configured_url_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/billing/api/v1/offers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "nested"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&format!("{}/billing/", server.uri()), Actor::new("a", "b")).unwrap();
        let named: Named = api.send(ApiRequest::get(["offers"])).await.unwrap();
        assert_eq!(named.name, "nested");
        assert_eq!(api.base_url(), format!("{}/billing", server.uri()));
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = ApiClient::new("not a url", Actor::new("a", "b")).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
