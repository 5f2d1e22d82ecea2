//! Self-service portal endpoints over HTTP.

use async_trait::async_trait;

use crate::api::client::{ApiClient, ApiRequest};
use crate::api::{ApiResult, LandingApi};
use crate::domain::landing::{
    BillingLookup, Bootstrap, CinVerification, DocumentLink, DocumentLinkRequest,
    NewSubscriptionRequest, PlanChangeRequest, SubmitResponse, SubscriptionsLookup,
    VerifyCinRequest,
};
use crate::domain::types::{Cin, ContractId, IdempotencyKey, LookupToken};

#[async_trait]
impl LandingApi for ApiClient {
    async fn bootstrap(&self) -> ApiResult<Bootstrap> {
        self.send(ApiRequest::get(["landing", "bootstrap"])).await
    }

    async fn verify_cin(&self, cin: &Cin) -> ApiResult<CinVerification> {
        let request = ApiRequest::post(["landing", "clients", "verify-cin"])
            .json(&VerifyCinRequest { cin: cin.clone() })?;
        self.send(request).await
    }

    async fn lookup_subscriptions(
        &self,
        cin: &Cin,
        token: &LookupToken,
    ) -> ApiResult<SubscriptionsLookup> {
        let request = ApiRequest::get(["landing", "clients", cin.as_str(), "subscriptions"])
            .query("lookup_token", token.as_str());
        self.send(request).await
    }

    async fn lookup_invoices(&self, cin: &Cin, token: &LookupToken) -> ApiResult<BillingLookup> {
        let request = ApiRequest::get(["landing", "clients", cin.as_str(), "invoices"])
            .query("lookup_token", token.as_str());
        self.send(request).await
    }

    async fn submit_new_subscription(
        &self,
        request: &NewSubscriptionRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<SubmitResponse> {
        let request = ApiRequest::post(["landing", "submit", "new"])
            .json(request)?
            .idempotency_key(key);
        self.send(request).await
    }

    async fn submit_plan_change(
        &self,
        request: &PlanChangeRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<SubmitResponse> {
        let request = ApiRequest::post(["landing", "submit", "plan-change"])
            .json(request)?
            .idempotency_key(key);
        self.send(request).await
    }

    async fn document_link(&self, contract_id: &ContractId, cin: &str) -> ApiResult<DocumentLink> {
        let request = ApiRequest::post([
            "landing",
            "contracts",
            contract_id.as_str(),
            "document-link",
        ])
        .json(&DocumentLinkRequest {
            cin: cin.to_string(),
        })?;
        self.send(request).await
    }

    fn base_url(&self) -> String {
        ApiClient::base_url(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::client::Actor;

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Actor::new("frontend-operator", "user")).unwrap()
    }

    #[tokio::test]
    async fn verification_uses_the_dedicated_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/landing/clients/verify-cin"))
            .and(body_json(json!({"cin": "AB123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cin": "AB123456",
                "masked_contact": "j***@example.com",
                "lookup_token": "tok-1",
                "expires_at": "2026-01-01T00:10:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let verification = client(&server)
            .verify_cin(&Cin::new(" ab123456 ").unwrap())
            .await
            .unwrap();
        assert_eq!(verification.masked_contact, "j***@example.com");
        assert_eq!(verification.lookup_token.as_str(), "tok-1");
    }

    #[tokio::test]
    async fn lookups_carry_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/landing/clients/AB123456/invoices"))
            .and(query_param("lookup_token", "tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "client": {"cin": "AB123456", "full_name": "Jane Doe",
                           "email": null, "phone": null, "address": null},
                "invoices": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lookup = client(&server)
            .lookup_invoices(
                &Cin::new("AB123456").unwrap(),
                &LookupToken::new("tok-1").unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(lookup.client.full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn document_link_posts_the_cin() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/landing/contracts/ct-1/document-link"))
            .and(body_json(json!({"cin": "AB123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contract_id": "ct-1",
                "document_download_url": "/api/v1/landing/documents/ct-1?token=x"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server);
        let link = api
            .document_link(&ContractId::new("ct-1").unwrap(), "AB123456")
            .await
            .unwrap();
        assert_eq!(link.contract_id.as_str(), "ct-1");
        assert_eq!(LandingApi::base_url(&api), server.uri());
    }
}
