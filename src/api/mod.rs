//! Typed access to the billing backend REST surface.
//!
//! Services depend on the traits below; [`client::ApiClient`] implements them
//! over HTTP and `mock::MockBackend` stands in for it in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::{
    BillingRunRequest, BillingRunResult, Invoice, InvoiceDetail, InvoiceFilter,
};
use crate::domain::client::{Client, ClientStatus, Subscriber};
use crate::domain::collections::{
    ApprovePaid, CaseAction, CaseFilter, CaseStatus, CollectionCase, CollectionsOverview,
    NewCaseAction, NewPayment, PaymentAllocationResult,
};
use crate::domain::contract::{
    Contract, ContractProvisionResult, ContractStatus, ProvisionRequest,
};
use crate::domain::landing::{
    BillingLookup, Bootstrap, CinVerification, DocumentLink, NewSubscriptionRequest,
    PlanChangeRequest, SubmitResponse, SubscriptionsLookup,
};
use crate::domain::offer::{Offer, OfferPayload, OfferStatus};
use crate::domain::types::{
    CaseId, Cin, ClientId, ContractId, IdempotencyKey, InvoiceId, LookupToken, OfferId,
};

pub mod client;
pub mod console;
pub mod envelope;
pub mod landing;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod resolver;

pub use envelope::ListEnvelope;

/// Failures of a backend call. Every variant renders as a banner-ready message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response, message built from the backend error envelope.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Could not reach backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Could not connect to backend. Tried: {}", .0.join(", "))]
    Unreachable(Vec<String>),
    #[error("Unexpected response from backend: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid backend URL: {0}")]
    Config(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait CustomerApi: Send + Sync {
    async fn list_customers(&self) -> ApiResult<ListEnvelope<Client>>;
    async fn list_subscribers(&self, client_id: &ClientId) -> ApiResult<ListEnvelope<Subscriber>>;
    async fn update_customer_status(
        &self,
        client_id: &ClientId,
        status: ClientStatus,
    ) -> ApiResult<Client>;
    async fn delete_customer(&self, client_id: &ClientId) -> ApiResult<()>;
}

#[async_trait]
pub trait OfferApi: Send + Sync {
    async fn list_offers(&self) -> ApiResult<ListEnvelope<Offer>>;
    async fn create_offer(&self, payload: &OfferPayload) -> ApiResult<Offer>;
    async fn update_offer(&self, offer_id: &OfferId, payload: &OfferPayload) -> ApiResult<Offer>;
    async fn update_offer_status(&self, offer_id: &OfferId, status: OfferStatus)
    -> ApiResult<Offer>;
    async fn delete_offer(&self, offer_id: &OfferId) -> ApiResult<()>;
}

#[async_trait]
pub trait ContractApi: Send + Sync {
    async fn list_contracts(&self) -> ApiResult<ListEnvelope<Contract>>;
    async fn provision_contract(
        &self,
        request: &ProvisionRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<ContractProvisionResult>;
    async fn update_contract_status(
        &self,
        contract_id: &ContractId,
        status: ContractStatus,
    ) -> ApiResult<Contract>;
}

#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn run_billing(
        &self,
        request: &BillingRunRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<BillingRunResult>;
    async fn list_invoices(&self, filter: &InvoiceFilter) -> ApiResult<ListEnvelope<Invoice>>;
    async fn get_invoice(&self, invoice_id: &InvoiceId) -> ApiResult<InvoiceDetail>;
    async fn invoice_pdf(&self, invoice_id: &InvoiceId) -> ApiResult<Vec<u8>>;
}

#[async_trait]
pub trait CollectionsApi: Send + Sync {
    async fn collections_overview(&self) -> ApiResult<CollectionsOverview>;
    async fn list_cases(&self, filter: &CaseFilter) -> ApiResult<ListEnvelope<CollectionCase>>;
    async fn list_case_actions(&self, case_id: &CaseId) -> ApiResult<Vec<CaseAction>>;
    async fn add_case_action(&self, case_id: &CaseId, action: &NewCaseAction)
    -> ApiResult<CaseAction>;
    async fn update_case_status(
        &self,
        case_id: &CaseId,
        status: CaseStatus,
    ) -> ApiResult<CollectionCase>;
    async fn record_payment(
        &self,
        payment: &NewPayment,
        key: &IdempotencyKey,
    ) -> ApiResult<PaymentAllocationResult>;
    async fn approve_invoice_paid(
        &self,
        invoice_id: &InvoiceId,
        approval: &ApprovePaid,
        key: &IdempotencyKey,
    ) -> ApiResult<PaymentAllocationResult>;
}

/// Self-service endpoints used by the client portal.
#[async_trait]
pub trait LandingApi: Send + Sync {
    async fn bootstrap(&self) -> ApiResult<Bootstrap>;
    async fn verify_cin(&self, cin: &Cin) -> ApiResult<CinVerification>;
    async fn lookup_subscriptions(
        &self,
        cin: &Cin,
        token: &LookupToken,
    ) -> ApiResult<SubscriptionsLookup>;
    async fn lookup_invoices(&self, cin: &Cin, token: &LookupToken) -> ApiResult<BillingLookup>;
    async fn submit_new_subscription(
        &self,
        request: &NewSubscriptionRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<SubmitResponse>;
    async fn submit_plan_change(
        &self,
        request: &PlanChangeRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<SubmitResponse>;
    async fn document_link(&self, contract_id: &ContractId, cin: &str) -> ApiResult<DocumentLink>;
    /// Absolute base URL tokenized document paths are resolved against.
    fn base_url(&self) -> String;
}
