//! Mock backend for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::api::{
    ApiResult, BillingApi, CollectionsApi, ContractApi, CustomerApi, LandingApi, ListEnvelope,
    OfferApi,
};
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

mock! {
    pub Backend {}

    #[async_trait]
    impl CustomerApi for Backend {
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
    impl OfferApi for Backend {
        async fn list_offers(&self) -> ApiResult<ListEnvelope<Offer>>;
        async fn create_offer(&self, payload: &OfferPayload) -> ApiResult<Offer>;
        async fn update_offer(&self, offer_id: &OfferId, payload: &OfferPayload) -> ApiResult<Offer>;
        async fn update_offer_status(&self, offer_id: &OfferId, status: OfferStatus) -> ApiResult<Offer>;
        async fn delete_offer(&self, offer_id: &OfferId) -> ApiResult<()>;
    }

    #[async_trait]
    impl ContractApi for Backend {
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
    impl BillingApi for Backend {
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
    impl CollectionsApi for Backend {
        async fn collections_overview(&self) -> ApiResult<CollectionsOverview>;
        async fn list_cases(&self, filter: &CaseFilter) -> ApiResult<ListEnvelope<CollectionCase>>;
        async fn list_case_actions(&self, case_id: &CaseId) -> ApiResult<Vec<CaseAction>>;
        async fn add_case_action(&self, case_id: &CaseId, action: &NewCaseAction) -> ApiResult<CaseAction>;
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

    #[async_trait]
    impl LandingApi for Backend {
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
        fn base_url(&self) -> String;
    }
}
