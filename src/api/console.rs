//! Operator-console endpoints over HTTP.

use async_trait::async_trait;

use crate::api::client::{ApiClient, ApiRequest};
use crate::api::{
    ApiResult, BillingApi, CollectionsApi, ContractApi, CustomerApi, ListEnvelope, OfferApi,
};
use crate::domain::billing::{
    BillingRunRequest, BillingRunResult, Invoice, InvoiceDetail, InvoiceFilter,
};
use crate::domain::client::{Client, ClientStatus, ClientStatusUpdate, Subscriber};
use crate::domain::collections::{
    ApprovePaid, CaseAction, CaseFilter, CaseStatus, CaseStatusUpdate, CollectionCase,
    CollectionsOverview, NewCaseAction, NewPayment, PaymentAllocationResult,
};
use crate::domain::contract::{
    Contract, ContractProvisionResult, ContractStatus, ContractStatusUpdate, ProvisionRequest,
};
use crate::domain::offer::{Offer, OfferPayload, OfferStatus, OfferStatusUpdate};
use crate::domain::types::{CaseId, ClientId, ContractId, IdempotencyKey, InvoiceId, OfferId};

#[async_trait]
impl CustomerApi for ApiClient {
    async fn list_customers(&self) -> ApiResult<ListEnvelope<Client>> {
        self.send(ApiRequest::get(["customers"]).first_page()).await
    }

    async fn list_subscribers(&self, client_id: &ClientId) -> ApiResult<ListEnvelope<Subscriber>> {
        self.send(ApiRequest::get(["customers", client_id.as_str(), "subscribers"]).first_page())
            .await
    }

    async fn update_customer_status(
        &self,
        client_id: &ClientId,
        status: ClientStatus,
    ) -> ApiResult<Client> {
        let request = ApiRequest::put(["customers", client_id.as_str()])
            .json(&ClientStatusUpdate { status })?;
        self.send(request).await
    }

    async fn delete_customer(&self, client_id: &ClientId) -> ApiResult<()> {
        self.execute(ApiRequest::delete(["customers", client_id.as_str()]))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl OfferApi for ApiClient {
    async fn list_offers(&self) -> ApiResult<ListEnvelope<Offer>> {
        self.send(ApiRequest::get(["offers"]).first_page()).await
    }

    async fn create_offer(&self, payload: &OfferPayload) -> ApiResult<Offer> {
        self.send(ApiRequest::post(["offers"]).json(payload)?).await
    }

    async fn update_offer(&self, offer_id: &OfferId, payload: &OfferPayload) -> ApiResult<Offer> {
        self.send(ApiRequest::put(["offers", offer_id.as_str()]).json(payload)?)
            .await
    }

    async fn update_offer_status(
        &self,
        offer_id: &OfferId,
        status: OfferStatus,
    ) -> ApiResult<Offer> {
        let request =
            ApiRequest::put(["offers", offer_id.as_str()]).json(&OfferStatusUpdate { status })?;
        self.send(request).await
    }

    async fn delete_offer(&self, offer_id: &OfferId) -> ApiResult<()> {
        self.execute(ApiRequest::delete(["offers", offer_id.as_str()]))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ContractApi for ApiClient {
    async fn list_contracts(&self) -> ApiResult<ListEnvelope<Contract>> {
        self.send(ApiRequest::get(["contracts"]).first_page()).await
    }

    async fn provision_contract(
        &self,
        request: &ProvisionRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<ContractProvisionResult> {
        let request = ApiRequest::post(["contracts", "provision"])
            .json(request)?
            .idempotency_key(key);
        self.send(request).await
    }

    async fn update_contract_status(
        &self,
        contract_id: &ContractId,
        status: ContractStatus,
    ) -> ApiResult<Contract> {
        let request = ApiRequest::put(["contracts", contract_id.as_str(), "status"])
            .json(&ContractStatusUpdate { status })?;
        self.send(request).await
    }
}

#[async_trait]
impl BillingApi for ApiClient {
    async fn run_billing(
        &self,
        request: &BillingRunRequest,
        key: &IdempotencyKey,
    ) -> ApiResult<BillingRunResult> {
        let request = ApiRequest::post(["billing", "runs"])
            .json(request)?
            .idempotency_key(key);
        self.send(request).await
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> ApiResult<ListEnvelope<Invoice>> {
        let request = ApiRequest::get(["invoices"])
            .first_page()
            .query_opt("client_id", filter.client_id.as_ref())
            .query_opt("service", filter.service.map(|s| s.as_str()))
            .query_opt("offer_id", filter.offer_id.as_ref());
        self.send(request).await
    }

    async fn get_invoice(&self, invoice_id: &InvoiceId) -> ApiResult<InvoiceDetail> {
        self.send(ApiRequest::get(["invoices", invoice_id.as_str()]))
            .await
    }

    async fn invoice_pdf(&self, invoice_id: &InvoiceId) -> ApiResult<Vec<u8>> {
        let (_, bytes) = self
            .execute(ApiRequest::get(["invoices", invoice_id.as_str(), "pdf"]))
            .await?;
        Ok(bytes)
    }
}

#[async_trait]
impl CollectionsApi for ApiClient {
    async fn collections_overview(&self) -> ApiResult<CollectionsOverview> {
        self.send(ApiRequest::get(["collections", "overview"])).await
    }

    async fn list_cases(&self, filter: &CaseFilter) -> ApiResult<ListEnvelope<CollectionCase>> {
        let request = ApiRequest::get(["collections", "cases"])
            .first_page()
            .query_opt("status", filter.status.map(|s| s.as_str()))
            .query_opt("aging_bucket", filter.aging_bucket.map(|b| b.as_str()))
            .query_opt("client_id", filter.client_id.as_ref());
        self.send(request).await
    }

    async fn list_case_actions(&self, case_id: &CaseId) -> ApiResult<Vec<CaseAction>> {
        self.send(ApiRequest::get([
            "collections",
            "cases",
            case_id.as_str(),
            "actions",
        ]))
        .await
    }

    async fn add_case_action(
        &self,
        case_id: &CaseId,
        action: &NewCaseAction,
    ) -> ApiResult<CaseAction> {
        let request =
            ApiRequest::post(["collections", "cases", case_id.as_str(), "actions"]).json(action)?;
        self.send(request).await
    }

    async fn update_case_status(
        &self,
        case_id: &CaseId,
        status: CaseStatus,
    ) -> ApiResult<CollectionCase> {
        let request = ApiRequest::put(["collections", "cases", case_id.as_str(), "status"])
            .json(&CaseStatusUpdate { status })?;
        self.send(request).await
    }

    async fn record_payment(
        &self,
        payment: &NewPayment,
        key: &IdempotencyKey,
    ) -> ApiResult<PaymentAllocationResult> {
        let request = ApiRequest::post(["collections", "payments"])
            .json(payment)?
            .idempotency_key(key);
        self.send(request).await
    }

    async fn approve_invoice_paid(
        &self,
        invoice_id: &InvoiceId,
        approval: &ApprovePaid,
        key: &IdempotencyKey,
    ) -> ApiResult<PaymentAllocationResult> {
        let request = ApiRequest::post([
            "collections",
            "invoices",
            invoice_id.as_str(),
            "approve-paid",
        ])
        .json(approval)?
        .idempotency_key(key);
        self.send(request).await
    }
}
