//! Data rendered by the client portal.

use serde::Serialize;

use crate::domain::landing::{
    BillingInvoiceSummary, BillingLookup, Bootstrap, LookupSubscription, OfferSummary,
    SubmitResponse, SubscriptionsLookup,
};
use crate::domain::wizard::PortalWizard;

#[derive(Debug, Serialize)]
pub struct PortalPageData {
    /// Resolved landing API base, shown in the header.
    pub api_base: String,
    pub wizard: PortalWizard,
    pub catalog: Bootstrap,
    /// Catalog entries of the service picked in the new-subscription flow.
    pub offers: Vec<OfferSummary>,
    pub selected_offer: Option<OfferSummary>,
    pub preview_identifier: Option<String>,
    pub plan: Option<PlanView>,
    pub billing: Option<BillingView>,
    pub result: Option<ResultView>,
}

/// Subscriptions of a verified client and the current plan-change selection.
#[derive(Debug, Serialize)]
pub struct PlanView {
    pub lookup: SubscriptionsLookup,
    pub source: Option<LookupSubscription>,
    pub target: Option<OfferSummary>,
}

#[derive(Debug, Serialize)]
pub struct BillingView {
    pub lookup: BillingLookup,
    pub invoices: Vec<InvoiceLink>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceLink {
    pub invoice: BillingInvoiceSummary,
    pub download_url: Option<String>,
}

/// Outcome of a finished flow with its absolute contract PDF link.
#[derive(Debug, Serialize)]
pub struct ResultView {
    pub response: SubmitResponse,
    pub download_url: Option<String>,
}
