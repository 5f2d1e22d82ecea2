//! Data rendered by the operator console tabs.

use serde::Serialize;

use crate::domain::billing::{Invoice, InvoiceDetail};
use crate::domain::client::{Client, Subscriber};
use crate::domain::collections::{CaseAction, CollectionCase, CollectionsOverview};
use crate::domain::contract::Contract;
use crate::domain::offer::Offer;
use crate::domain::provisioning::ProvisioningMode;
use crate::domain::types::{CaseId, ClientId, InvoiceId};
use crate::forms::billing::{BillingRunForm, InvoiceFilterForm};
use crate::forms::collections::{CaseActionForm, CaseFilterForm, PaymentForm};
use crate::forms::contracts::ProvisionForm;
use crate::forms::offers::OfferForm;

/// Offer with the labels shown in selects and tables.
#[derive(Clone, Debug, Serialize)]
pub struct OfferRow {
    pub offer: Offer,
    pub label: String,
    pub components: String,
}

impl From<Offer> for OfferRow {
    fn from(offer: Offer) -> Self {
        Self {
            label: offer.label(),
            components: offer.components_summary(),
            offer,
        }
    }
}

/// Contract with the names of the records it points at.
#[derive(Clone, Debug, Serialize)]
pub struct ContractRow {
    pub contract: Contract,
    pub client_name: String,
    pub offer_label: String,
}

impl ContractRow {
    pub fn new(contract: Contract, clients: &[Client], offers: &[Offer]) -> Self {
        let client_name = clients
            .iter()
            .find(|client| client.id == contract.client_id)
            .map(|client| client.full_name.clone())
            .unwrap_or_else(|| contract.client_id.to_string());
        let offer_label = offers
            .iter()
            .find(|offer| offer.id == contract.offer_id)
            .map(Offer::label)
            .unwrap_or_else(|| contract.offer_id.to_string());
        Self {
            contract,
            client_name,
            offer_label,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContractsPageData {
    pub clients: Vec<Client>,
    pub offers: Vec<OfferRow>,
    pub contracts: Vec<ContractRow>,
    /// Draft with its target contract reconciled against `candidates`.
    pub draft: ProvisionForm,
    pub candidates: Vec<ContractRow>,
    pub mode: ProvisioningMode,
    pub mode_label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClientsPageData {
    pub clients: Vec<Client>,
    pub selected_client_id: Option<ClientId>,
    pub subscribers: Vec<Subscriber>,
}

#[derive(Debug, Serialize)]
pub struct OffersPageData {
    pub offers: Vec<OfferRow>,
    pub form: OfferForm,
    pub editing: bool,
    /// Live summary of the components currently entered in the form.
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct InvoicesPageData {
    pub invoices: Vec<Invoice>,
    pub clients: Vec<Client>,
    /// Offers selectable for the chosen service filter.
    pub offers: Vec<OfferRow>,
    pub filters: InvoiceFilterForm,
    pub selected_invoice_id: Option<InvoiceId>,
    pub selected: Option<InvoiceDetail>,
    pub billing_form: BillingRunForm,
}

#[derive(Debug, Serialize)]
pub struct CollectionsPageData {
    pub overview: CollectionsOverview,
    pub cases: Vec<CollectionCase>,
    pub clients: Vec<Client>,
    pub filters: CaseFilterForm,
    pub selected_case_id: Option<CaseId>,
    pub selected_case: Option<CollectionCase>,
    pub actions: Vec<CaseAction>,
    pub payment_form: PaymentForm,
    pub action_form: CaseActionForm,
}
