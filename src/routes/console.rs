//! Operator console: one page per tab, mutations redirect back to their tab.

use actix_session::Session;
use actix_web::http::header;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::api::client::ApiClient;
use crate::api::resolver::Backend;
use crate::busy::BusyRegistry;
use crate::domain::types::{CaseId, ClientId, ContractId, InvoiceId, OfferId};
use crate::forms::billing::{BillingRunForm, InvoiceFilterForm};
use crate::forms::collections::{CaseActionForm, CaseFilterForm, CaseStatusForm, PaymentForm};
use crate::forms::contracts::{ClientStatusForm, ContractStatusForm, ProvisionForm};
use crate::forms::offers::{OfferForm, OfferStatusForm};
use crate::models::session::ConsoleSession;
use crate::routes::{
    acquire_busy, alerts, base_context, redirect, redirect_with, render_template,
};
use crate::services::{
    ServiceError, ServiceResult, clients, collections, contracts, invoices, offers,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn connected(api: &ApiClient) -> String {
    format!("Connected to backend services ({}).", api.base_url())
}

/// Renders a tab with its page data, or with the error that prevented loading it.
fn render_tab<T: Serialize>(
    tera: &Tera,
    template: &str,
    current_page: &str,
    flash_messages: &IncomingFlashMessages,
    result: ServiceResult<(T, String)>,
) -> HttpResponse {
    match result {
        Ok((page, status)) => {
            let alerts = alerts(flash_messages, Some((status, "info")));
            let mut context = base_context(&alerts, current_page);
            context.insert("page", &page);
            render_template(tera, template, &context)
        }
        Err(err) => {
            let context = base_context(&[(err.to_string(), "danger")], current_page);
            render_template(tera, template, &context)
        }
    }
}

fn flash(result: ServiceResult<String>) {
    match result {
        Ok(message) => FlashMessage::success(message).send(),
        Err(err) => FlashMessage::error(err.to_string()).send(),
    }
}

#[get("/")]
pub async fn index() -> impl Responder {
    redirect("/console/contracts")
}

#[get("/console/contracts")]
pub async fn show_contracts(
    backend: web::Data<Backend>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let draft = ConsoleSession::load(&session).provision(today());
    let result = match backend.console().await {
        Ok(api) => contracts::load_contracts_page(api, draft)
            .await
            .map(|page| (page, connected(api))),
        Err(err) => Err(err.into()),
    };
    render_tab(&tera, "console/contracts.html", "contracts", &flash_messages, result)
}

/// Stores the provisioning draft; the next render re-derives target and mode.
#[post("/console/contracts/draft")]
pub async fn save_contract_draft(
    session: Session,
    web::Form(form): web::Form<ProvisionForm>,
) -> impl Responder {
    let mut console = ConsoleSession::load(&session);
    console.set_provision(form);
    console.save(&session);
    redirect("/console/contracts")
}

#[post("/console/contracts/provision")]
pub async fn provision_contract(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(mut form): web::Form<ProvisionForm>,
) -> impl Responder {
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.console().await?;
        contracts::provision_contract(api, &mut form).await
    }
    .await;
    flash(result);

    let mut console = ConsoleSession::load(&session);
    console.set_provision(form);
    console.save(&session);
    redirect("/console/contracts")
}

#[post("/console/contracts/{contract_id}/status")]
pub async fn contract_status(
    contract_id: web::Path<String>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<ContractStatusForm>,
) -> impl Responder {
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let contract_id = ContractId::new(contract_id.into_inner())?;
        let status = form.status()?;
        let api = backend.console().await?;
        contracts::update_contract_status(api, &contract_id, status).await?;
        Ok::<_, ServiceError>("Contract status updated.".to_string())
    }
    .await;
    flash(result);
    redirect("/console/contracts")
}

#[derive(Deserialize, Serialize)]
pub struct ClientsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
}

impl ClientsQuery {
    fn selected(&self) -> Option<ClientId> {
        self.client_id.as_deref().and_then(ClientId::parse_optional)
    }
}

#[get("/console/clients")]
pub async fn show_clients(
    query: web::Query<ClientsQuery>,
    backend: web::Data<Backend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let result = match backend.console().await {
        Ok(api) => clients::load_clients_page(api, query.selected())
            .await
            .map(|page| (page, connected(api))),
        Err(err) => Err(err.into()),
    };
    render_tab(&tera, "console/clients.html", "clients", &flash_messages, result)
}

#[post("/console/clients/{client_id}/status")]
pub async fn client_status(
    client_id: web::Path<String>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<ClientStatusForm>,
) -> impl Responder {
    let client_id = client_id.into_inner();
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let id = ClientId::new(client_id.as_str())?;
        let status = form.status()?;
        let api = backend.console().await?;
        clients::update_client_status(api, &id, status).await?;
        Ok::<_, ServiceError>("Client status updated.".to_string())
    }
    .await;
    flash(result);
    redirect_with(
        "/console/clients",
        &ClientsQuery {
            client_id: Some(client_id),
        },
    )
}

#[post("/console/clients/{client_id}/delete")]
pub async fn client_delete(
    client_id: web::Path<String>,
    query: web::Query<ClientsQuery>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
) -> impl Responder {
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let id = ClientId::new(client_id.into_inner())?;
        let api = backend.console().await?;
        clients::delete_client(api, &id, query.selected()).await
    }
    .await;

    let selected = match result {
        Ok(selected) => {
            FlashMessage::success("Client deleted.").send();
            selected
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            query.selected()
        }
    };
    redirect_with(
        "/console/clients",
        &ClientsQuery {
            client_id: selected.map(|id| id.to_string()),
        },
    )
}

#[derive(Deserialize)]
pub struct OffersQuery {
    edit: Option<String>,
}

#[get("/console/offers")]
pub async fn show_offers(
    query: web::Query<OffersQuery>,
    backend: web::Data<Backend>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let draft = ConsoleSession::load(&session).offer();
    let edit = query.edit.as_deref().and_then(OfferId::parse_optional);
    let result = match backend.console().await {
        Ok(api) => offers::load_offers_page(api, draft, edit, today())
            .await
            .map(|page| (page, connected(api))),
        Err(err) => Err(err.into()),
    };
    render_tab(&tera, "console/offers.html", "offers", &flash_messages, result)
}

/// Creates or updates the offer. A rejected form stays in the session as typed.
#[post("/console/offers")]
pub async fn save_offer(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<OfferForm>,
) -> impl Responder {
    let editing = form.editing_offer_id();
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.console().await?;
        offers::save_offer(api, form.clone()).await
    }
    .await;

    let mut console = ConsoleSession::load(&session);
    match result {
        Ok(message) => {
            FlashMessage::success(message).send();
            console.set_offer(None);
            console.save(&session);
            redirect("/console/offers")
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            console.set_offer(Some(form));
            console.save(&session);
            match editing {
                Some(offer_id) => redirect(&format!("/console/offers?edit={offer_id}")),
                None => redirect("/console/offers"),
            }
        }
    }
}

#[post("/console/offers/reset")]
pub async fn reset_offer_form(session: Session) -> impl Responder {
    let mut console = ConsoleSession::load(&session);
    console.set_offer(None);
    console.save(&session);
    redirect("/console/offers")
}

#[post("/console/offers/{offer_id}/status")]
pub async fn offer_status(
    offer_id: web::Path<String>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<OfferStatusForm>,
) -> impl Responder {
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let offer_id = OfferId::new(offer_id.into_inner())?;
        let status = form.status()?;
        let api = backend.console().await?;
        offers::update_offer_status(api, &offer_id, status).await?;
        Ok::<_, ServiceError>("Offer status updated.".to_string())
    }
    .await;
    flash(result);
    redirect("/console/offers")
}

#[post("/console/offers/{offer_id}/delete")]
pub async fn offer_delete(
    offer_id: web::Path<String>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
) -> impl Responder {
    let mut console = ConsoleSession::load(&session);
    let draft = console.offer();
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let offer_id = OfferId::new(offer_id.into_inner())?;
        let api = backend.console().await?;
        offers::delete_offer(api, &offer_id, draft.as_ref()).await
    }
    .await;

    match result {
        Ok(reset) => {
            if reset {
                console.set_offer(None);
                console.save(&session);
            }
            FlashMessage::success("Offer deleted.").send();
        }
        Err(err) => FlashMessage::error(err.to_string()).send(),
    }
    redirect("/console/offers")
}

#[derive(Default, Deserialize, Serialize)]
pub struct InvoicesQuery {
    #[serde(flatten)]
    filters: InvoiceFilterForm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invoice_id: Option<String>,
}

impl InvoicesQuery {
    fn selected(&self) -> Option<InvoiceId> {
        self.invoice_id.as_deref().and_then(InvoiceId::parse_optional)
    }

    fn select(&self, invoice_id: Option<String>) -> Self {
        Self {
            filters: self.filters.clone(),
            invoice_id,
        }
    }
}

#[get("/console/invoices")]
pub async fn show_invoices(
    query: web::Query<InvoicesQuery>,
    backend: web::Data<Backend>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let query = query.into_inner();
    let selected = query.selected();
    let billing_form = ConsoleSession::load(&session).billing(today());
    let result = match backend.console().await {
        Ok(api) => invoices::load_invoices_page(api, query.filters, selected, billing_form)
            .await
            .map(|page| (page, connected(api))),
        Err(err) => Err(err.into()),
    };
    render_tab(&tera, "console/invoices.html", "invoices", &flash_messages, result)
}

#[post("/console/invoices/filters")]
pub async fn apply_invoice_filters(
    web::Form(filters): web::Form<InvoiceFilterForm>,
) -> impl Responder {
    FlashMessage::info("Invoice filters applied.").send();
    redirect_with(
        "/console/invoices",
        &InvoicesQuery {
            filters,
            invoice_id: None,
        },
    )
}

#[post("/console/invoices/filters/reset")]
pub async fn reset_invoice_filters() -> impl Responder {
    FlashMessage::info("Invoice filters reset.").send();
    redirect("/console/invoices")
}

#[post("/console/billing/runs")]
pub async fn run_billing(
    query: web::Query<InvoicesQuery>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<BillingRunForm>,
) -> impl Responder {
    let mut console = ConsoleSession::load(&session);
    console.set_billing(form.clone());
    console.save(&session);

    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.console().await?;
        invoices::run_billing(api, form).await
    }
    .await;

    let selected = match result {
        Ok((message, first)) => {
            FlashMessage::success(message).send();
            first.map(|id| id.to_string()).or(query.invoice_id.clone())
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            query.invoice_id.clone()
        }
    };
    redirect_with("/console/invoices", &query.select(selected))
}

#[get("/console/invoices/{invoice_id}/pdf")]
pub async fn invoice_pdf(
    invoice_id: web::Path<String>,
    backend: web::Data<Backend>,
) -> impl Responder {
    let invoice_id = invoice_id.into_inner();
    let result = async {
        let id = InvoiceId::new(invoice_id.as_str())?;
        let api = backend.console().await?;
        invoices::download_invoice_pdf(api, &id).await
    }
    .await;

    match result {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"invoice-{invoice_id}.pdf\""),
            ))
            .body(bytes),
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            redirect_with(
                "/console/invoices",
                &InvoicesQuery::default().select(Some(invoice_id)),
            )
        }
    }
}

#[post("/console/invoices/{invoice_id}/approve-paid")]
pub async fn approve_paid(
    invoice_id: web::Path<String>,
    query: web::Query<InvoicesQuery>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
) -> impl Responder {
    let invoice_id = invoice_id.into_inner();
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let id = InvoiceId::new(invoice_id.as_str())?;
        let api = backend.console().await?;
        let message = invoices::approve_invoice_paid(api, &id, today()).await?;
        Ok::<_, ServiceError>(message.to_string())
    }
    .await;
    flash(result);
    redirect_with("/console/invoices", &query.select(Some(invoice_id)))
}

#[derive(Default, Deserialize, Serialize)]
pub struct CollectionsQuery {
    #[serde(flatten)]
    filters: CaseFilterForm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    case_id: Option<String>,
}

impl CollectionsQuery {
    fn selected(&self) -> Option<CaseId> {
        self.case_id.as_deref().and_then(CaseId::parse_optional)
    }

    fn select(&self, case_id: Option<String>) -> Self {
        Self {
            filters: self.filters.clone(),
            case_id,
        }
    }
}

#[get("/console/collections")]
pub async fn show_collections(
    query: web::Query<CollectionsQuery>,
    backend: web::Data<Backend>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let query = query.into_inner();
    let selected = query.selected();
    let console = ConsoleSession::load(&session);
    let payment_form = console.payment(today());
    let action_form = console.action();
    let result = match backend.console().await {
        Ok(api) => collections::load_collections_page(
            api,
            query.filters,
            selected,
            payment_form,
            action_form,
        )
        .await
        .map(|page| (page, connected(api))),
        Err(err) => Err(err.into()),
    };
    render_tab(&tera, "console/collections.html", "collections", &flash_messages, result)
}

#[post("/console/collections/payments")]
pub async fn record_payment(
    query: web::Query<CollectionsQuery>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(mut form): web::Form<PaymentForm>,
) -> impl Responder {
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.console().await?;
        collections::record_payment(api, &mut form, &query.filters).await
    }
    .await;

    let mut console = ConsoleSession::load(&session);
    console.set_payment(form);
    console.save(&session);

    let selected = match result {
        Ok((message, case_id)) => {
            FlashMessage::success(message).send();
            case_id.map(|id| id.to_string()).or(query.case_id.clone())
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            query.case_id.clone()
        }
    };
    redirect_with("/console/collections", &query.select(selected))
}

#[post("/console/collections/cases/{case_id}/status")]
pub async fn case_status(
    case_id: web::Path<String>,
    query: web::Query<CollectionsQuery>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<CaseStatusForm>,
) -> impl Responder {
    let case_id = case_id.into_inner();
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let id = CaseId::new(case_id.as_str())?;
        let status = form.status()?;
        let api = backend.console().await?;
        collections::update_case_status(api, &id, status).await?;
        Ok::<_, ServiceError>("Collection case status updated.".to_string())
    }
    .await;
    flash(result);
    redirect_with("/console/collections", &query.select(Some(case_id)))
}

#[post("/console/collections/cases/{case_id}/actions")]
pub async fn case_action(
    case_id: web::Path<String>,
    query: web::Query<CollectionsQuery>,
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(mut form): web::Form<CaseActionForm>,
) -> impl Responder {
    let case_id = case_id.into_inner();
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let id = CaseId::parse_optional(&case_id);
        let api = backend.console().await?;
        collections::add_case_action(api, id.as_ref(), &mut form).await?;
        Ok::<_, ServiceError>("Collection action added.".to_string())
    }
    .await;
    flash(result);

    let mut console = ConsoleSession::load(&session);
    console.set_action(form);
    console.save(&session);
    redirect_with("/console/collections", &query.select(Some(case_id)))
}
