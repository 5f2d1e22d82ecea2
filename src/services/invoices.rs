//! Invoices tab: filtered invoice list, invoice detail, billing runs and
//! approve-as-paid.

use chrono::NaiveDate;

use crate::api::{BillingApi, CollectionsApi, CustomerApi, OfferApi};
use crate::domain::billing::{BillingRunRequest, InvoiceDetail};
use crate::domain::collections::ApprovePaid;
use crate::domain::types::{IdempotencyKey, InvoiceId};
use crate::dto::console::{InvoicesPageData, OfferRow};
use crate::forms::billing::{BillingRunForm, InvoiceFilterForm};
use crate::services::{ServiceResult, keep_or_first};

/// Loads the invoice center. The offer filter is dropped first when it no
/// longer belongs to the selected service; the invoice selection falls back
/// to the most recently issued invoice.
pub async fn load_invoices_page<R>(
    api: &R,
    mut filters: InvoiceFilterForm,
    selected: Option<InvoiceId>,
    billing_form: BillingRunForm,
) -> ServiceResult<InvoicesPageData>
where
    R: BillingApi + CustomerApi + OfferApi + ?Sized,
{
    let (clients, offers) = tokio::try_join!(api.list_customers(), api.list_offers())
        .map_err(|err| {
            log::error!("Failed to load invoice filters: {err}");
            err
        })?;
    let offers = offers.data;
    filters.reconcile(&offers);

    let mut invoices = api
        .list_invoices(&filters.to_filter())
        .await
        .map_err(|err| {
            log::error!("Failed to list invoices: {err}");
            err
        })?
        .data;
    invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));

    let ids: Vec<InvoiceId> = invoices.iter().map(|invoice| invoice.id.clone()).collect();
    let selected_invoice_id = keep_or_first(selected, &ids);
    let selected = match &selected_invoice_id {
        Some(invoice_id) => Some(load_invoice_detail(api, invoice_id).await?),
        None => None,
    };

    let selectable = filters
        .selectable_offers(&offers)
        .into_iter()
        .cloned()
        .map(OfferRow::from)
        .collect();

    Ok(InvoicesPageData {
        invoices,
        clients: clients.data,
        offers: selectable,
        filters,
        selected_invoice_id,
        selected,
        billing_form,
    })
}

pub async fn load_invoice_detail<R>(api: &R, invoice_id: &InvoiceId) -> ServiceResult<InvoiceDetail>
where
    R: BillingApi + ?Sized,
{
    let detail = api.get_invoice(invoice_id).await.map_err(|err| {
        log::error!("Failed to load invoice {invoice_id}: {err}");
        err
    })?;
    Ok(detail)
}

/// Runs billing for the form's period. Returns the banner text and the first
/// issued invoice, which becomes the selection.
pub async fn run_billing<R>(
    api: &R,
    form: BillingRunForm,
) -> ServiceResult<(String, Option<InvoiceId>)>
where
    R: BillingApi + ?Sized,
{
    let request = BillingRunRequest::try_from(form)?;
    let result = api
        .run_billing(&request, &IdempotencyKey::generate("billing-run"))
        .await
        .map_err(|err| {
            log::error!("Failed to run billing: {err}");
            err
        })?;
    Ok((result.summary(), result.invoice_ids.first().cloned()))
}

pub async fn download_invoice_pdf<R>(api: &R, invoice_id: &InvoiceId) -> ServiceResult<Vec<u8>>
where
    R: BillingApi + ?Sized,
{
    let bytes = api.invoice_pdf(invoice_id).await.map_err(|err| {
        log::error!("Failed to download PDF of invoice {invoice_id}: {err}");
        err
    })?;
    Ok(bytes)
}

/// Settles the invoice with an `other` payment dated `today`.
pub async fn approve_invoice_paid<R>(
    api: &R,
    invoice_id: &InvoiceId,
    today: NaiveDate,
) -> ServiceResult<&'static str>
where
    R: CollectionsApi + ?Sized,
{
    let key = IdempotencyKey::generate(&format!("approve-paid-{invoice_id}"));
    let result = api
        .approve_invoice_paid(invoice_id, &ApprovePaid::on(today), &key)
        .await
        .map_err(|err| {
            log::error!("Failed to approve invoice {invoice_id} as paid: {err}");
            err
        })?;
    Ok(result.approval_summary())
}
