//! Collections tab: overview, cases, action history and payments.

use crate::api::{CollectionsApi, CustomerApi};
use crate::domain::collections::{self, CaseAction, CaseStatus, CollectionCase, NewPayment};
use crate::domain::types::{CaseId, IdempotencyKey};
use crate::dto::console::CollectionsPageData;
use crate::forms::FormError;
use crate::forms::collections::{CaseActionForm, CaseFilterForm, PaymentForm};
use crate::services::{ServiceError, ServiceResult, keep_or_first};

async fn list_cases<R>(api: &R, filters: &CaseFilterForm) -> ServiceResult<Vec<CollectionCase>>
where
    R: CollectionsApi + ?Sized,
{
    let mut cases = api
        .list_cases(&filters.to_filter())
        .await
        .map_err(|err| {
            log::error!("Failed to list collection cases: {err}");
            err
        })?
        .data;
    collections::sort_cases(&mut cases);
    Ok(cases)
}

pub async fn list_case_actions<R>(api: &R, case_id: &CaseId) -> ServiceResult<Vec<CaseAction>>
where
    R: CollectionsApi + ?Sized,
{
    let actions = api.list_case_actions(case_id).await.map_err(|err| {
        log::error!("Failed to list actions of case {case_id}: {err}");
        err
    })?;
    Ok(actions)
}

/// Loads the collections center. The selected case (first by default) brings
/// its action history, and the payment form follows its invoice unless the
/// operator typed a different one.
pub async fn load_collections_page<R>(
    api: &R,
    filters: CaseFilterForm,
    selected: Option<CaseId>,
    mut payment_form: PaymentForm,
    action_form: CaseActionForm,
) -> ServiceResult<CollectionsPageData>
where
    R: CollectionsApi + CustomerApi + ?Sized,
{
    let overview = async {
        api.collections_overview().await.map_err(|err| {
            log::error!("Failed to load collections overview: {err}");
            ServiceError::from(err)
        })
    };
    let clients = async {
        api.list_customers().await.map_err(|err| {
            log::error!("Failed to list clients: {err}");
            ServiceError::from(err)
        })
    };
    let (overview, clients, cases) =
        tokio::try_join!(overview, clients, list_cases(api, &filters))?;

    let ids: Vec<CaseId> = cases.iter().map(|case| case.id.clone()).collect();
    let selected_case_id = keep_or_first(selected, &ids);
    let selected_case = selected_case_id
        .as_ref()
        .and_then(|id| cases.iter().find(|case| &case.id == id))
        .cloned();

    let actions = match &selected_case {
        Some(case) => {
            payment_form.follow_case(&case.invoice_id);
            list_case_actions(api, &case.id).await?
        }
        None => Vec::new(),
    };

    Ok(CollectionsPageData {
        overview,
        cases,
        clients: clients.data,
        filters,
        selected_case_id,
        selected_case,
        actions,
        payment_form,
        action_form,
    })
}

/// Records the payment and clears the per-payment inputs. Returns the banner
/// text and the case opened for the paid invoice, if it is still listed.
pub async fn record_payment<R>(
    api: &R,
    form: &mut PaymentForm,
    filters: &CaseFilterForm,
) -> ServiceResult<(String, Option<CaseId>)>
where
    R: CollectionsApi + ?Sized,
{
    let payment = NewPayment::try_from(&*form)?;
    let result = api
        .record_payment(&payment, &IdempotencyKey::generate("payment"))
        .await
        .map_err(|err| {
            log::error!("Failed to record payment: {err}");
            err
        })?;

    let cases = list_cases(api, filters).await?;
    let case_id = cases
        .iter()
        .find(|case| case.invoice_id == result.payment.invoice_id)
        .map(|case| case.id.clone());

    form.clear_after_payment();
    Ok((result.summary(), case_id))
}

pub async fn update_case_status<R>(
    api: &R,
    case_id: &CaseId,
    status: CaseStatus,
) -> ServiceResult<CollectionCase>
where
    R: CollectionsApi + ?Sized,
{
    let case = api
        .update_case_status(case_id, status)
        .await
        .map_err(|err| {
            log::error!("Failed to update status of case {case_id}: {err}");
            err
        })?;
    Ok(case)
}

/// Appends a manual action to the selected case and clears the note.
pub async fn add_case_action<R>(
    api: &R,
    case_id: Option<&CaseId>,
    form: &mut CaseActionForm,
) -> ServiceResult<CaseAction>
where
    R: CollectionsApi + ?Sized,
{
    let action = form.to_action(case_id)?;
    let case_id = case_id.ok_or(FormError::CaseRequired)?;
    let created = api
        .add_case_action(case_id, &action)
        .await
        .map_err(|err| {
            log::error!("Failed to add action to case {case_id}: {err}");
            err
        })?;
    form.note.clear();
    Ok(created)
}
