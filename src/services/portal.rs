//! Client portal: page loading and the backend-facing wizard transitions.
//!
//! The wizard itself lives in the visitor's session. Account data (subscriptions,
//! invoices) is never stored there; it is fetched again with the lookup token
//! whenever a step needs it.

use chrono::NaiveDate;
use rand::Rng;

use crate::api::LandingApi;
use crate::domain::landing::{
    BillingLookup, Bootstrap, SubmitResponse, SubscriptionsLookup, to_download_url,
};
use crate::domain::types::IdempotencyKey;
use crate::domain::wizard::{BillingStep, NewStep, PlanStep, PortalWizard, Verified, WizardError};
use crate::dto::portal::{BillingView, InvoiceLink, PlanView, PortalPageData, ResultView};
use crate::forms::portal::{
    IdentityForm, OfferChoiceForm, PhoneForm, PlanOfferForm, PlanSubmitForm, ServiceForm,
    StepIntent,
};
use crate::services::ServiceResult;

async fn bootstrap<R>(api: &R) -> ServiceResult<Bootstrap>
where
    R: LandingApi + ?Sized,
{
    let catalog = api.bootstrap().await.map_err(|err| {
        log::error!("Failed to load portal catalog: {err}");
        err
    })?;
    Ok(catalog)
}

async fn lookup_subscriptions<R>(api: &R, verified: &Verified) -> ServiceResult<SubscriptionsLookup>
where
    R: LandingApi + ?Sized,
{
    let lookup = api
        .lookup_subscriptions(&verified.cin, &verified.lookup_token)
        .await
        .map_err(|err| {
            log::error!("Failed to look up subscriptions: {err}");
            err
        })?;
    Ok(lookup)
}

async fn lookup_invoices<R>(api: &R, verified: &Verified) -> ServiceResult<BillingLookup>
where
    R: LandingApi + ?Sized,
{
    let lookup = api
        .lookup_invoices(&verified.cin, &verified.lookup_token)
        .await
        .map_err(|err| {
            log::error!("Failed to look up invoices: {err}");
            err
        })?;
    Ok(lookup)
}

/// Gathers what the current step renders.
pub async fn load_portal_page<R>(api: &R, wizard: PortalWizard) -> ServiceResult<PortalPageData>
where
    R: LandingApi + ?Sized,
{
    let api_base = api.base_url();
    let catalog = bootstrap(api).await?;

    let mut offers = Vec::new();
    let mut selected_offer = None;
    let mut preview_identifier = None;
    let mut plan = None;
    let mut billing = None;
    let mut result = None;

    match &wizard {
        PortalWizard::Picker => {}
        PortalWizard::SubscribeNewService(state) => {
            offers = catalog.offers_for(state.service).to_vec();
            selected_offer = state
                .offer_id
                .as_ref()
                .and_then(|id| catalog.find_offer(state.service, id))
                .cloned();
            preview_identifier = Some(state.preview_identifier());
            result = state.result.clone();
        }
        PortalWizard::UpgradeOrDowngradeExistingService(state) => {
            if matches!(state.step, PlanStep::Offer | PlanStep::Preview)
                && let Some(verified) = state.verification()
            {
                let lookup = lookup_subscriptions(api, verified).await?;
                let source = state
                    .source_contract_id
                    .as_ref()
                    .and_then(|id| lookup.subscription(id))
                    .cloned();
                let target = source.as_ref().and_then(|source| {
                    source
                        .eligible_offers
                        .iter()
                        .find(|offer| Some(&offer.id) == state.target_offer_id.as_ref())
                        .cloned()
                });
                plan = Some(PlanView {
                    lookup,
                    source,
                    target,
                });
            }
            result = state.result.clone();
        }
        PortalWizard::CheckBillingAndDownloadInvoices(state) => {
            if state.step == BillingStep::Invoices
                && let Some(verified) = &state.verified
            {
                let lookup = lookup_invoices(api, verified).await?;
                let invoices = lookup
                    .invoices
                    .iter()
                    .map(|invoice| InvoiceLink {
                        download_url: to_download_url(
                            &api_base,
                            Some(invoice.document_download_url.as_str()),
                        ),
                        invoice: invoice.clone(),
                    })
                    .collect();
                billing = Some(BillingView { lookup, invoices });
            }
        }
    }

    let result = result.map(|response| ResultView {
        download_url: to_download_url(&api_base, response.document_download_url.as_deref()),
        response,
    });

    Ok(PortalPageData {
        api_base,
        wizard,
        catalog,
        offers,
        selected_offer,
        preview_identifier,
        plan,
        billing,
        result,
    })
}

pub fn choose_service(wizard: &mut PortalWizard, form: &ServiceForm) -> ServiceResult<()> {
    let service = form.service()?;
    wizard.new_subscription_mut()?.select_service(service)?;
    Ok(())
}

/// Moves past the offer step once the picked offer is in the catalog.
pub async fn choose_offer<R>(
    api: &R,
    wizard: &mut PortalWizard,
    form: &OfferChoiceForm,
) -> ServiceResult<()>
where
    R: LandingApi + ?Sized,
{
    let state = wizard.new_subscription_mut()?;
    let catalog = bootstrap(api).await?;
    let offer_id = form
        .offer_id()
        .filter(|id| catalog.find_offer(state.service, id).is_some());
    state.continue_from_offer(offer_id)?;
    Ok(())
}

pub fn choose_phone<G: Rng + ?Sized>(
    wizard: &mut PortalWizard,
    form: &PhoneForm,
    rng: &mut G,
) -> ServiceResult<()> {
    let state = wizard.new_subscription_mut()?;
    state.choose_mobile_mode(form.mobile_mode, rng)?;
    if form.intent == StepIntent::Continue {
        state.continue_from_phone()?;
    }
    Ok(())
}

pub fn submit_identity(
    wizard: &mut PortalWizard,
    form: IdentityForm,
    today: NaiveDate,
) -> ServiceResult<()> {
    let state = wizard.new_subscription_mut()?;
    let input = form.into_input(today)?;
    state.continue_from_identity(input)?;
    Ok(())
}

/// Fills in the contract PDF link when the submission did not return one.
/// Failures are logged and leave the response untouched.
async fn ensure_document_link<R>(api: &R, mut response: SubmitResponse) -> SubmitResponse
where
    R: LandingApi + ?Sized,
{
    if response.document_download_url.is_some() {
        return response;
    }
    match api
        .document_link(&response.contract.id, &response.client_cin)
        .await
    {
        Ok(link) => response.document_download_url = Some(link.document_download_url),
        Err(err) => {
            log::warn!(
                "Failed to generate document link for contract {}: {err}",
                response.contract.id
            );
        }
    }
    response
}

/// Submits the new-subscription request built from the preview step.
pub async fn submit_new_subscription<R>(
    api: &R,
    wizard: &mut PortalWizard,
) -> ServiceResult<&'static str>
where
    R: LandingApi + ?Sized,
{
    let state = wizard.new_subscription_mut()?;
    if state.step != NewStep::Preview {
        return Err(WizardError::StepUnavailable.into());
    }
    let catalog = bootstrap(api).await?;
    let offer = state
        .offer_id
        .as_ref()
        .and_then(|id| catalog.find_offer(state.service, id));
    let request = state.build_request(offer)?;

    let response = api
        .submit_new_subscription(&request, &IdempotencyKey::generate("landing-new"))
        .await
        .map_err(|err| {
            log::error!("Failed to submit new subscription: {err}");
            err
        })?;
    let response = ensure_document_link(api, response).await;
    state.complete(response)?;
    Ok("Subscription confirmed and contract generated.")
}

/// Verifies the CIN of the plan-change flow and loads its subscriptions.
/// Returns the banner text.
pub async fn verify_plan_cin<R>(
    api: &R,
    wizard: &mut PortalWizard,
    raw_cin: &str,
) -> ServiceResult<String>
where
    R: LandingApi + ?Sized,
{
    let state = wizard.plan_change_mut()?;
    let cin = state.verify_input(raw_cin)?;
    let verification = api.verify_cin(&cin).await.map_err(|err| {
        log::error!("Failed to verify CIN: {err}");
        err
    })?;
    let verified = Verified::new(cin, verification);
    lookup_subscriptions(api, &verified).await?;

    let message = format!(
        "CIN verified ({}). Select your offer change.",
        verified.masked_contact
    );
    state.verified(verified)?;
    Ok(message)
}

/// Picks the source contract, and with [`StepIntent::Continue`] the target
/// offer among its eligible offers.
pub async fn choose_plan_offer<R>(
    api: &R,
    wizard: &mut PortalWizard,
    form: &PlanOfferForm,
) -> ServiceResult<()>
where
    R: LandingApi + ?Sized,
{
    let state = wizard.plan_change_mut()?;
    if form.intent == StepIntent::Select {
        state.select_source(form.source())?;
        return Ok(());
    }
    let verified = state.verification().cloned().ok_or(WizardError::NotVerified)?;
    let lookup = lookup_subscriptions(api, &verified).await?;
    state.continue_from_offer(&lookup, form.source(), form.target())?;
    Ok(())
}

pub async fn submit_plan_change<R>(
    api: &R,
    wizard: &mut PortalWizard,
    form: PlanSubmitForm,
) -> ServiceResult<&'static str>
where
    R: LandingApi + ?Sized,
{
    let state = wizard.plan_change_mut()?;
    let verified = state.verification().cloned().ok_or(WizardError::NotVerified)?;
    let start_date = form.start_date(state.start_date)?;
    let lookup = lookup_subscriptions(api, &verified).await?;
    let request = state.build_request(&lookup, start_date, form.commitment_months)?;

    let response = api
        .submit_plan_change(&request, &IdempotencyKey::generate("landing-plan"))
        .await
        .map_err(|err| {
            log::error!("Failed to submit plan change: {err}");
            err
        })?;
    let response = ensure_document_link(api, response).await;
    state.complete(response)?;
    Ok("Offer change validated and applied.")
}

/// Verifies the CIN of the billing flow. Returns the banner text.
pub async fn verify_billing_cin<R>(
    api: &R,
    wizard: &mut PortalWizard,
    raw_cin: &str,
) -> ServiceResult<String>
where
    R: LandingApi + ?Sized,
{
    let state = wizard.billing_check_mut()?;
    let cin = state.verify_input(raw_cin)?;
    let verification = api.verify_cin(&cin).await.map_err(|err| {
        log::error!("Failed to verify CIN: {err}");
        err
    })?;
    let verified = Verified::new(cin, verification);
    lookup_invoices(api, &verified).await?;

    let message = format!(
        "CIN verified ({}). Billing history loaded.",
        verified.masked_contact
    );
    state.verified(verified)?;
    Ok(message)
}

/// Ensures the finished flow carries a contract PDF link; `false` when the
/// backend could not produce one.
pub async fn generate_document_link<R>(api: &R, wizard: &mut PortalWizard) -> ServiceResult<bool>
where
    R: LandingApi + ?Sized,
{
    let result = wizard.finished_result_mut()?;
    let response = ensure_document_link(api, result.clone()).await;
    let ready = response.document_download_url.is_some();
    *result = response;
    Ok(ready)
}
