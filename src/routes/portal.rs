//! Client portal: the wizard lives in the session, every step posts and
//! redirects back to `GET /portal`.

use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::{Local, NaiveDate};
use tera::Tera;

use crate::api::resolver::Backend;
use crate::busy::BusyRegistry;
use crate::domain::wizard::PortalWizard;
use crate::forms::portal::{
    CinForm, FlowForm, IdentityForm, OfferChoiceForm, PhoneForm, PlanOfferForm, PlanSubmitForm,
    ServiceForm,
};
use crate::models::session::{portal_wizard, save_portal_wizard};
use crate::routes::{acquire_busy, alerts, base_context, redirect, render_template};
use crate::services::{ServiceError, ServiceResult, portal};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Keeps the wizard as it now stands, whatever the outcome, and reports it.
fn finish(
    session: &Session,
    wizard: &PortalWizard,
    result: ServiceResult<Option<String>>,
) -> HttpResponse {
    save_portal_wizard(session, wizard);
    match result {
        Ok(Some(message)) => FlashMessage::success(message).send(),
        Ok(None) => {}
        Err(err) => FlashMessage::error(err.to_string()).send(),
    }
    redirect("/portal")
}

#[get("/portal")]
pub async fn show_portal(
    backend: web::Data<Backend>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let wizard = portal_wizard(&session);
    let result = match backend.portal().await {
        Ok(api) => portal::load_portal_page(api, wizard).await.map(|page| {
            let status = format!("Connected to landing APIs ({}).", page.api_base);
            (page, status)
        }),
        Err(err) => Err(err.into()),
    };

    match result {
        Ok((page, status)) => {
            let alerts = alerts(&flash_messages, Some((status, "info")));
            let mut context = base_context(&alerts, "portal");
            context.insert("page", &page);
            render_template(&tera, "portal/index.html", &context)
        }
        Err(err) => {
            let context = base_context(&[(err.to_string(), "danger")], "portal");
            render_template(&tera, "portal/index.html", &context)
        }
    }
}

/// Starts a flow from scratch; picking the active flow again resets it.
#[post("/portal/flow")]
pub async fn start_flow(session: Session, web::Form(form): web::Form<FlowForm>) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = form.flow().map_err(ServiceError::from).map(|flow| {
        wizard = PortalWizard::start(flow, today(), &mut rand::thread_rng());
        None
    });
    finish(&session, &wizard, result)
}

#[post("/portal/exit")]
pub async fn exit_flow(session: Session) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    wizard.exit();
    finish(&session, &wizard, Ok(None))
}

#[post("/portal/back")]
pub async fn step_back(session: Session) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    wizard.back();
    finish(&session, &wizard, Ok(None))
}

#[post("/portal/new/service")]
pub async fn new_service(
    session: Session,
    web::Form(form): web::Form<ServiceForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = portal::choose_service(&mut wizard, &form).map(|_| None);
    finish(&session, &wizard, result)
}

#[post("/portal/new/offer")]
pub async fn new_offer(
    backend: web::Data<Backend>,
    session: Session,
    web::Form(form): web::Form<OfferChoiceForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let api = backend.portal().await?;
        portal::choose_offer(api, &mut wizard, &form).await?;
        Ok::<_, ServiceError>(None)
    }
    .await;
    finish(&session, &wizard, result)
}

#[post("/portal/new/phone")]
pub async fn new_phone(session: Session, web::Form(form): web::Form<PhoneForm>) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = portal::choose_phone(&mut wizard, &form, &mut rand::thread_rng()).map(|_| None);
    finish(&session, &wizard, result)
}

#[post("/portal/new/identity")]
pub async fn new_identity(
    session: Session,
    web::Form(form): web::Form<IdentityForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = portal::submit_identity(&mut wizard, form, today()).map(|_| None);
    finish(&session, &wizard, result)
}

#[post("/portal/new/submit")]
pub async fn new_submit(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.portal().await?;
        let message = portal::submit_new_subscription(api, &mut wizard).await?;
        Ok::<_, ServiceError>(Some(message.to_string()))
    }
    .await;
    finish(&session, &wizard, result)
}

#[post("/portal/plan/verify")]
pub async fn plan_verify(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<CinForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.portal().await?;
        let message = portal::verify_plan_cin(api, &mut wizard, &form.cin).await?;
        Ok::<_, ServiceError>(Some(message))
    }
    .await;
    finish(&session, &wizard, result)
}

#[post("/portal/plan/offer")]
pub async fn plan_offer(
    backend: web::Data<Backend>,
    session: Session,
    web::Form(form): web::Form<PlanOfferForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let api = backend.portal().await?;
        portal::choose_plan_offer(api, &mut wizard, &form).await?;
        Ok::<_, ServiceError>(None)
    }
    .await;
    finish(&session, &wizard, result)
}

#[post("/portal/plan/submit")]
pub async fn plan_submit(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<PlanSubmitForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.portal().await?;
        let message = portal::submit_plan_change(api, &mut wizard, form).await?;
        Ok::<_, ServiceError>(Some(message.to_string()))
    }
    .await;
    finish(&session, &wizard, result)
}

#[post("/portal/billing/verify")]
pub async fn billing_verify(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
    web::Form(form): web::Form<CinForm>,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.portal().await?;
        let message = portal::verify_billing_cin(api, &mut wizard, &form.cin).await?;
        Ok::<_, ServiceError>(Some(message))
    }
    .await;
    finish(&session, &wizard, result)
}

#[post("/portal/document-link")]
pub async fn document_link(
    backend: web::Data<Backend>,
    busy: web::Data<BusyRegistry>,
    session: Session,
) -> impl Responder {
    let mut wizard = portal_wizard(&session);
    let result = async {
        let _guard = acquire_busy(&busy, &session)?;
        let api = backend.portal().await?;
        portal::generate_document_link(api, &mut wizard).await
    }
    .await;

    save_portal_wizard(&session, &wizard);
    match result {
        Ok(true) => FlashMessage::success("Contract PDF is ready for download.").send(),
        Ok(false) => {
            FlashMessage::error("Could not generate PDF link. Verify CIN and try again.").send()
        }
        Err(err) => FlashMessage::error(err.to_string()).send(),
    }
    redirect("/portal")
}
