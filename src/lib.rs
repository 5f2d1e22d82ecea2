#[cfg(feature = "server")]
use actix_cors::Cors;
#[cfg(feature = "server")]
use actix_files::Files;
#[cfg(feature = "server")]
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
#[cfg(feature = "server")]
use actix_web::cookie::Key;
#[cfg(feature = "server")]
use actix_web::{App, HttpServer, middleware, web};
#[cfg(feature = "server")]
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
#[cfg(feature = "server")]
use tera::Tera;

#[cfg(feature = "server")]
use crate::api::resolver::{ApiBaseResolver, Backend};
#[cfg(feature = "server")]
use crate::busy::BusyRegistry;
#[cfg(feature = "server")]
use crate::models::config::ServerConfig;
#[cfg(feature = "server")]
use crate::routes::register_filters;

pub mod api;
pub mod busy;
pub mod domain;
pub mod dto;
pub mod forms;
#[cfg(feature = "server")]
pub mod models;
#[cfg(feature = "server")]
pub mod routes;
pub mod services;

/// Builds the template engine with the display filters registered.
#[cfg(feature = "server")]
pub fn build_tera(templates_dir: &str) -> std::io::Result<Tera> {
    let mut tera = Tera::new(templates_dir)
        .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;
    register_filters(&mut tera);
    Ok(tera)
}

/// Registers the console and portal handlers.
#[cfg(feature = "server")]
pub fn configure(cfg: &mut web::ServiceConfig) {
    use crate::routes::console::{
        apply_invoice_filters, approve_paid, case_action, case_status, client_delete,
        client_status, contract_status, index, invoice_pdf, offer_delete, offer_status,
        provision_contract, record_payment, reset_invoice_filters, reset_offer_form, run_billing,
        save_contract_draft, save_offer, show_clients, show_collections, show_contracts,
        show_invoices, show_offers,
    };
    use crate::routes::portal::{
        billing_verify, document_link, exit_flow, new_identity, new_offer, new_phone,
        new_service, new_submit, plan_offer, plan_submit, plan_verify, show_portal, start_flow,
        step_back,
    };

    cfg.service(index)
        .service(show_contracts)
        .service(save_contract_draft)
        .service(provision_contract)
        .service(contract_status)
        .service(show_clients)
        .service(client_status)
        .service(client_delete)
        .service(show_offers)
        .service(reset_offer_form)
        .service(save_offer)
        .service(offer_status)
        .service(offer_delete)
        .service(show_invoices)
        .service(apply_invoice_filters)
        .service(reset_invoice_filters)
        .service(run_billing)
        .service(invoice_pdf)
        .service(approve_paid)
        .service(show_collections)
        .service(record_payment)
        .service(case_status)
        .service(case_action)
        .service(show_portal)
        .service(start_flow)
        .service(exit_flow)
        .service(step_back)
        .service(new_service)
        .service(new_offer)
        .service(new_phone)
        .service(new_identity)
        .service(new_submit)
        .service(plan_verify)
        .service(plan_offer)
        .service(plan_submit)
        .service(billing_verify)
        .service(document_link);
}

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    // Backend discovery happens on first use, not at startup.
    let resolver = ApiBaseResolver::new(server_config.api_candidates(), server_config.actor())
        .map_err(|e| std::io::Error::other(format!("Failed to build backend client: {e}")))?;
    let backend = web::Data::new(Backend::new(resolver));
    let busy = web::Data::new(BusyRegistry::new());

    // Keys and stores for sessions and flash messages.
    let secret_key = Key::from(server_config.secret.as_bytes());

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = build_tera(&server_config.templates_dir)?;

    let bind_address = (server_config.address.clone(), server_config.port);
    log::info!(
        "Serving console and portal on {}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(message_framework.clone())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(
                        (server_config.domain != "localhost")
                            .then(|| format!(".{}", server_config.domain)),
                    )
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .configure(configure)
            .app_data(web::Data::new(tera.clone()))
            .app_data(backend.clone())
            .app_data(busy.clone())
            .app_data(web::Data::new(server_config.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}
