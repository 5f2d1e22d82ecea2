use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, HttpResponse, test, web};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::{FlashMessagesFramework, Level};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mt_facturation_web::api::client::Actor;
use mt_facturation_web::api::resolver::{ApiBaseResolver, Backend};
use mt_facturation_web::busy::BusyRegistry;
use mt_facturation_web::models::session::session_id;
use mt_facturation_web::routes::alert_level_to_str;
use mt_facturation_web::{build_tera, configure};

const SECRET: &[u8] = b"test-secret-key-for-sessions-and-flash-messages-0123456789abcdefghij";

#[::core::prelude::v1::test]
fn test_alert_level_to_str_mappings() {
    assert_eq!(alert_level_to_str(&Level::Error), "danger");
    assert_eq!(alert_level_to_str(&Level::Warning), "warning");
    assert_eq!(alert_level_to_str(&Level::Success), "success");
    assert_eq!(alert_level_to_str(&Level::Info), "info");
    assert_eq!(alert_level_to_str(&Level::Debug), "info");
}

/// Backend that passes discovery for both the console and the portal.
async fn backend_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    let paths: serde_json::Map<String, Value> = [
        "/api/v1/customers",
        "/api/v1/offers",
        "/api/v1/contracts",
        "/api/v1/landing/bootstrap",
    ]
    .iter()
    .map(|p| (p.to_string(), json!({})))
    .collect();
    Mock::given(method("GET"))
        .and(path("/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "paths": paths })))
        .mount(&server)
        .await;
    server
}

async fn mount_json(server: &MockServer, http_method: &str, route: &str, body: Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn offer_summary(id: &str, name: &str, category: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "service_category": category,
        "service_type": category,
        "monthly_fee": "99.00",
        "activation_fee": "0.00",
    })
}

async fn mount_bootstrap(server: &MockServer) {
    mount_json(
        server,
        "GET",
        "/api/v1/landing/bootstrap",
        json!({
            "offer_categories": [
                {
                    "service_category": "mobile",
                    "offers": [offer_summary("o-mob", "Mobile 20GB", "mobile")],
                },
                {
                    "service_category": "internet",
                    "offers": [offer_summary("o-fib", "Fiber 100", "internet")],
                },
            ]
        }),
    )
    .await;
}

async fn mount_empty_console(server: &MockServer) {
    let empty = json!({"data": [], "meta": {"page": 1, "size": 50, "total": 0}});
    for route in [
        "/api/v1/customers",
        "/api/v1/offers",
        "/api/v1/contracts",
        "/api/v1/invoices",
        "/api/v1/collections/cases",
    ] {
        mount_json(server, "GET", route, empty.clone()).await;
    }
    mount_json(
        server,
        "GET",
        "/api/v1/collections/overview",
        json!({
            "open_cases": 0,
            "in_progress_cases": 0,
            "overdue_invoices": 0,
            "total_outstanding_amount": "0.00",
            "bucket_totals": {}
        }),
    )
    .await;
}

/// Exposes the busy-flag id of the calling session.
async fn current_session_id(session: Session) -> HttpResponse {
    HttpResponse::Ok().body(session_id(&session).to_string())
}

macro_rules! test_app {
    ($candidates:expr) => {
        test_app!($candidates, BusyRegistry::new())
    };
    ($candidates:expr, $busy:expr) => {{
        let resolver = ApiBaseResolver::new(
            $candidates,
            Actor::new("frontend-operator", "admin,billing,user"),
        )
        .unwrap();
        let key = Key::from(SECRET);
        let message_store = CookieMessageStore::builder(key.clone()).build();
        let message_framework = FlashMessagesFramework::builder(message_store).build();
        let tera = build_tera("templates/**/*").unwrap();
        test::init_service(
            App::new()
                .wrap(message_framework)
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), key)
                        .cookie_secure(false)
                        .build(),
                )
                .configure(configure)
                .route("/session-id", web::get().to(current_session_id))
                .app_data(web::Data::new(tera))
                .app_data(web::Data::new(Backend::new(resolver)))
                .app_data(web::Data::new($busy)),
        )
        .await
    }};
}

/// Cookie jar carried across requests of one visitor.
#[derive(Default)]
struct Jar(Vec<Cookie<'static>>);

impl Jar {
    fn keep<B>(&mut self, response: &ServiceResponse<B>) {
        for cookie in response.response().cookies() {
            self.0.retain(|kept| kept.name() != cookie.name());
            if !cookie.value().is_empty() {
                self.0.push(cookie.into_owned());
            }
        }
    }

    fn attach(&self, mut request: test::TestRequest) -> test::TestRequest {
        for cookie in &self.0 {
            request = request.cookie(cookie.clone());
        }
        request
    }
}

/// POSTs a form and returns the redirect target.
macro_rules! post_form {
    ($app:expr, $jar:expr, $uri:expr, $form:expr $(,)?) => {{
        let request = $jar.attach(test::TestRequest::post().uri($uri).set_form($form));
        let response = test::call_service(&$app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "POST {}", $uri);
        $jar.keep(&response);
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|location| location.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }};
}

/// GETs a page and returns its body.
macro_rules! get_page {
    ($app:expr, $jar:expr, $uri:expr) => {{
        let request = $jar.attach(test::TestRequest::get().uri($uri));
        let response = test::call_service(&$app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", $uri);
        $jar.keep(&response);
        let body = test::read_body(response).await;
        String::from_utf8(body.to_vec()).unwrap()
    }};
}

#[actix_web::test]
async fn root_redirects_to_contracts() {
    let app = test_app!(vec!["http://127.0.0.1:9".to_string()]);
    let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/console/contracts"
    );
}

#[actix_web::test]
async fn clients_tab_lists_backend_clients() {
    let server = backend_server().await;
    mount_json(
        &server,
        "GET",
        "/api/v1/customers",
        json!({
            "data": [{
                "id": "cl-1",
                "client_type": "individual",
                "full_name": "Amina Benali",
                "address": null,
                "email": "amina@example.com",
                "phone": null,
                "is_delinquent": true,
                "status": "active",
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            }],
            "meta": {}
        }),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/api/v1/customers/cl-1/subscribers",
        json!({
            "data": [{
                "id": "sub-1",
                "client_id": "cl-1",
                "service_type": "mobile",
                "service_identifier": "+212612345678",
                "status": "active",
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            }],
            "meta": {}
        }),
    )
    .await;

    let app = test_app!(vec![server.uri()]);
    let mut jar = Jar::default();
    let body = get_page!(app, jar, "/console/clients");

    assert!(body.contains("Connected to backend services ("));
    assert!(body.contains("Amina Benali"));
    assert!(body.contains("delinquent"));
    assert!(body.contains("+212612345678"));
}

#[actix_web::test]
async fn unreachable_backend_is_reported_on_the_tab() {
    let app = test_app!(vec!["http://127.0.0.1:9".to_string()]);
    let mut jar = Jar::default();
    let body = get_page!(app, jar, "/console/contracts");

    assert!(body.contains("alert-danger"));
    assert!(body.contains("Could not connect to backend."));
    assert!(!body.contains("Connected to backend services"));
}

#[actix_web::test]
async fn every_console_tab_renders_against_an_empty_backend() {
    let server = backend_server().await;
    mount_empty_console(&server).await;
    let app = test_app!(vec![server.uri()]);
    let mut jar = Jar::default();

    for (uri, heading) in [
        ("/console/contracts", "Contract Provisioning"),
        ("/console/clients", "Clients"),
        ("/console/offers", "New offer"),
        ("/console/invoices", "Billing run"),
        ("/console/collections", "Collections overview"),
    ] {
        let body = get_page!(app, jar, uri);
        assert!(body.contains(heading), "{uri} misses {heading}");
        assert!(!body.contains("alert-danger"), "{uri} reported an error");
        assert!(body.contains("Connected to backend services ("), "{uri}");
    }
}

#[actix_web::test]
async fn mutation_is_refused_while_the_session_is_busy() {
    let server = backend_server().await;
    mount_empty_console(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/collections/payments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let busy = BusyRegistry::new();
    let app = test_app!(vec![server.uri()], busy.clone());
    let mut jar = Jar::default();

    let id = get_page!(app, jar, "/session-id");
    let id = uuid::Uuid::parse_str(&id).unwrap();
    let guard = busy.try_acquire(id).unwrap();

    let location = post_form!(
        app,
        jar,
        "/console/collections/payments",
        &[
            ("invoice_id", "inv-1"),
            ("amount", "50"),
            ("payment_date", "2026-10-16"),
            ("method", "cash"),
        ],
    );
    assert!(location.starts_with("/console/collections"));
    let body = get_page!(app, jar, "/console/collections");
    assert!(body.contains("Another operation is still in progress."));

    drop(guard);
    assert!(!busy.is_busy(&id));
}

#[actix_web::test]
async fn new_mobile_subscription_walks_to_identity() {
    let server = backend_server().await;
    mount_bootstrap(&server).await;
    let app = test_app!(vec![server.uri()]);
    let mut jar = Jar::default();

    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Connected to landing APIs ("));
    assert!(body.contains("Subscribe to a new service"));

    let location = post_form!(
        app,
        jar,
        "/portal/flow",
        &[("flow", "subscribe_new_service")],
    );
    assert_eq!(location, "/portal");
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Mobile 20GB"));
    assert!(!body.contains("Fiber 100"));

    post_form!(app, jar, "/portal/new/offer", &[("offer_id", "o-mob")]);
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Your mobile number"));

    post_form!(
        app,
        jar,
        "/portal/new/phone",
        &[("mobile_mode", "assign_new"), ("intent", "continue")],
    );
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Personal Information"));

    post_form!(
        app,
        jar,
        "/portal/new/identity",
        &[("cin", "A"), ("full_name", "Amina Benali")],
    );
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("CIN and full name are required."));
    assert!(body.contains("Personal Information"));

    post_form!(
        app,
        jar,
        "/portal/new/identity",
        &[
            ("cin", " ab1234 "),
            ("full_name", "Amina Benali"),
            ("commitment_months", "12"),
        ],
    );
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Review your subscription"));

    Mock::given(method("POST"))
        .and(path("/api/v1/landing/submit/new"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "contract": {"id": "ct-9"},
            "client_cin": "AB1234",
            "service_identifier": "+212612345678",
            "provisioning_mode": "new_line",
            "document_download_url": "/api/v1/landing/documents/ct-9?token=t"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/landing/contracts/ct-9/document-link"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    post_form!(app, jar, "/portal/new/submit", &[("confirm", "1")]);
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Subscription Confirmed"));
    assert!(body.contains("Contract ID: ct-9"));
    assert!(body.contains("Download contract PDF"));
}

#[actix_web::test]
async fn offer_outside_the_catalog_is_refused() {
    let server = backend_server().await;
    mount_bootstrap(&server).await;
    let app = test_app!(vec![server.uri()]);
    let mut jar = Jar::default();

    post_form!(
        app,
        jar,
        "/portal/flow",
        &[("flow", "subscribe_new_service")],
    );
    post_form!(app, jar, "/portal/new/offer", &[("offer_id", "o-fib")]);
    let body = get_page!(app, jar, "/portal");

    assert!(body.contains("alert-danger"));
    assert!(body.contains("Choose your offer"));
}

#[actix_web::test]
async fn plan_change_verification_lists_subscriptions() {
    let server = backend_server().await;
    mount_bootstrap(&server).await;
    mount_json(
        &server,
        "POST",
        "/api/v1/landing/clients/verify-cin",
        json!({
            "cin": "AB1234",
            "masked_contact": "a***@example.com",
            "lookup_token": "tok-1",
            "expires_at": "2026-12-31T00:00:00Z"
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/landing/clients/AB1234/subscriptions"))
        .and(query_param("lookup_token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "client": {
                "cin": "AB1234",
                "full_name": "Amina Benali",
                "email": null,
                "phone": null,
                "address": null
            },
            "subscriptions": [{
                "contract_id": "ct-1",
                "service_identifier": "+212612345678",
                "service_category": "mobile",
                "current_offer": offer_summary("o-mob", "Mobile 20GB", "mobile"),
                "eligible_offers": [offer_summary("o-mob-50", "Mobile 50GB", "mobile")]
            }]
        })))
        .mount(&server)
        .await;

    let app = test_app!(vec![server.uri()]);
    let mut jar = Jar::default();

    Mock::given(method("POST"))
        .and(path("/api/v1/landing/clients/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    post_form!(
        app,
        jar,
        "/portal/flow",
        &[("flow", "upgrade_or_downgrade_existing_service")],
    );
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Verify your identity"));
    assert!(!body.contains("Mobile 20GB"));
    assert!(!body.contains("+212612345678"));

    post_form!(app, jar, "/portal/plan/verify", &[("cin", " ab1234 ")]);
    let body = get_page!(app, jar, "/portal");

    assert!(body.contains("CIN verified (a***@example.com)."));
    assert!(body.contains("Change your plan"));
    assert!(body.contains("Mobile 20GB"));

    post_form!(
        app,
        jar,
        "/portal/plan/offer",
        &[("source_contract_id", "ct-1"), ("intent", "select")],
    );
    let body = get_page!(app, jar, "/portal");
    assert!(body.contains("Mobile 50GB"));
}
