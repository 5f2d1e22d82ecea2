//! HTTP handlers of the operator console and the client portal.

use std::collections::HashMap;

use actix_session::Session;
use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::busy::{BusyGuard, BusyRegistry};
use crate::dto::{aging_label, format_money, status_pill_class};
use crate::models::session::session_id;
use crate::services::ServiceError;

pub mod console;
pub mod portal;

pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        Level::Info | Level::Debug => "info",
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// `path` followed by the non-empty query pairs of `query`.
pub fn redirect_with<T: Serialize>(path: &str, query: &T) -> HttpResponse {
    match serde_html_form::to_string(query) {
        Ok(query) if !query.is_empty() => redirect(&format!("{path}?{query}")),
        Ok(_) => redirect(path),
        Err(err) => {
            log::error!("Failed to encode redirect query for {path}: {err}");
            redirect(path)
        }
    }
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Status banner: pending flash messages, or `status` when there are none.
pub fn alerts(
    flash_messages: &IncomingFlashMessages,
    status: Option<(String, &'static str)>,
) -> Vec<(String, &'static str)> {
    let alerts: Vec<_> = flash_messages
        .iter()
        .map(|f| (f.content().to_string(), alert_level_to_str(&f.level())))
        .collect();
    if alerts.is_empty() {
        status.into_iter().collect()
    } else {
        alerts
    }
}

pub fn base_context(alerts: &[(String, &'static str)], current_page: &str) -> Context {
    let mut context = Context::new();
    context.insert("alerts", alerts);
    context.insert("current_page", current_page);
    context
}

/// Marks the session busy for the duration of a backend mutation.
pub fn acquire_busy(busy: &BusyRegistry, session: &Session) -> Result<BusyGuard, ServiceError> {
    busy.try_acquire(session_id(session))
        .ok_or(ServiceError::Busy)
}

fn filter_input(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn money_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(format_money(&filter_input(value))))
}

fn status_pill_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(
        status_pill_class(&filter_input(value)).to_string(),
    ))
}

fn aging_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(aging_label(&filter_input(value))))
}

/// Display helpers available to every template.
pub fn register_filters(tera: &mut Tera) {
    tera.register_filter("money", money_filter);
    tera.register_filter("status_pill", status_pill_filter);
    tera.register_filter("aging", aging_filter);
}
