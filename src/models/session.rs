//! UI state kept in the signed session cookie between requests.
//!
//! Only drafts the operator has touched are stored; untouched forms are
//! rebuilt with today's defaults on every request.

use actix_session::Session;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::wizard::PortalWizard;
use crate::forms::billing::BillingRunForm;
use crate::forms::collections::{CaseActionForm, PaymentForm};
use crate::forms::contracts::ProvisionForm;
use crate::forms::offers::OfferForm;

const CONSOLE_KEY: &str = "console";
const PORTAL_KEY: &str = "portal";
const SESSION_ID_KEY: &str = "sid";

fn load<T: DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    match session.get::<T>(key) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Dropping unreadable session entry {key}: {err}");
            session.remove(key);
            None
        }
    }
}

fn store<T: Serialize>(session: &Session, key: &str, value: &T) {
    if let Err(err) = session.insert(key, value) {
        log::error!("Failed to store session entry {key}: {err}");
    }
}

/// Drafts of the operator console.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsoleSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provision: Option<ProvisionForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offer: Option<OfferForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    billing: Option<BillingRunForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payment: Option<PaymentForm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<CaseActionForm>,
}

impl ConsoleSession {
    pub fn load(session: &Session) -> Self {
        load(session, CONSOLE_KEY).unwrap_or_default()
    }

    pub fn save(&self, session: &Session) {
        store(session, CONSOLE_KEY, self);
    }

    pub fn provision(&self, today: NaiveDate) -> ProvisionForm {
        self.provision
            .clone()
            .unwrap_or_else(|| ProvisionForm::new(today))
    }

    pub fn set_provision(&mut self, form: ProvisionForm) {
        self.provision = Some(form);
    }

    /// Offer form in progress, if any.
    pub fn offer(&self) -> Option<OfferForm> {
        self.offer.clone()
    }

    pub fn set_offer(&mut self, form: Option<OfferForm>) {
        self.offer = form;
    }

    pub fn billing(&self, today: NaiveDate) -> BillingRunForm {
        self.billing
            .clone()
            .unwrap_or_else(|| BillingRunForm::new(today))
    }

    pub fn set_billing(&mut self, form: BillingRunForm) {
        self.billing = Some(form);
    }

    pub fn payment(&self, today: NaiveDate) -> PaymentForm {
        self.payment
            .clone()
            .unwrap_or_else(|| PaymentForm::new(today))
    }

    pub fn set_payment(&mut self, form: PaymentForm) {
        self.payment = Some(form);
    }

    pub fn action(&self) -> CaseActionForm {
        self.action.clone().unwrap_or_default()
    }

    pub fn set_action(&mut self, form: CaseActionForm) {
        self.action = Some(form);
    }
}

/// Current portal wizard; the flow picker when nothing is stored.
pub fn portal_wizard(session: &Session) -> PortalWizard {
    load(session, PORTAL_KEY).unwrap_or_default()
}

pub fn save_portal_wizard(session: &Session, wizard: &PortalWizard) {
    store(session, PORTAL_KEY, wizard);
}

/// Stable id of the browser session, created on first use.
pub fn session_id(session: &Session) -> Uuid {
    if let Some(id) = load::<Uuid>(session, SESSION_ID_KEY) {
        return id;
    }
    let id = Uuid::new_v4();
    store(session, SESSION_ID_KEY, &id);
    id
}
