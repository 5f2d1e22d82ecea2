use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::collections::{
    ActionType, AgingBucket, CaseFilter, CaseStatus, NewCaseAction, NewPayment, PaymentMethod,
};
use crate::domain::types::{CaseId, ClientId, InvoiceId};
use crate::forms::{FormError, parse_date, parse_decimal};

#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
/// Payment form of the collections center.
pub struct PaymentForm {
    #[serde(default)]
    pub invoice_id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub payment_date: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    #[validate(length(max = 120))]
    pub reference: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub note: String,
    /// Invoice last filled in from the selected case.
    #[serde(default)]
    pub prefilled_invoice_id: String,
}

impl PaymentForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            invoice_id: String::new(),
            amount: String::new(),
            payment_date: today.format("%Y-%m-%d").to_string(),
            method: PaymentMethod::Cash.as_str().to_string(),
            reference: String::new(),
            note: String::new(),
            prefilled_invoice_id: String::new(),
        }
    }

    /// Points the form at the invoice of the selected case unless the
    /// operator typed another invoice.
    pub fn follow_case(&mut self, invoice_id: &InvoiceId) {
        let typed = self.invoice_id.trim();
        if typed.is_empty() || typed == self.prefilled_invoice_id {
            self.invoice_id = invoice_id.to_string();
        }
        self.prefilled_invoice_id = invoice_id.to_string();
    }

    /// Keeps the invoice, date and method for the next payment.
    pub fn clear_after_payment(&mut self) {
        self.amount.clear();
        self.reference.clear();
        self.note.clear();
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl TryFrom<&PaymentForm> for NewPayment {
    type Error = FormError;

    fn try_from(form: &PaymentForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let invoice_id = InvoiceId::parse_optional(&form.invoice_id).ok_or(FormError::InvoiceRequired)?;
        let amount = parse_decimal(&form.amount)
            .filter(|amount| *amount > 0.0)
            .ok_or(FormError::PaymentAmount)?;
        let payment_date = parse_date(&form.payment_date, "payment date")?
            .ok_or(FormError::InvalidDate("payment date"))?;
        let method =
            PaymentMethod::parse(&form.method).ok_or(FormError::UnknownOption("payment method"))?;

        Ok(NewPayment {
            invoice_id,
            amount: format!("{amount:.2}"),
            payment_date,
            method,
            reference: non_blank(&form.reference),
            note: non_blank(&form.note),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
/// Manual action appended to the selected collection case.
pub struct CaseActionForm {
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub note: String,
}

impl Default for CaseActionForm {
    fn default() -> Self {
        Self {
            action_type: ActionType::ReminderSent.as_str().to_string(),
            note: String::new(),
        }
    }
}

impl CaseActionForm {
    /// `case_id` is the currently selected case, if any.
    pub fn to_action(&self, case_id: Option<&CaseId>) -> Result<NewCaseAction, FormError> {
        self.validate()?;
        if case_id.is_none() {
            return Err(FormError::CaseRequired);
        }
        let action_type = ActionType::parse_manual(&self.action_type)
            .ok_or(FormError::UnknownOption("action type"))?;
        let note = non_blank(&self.note);
        if action_type == ActionType::Note && note.is_none() {
            return Err(FormError::NoteRequired);
        }
        Ok(NewCaseAction { action_type, note })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
/// Collections center filters, carried as query parameters; `all` means no filter.
pub struct CaseFilterForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub aging_bucket: String,
    #[serde(default)]
    pub client_id: String,
}

impl CaseFilterForm {
    pub fn to_filter(&self) -> CaseFilter {
        CaseFilter {
            status: CaseStatus::parse(&self.status),
            aging_bucket: AgingBucket::parse(&self.aging_bucket),
            client_id: ClientId::parse_optional(&self.client_id),
        }
    }
}

/// Status change posted for one collection case.
#[derive(Deserialize)]
pub struct CaseStatusForm {
    pub status: String,
}

impl CaseStatusForm {
    pub fn status(&self) -> Result<CaseStatus, FormError> {
        CaseStatus::parse(&self.status).ok_or(FormError::UnknownOption("status"))
    }
}
