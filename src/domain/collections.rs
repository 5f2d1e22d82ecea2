//! Collections: overdue cases, their action log and incoming payments.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::billing::InvoiceStatus;
use crate::domain::types::{CaseId, ClientId, InvoiceId};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }
}

impl Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse days-past-due range.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "1_30")]
    Days1To30,
    #[serde(rename = "31_60")]
    Days31To60,
    #[serde(rename = "61_90")]
    Days61To90,
    #[serde(rename = "90_plus")]
    Days90Plus,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        Self::Current,
        Self::Days1To30,
        Self::Days31To60,
        Self::Days61To90,
        Self::Days90Plus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Days1To30 => "1_30",
            Self::Days31To60 => "31_60",
            Self::Days61To90 => "61_90",
            Self::Days90Plus => "90_plus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::Days1To30 => "1-30 days",
            Self::Days31To60 => "31-60 days",
            Self::Days61To90 => "61-90 days",
            Self::Days90Plus => "90+ days",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == value.trim())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CollectionCase {
    pub id: CaseId,
    pub invoice_id: InvoiceId,
    pub client_id: ClientId,
    pub status: CaseStatus,
    pub reason: Option<String>,
    pub days_past_due: u32,
    pub aging_bucket: AgingBucket,
    pub outstanding_amount: String,
    pub opened_at: String,
    pub last_action_at: Option<String>,
    pub closed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Orders cases by days past due (desc), then most recently updated first.
pub fn sort_cases(cases: &mut [CollectionCase]) {
    cases.sort_by(|a, b| {
        b.days_past_due
            .cmp(&a.days_past_due)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CaseOpened,
    CaseReopened,
    PaymentRecorded,
    StatusUpdated,
    ReminderSent,
    WarningSent,
    Note,
    CaseResolved,
    CaseClosed,
}

impl ActionType {
    /// Action kinds an operator can append manually.
    pub const MANUAL: [ActionType; 3] = [Self::ReminderSent, Self::WarningSent, Self::Note];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaseOpened => "case_opened",
            Self::CaseReopened => "case_reopened",
            Self::PaymentRecorded => "payment_recorded",
            Self::StatusUpdated => "status_updated",
            Self::ReminderSent => "reminder_sent",
            Self::WarningSent => "warning_sent",
            Self::Note => "note",
            Self::CaseResolved => "case_resolved",
            Self::CaseClosed => "case_closed",
        }
    }

    pub fn parse_manual(value: &str) -> Option<Self> {
        Self::MANUAL.into_iter().find(|a| a.as_str() == value.trim())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CaseAction {
    pub id: String,
    pub case_id: CaseId,
    pub action_type: ActionType,
    pub actor_id: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewCaseAction {
    pub action_type: ActionType,
    pub note: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct CaseStatusUpdate {
    pub status: CaseStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct CollectionsOverview {
    pub open_cases: u32,
    pub in_progress_cases: u32,
    pub overdue_invoices: u32,
    pub total_outstanding_amount: String,
    #[serde(default)]
    pub bucket_totals: BTreeMap<String, String>,
}

/// Filters of the collections center, sent as query parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub aging_bucket: Option<AgingBucket>,
    pub client_id: Option<ClientId>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    BankTransfer,
    Wallet,
    Other,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        Self::Cash,
        Self::Card,
        Self::BankTransfer,
        Self::Wallet,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Wallet => "wallet",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value.trim())
    }
}

/// Body of `POST /collections/payments`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewPayment {
    pub invoice_id: InvoiceId,
    pub amount: String,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body of `POST /collections/invoices/{id}/approve-paid`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ApprovePaid {
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub note: String,
}

impl ApprovePaid {
    pub fn on(payment_date: NaiveDate) -> Self {
        Self {
            payment_date,
            method: PaymentMethod::Other,
            note: "Invoice approved as paid from invoice center".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub invoice_id: InvoiceId,
    pub client_id: ClientId,
    pub amount: String,
    pub currency: String,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub status: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PaymentAllocationResult {
    pub payment: Payment,
    pub invoice_status: InvoiceStatus,
    pub outstanding_amount: String,
    pub allocation_state: String,
    pub collection_case_status: Option<CaseStatus>,
    #[serde(default)]
    pub idempotency_replayed: bool,
}

impl PaymentAllocationResult {
    pub fn summary(&self) -> String {
        if self.idempotency_replayed {
            "Payment replay detected: existing transaction returned.".to_string()
        } else {
            format!("Payment recorded. Invoice is now {}.", self.invoice_status)
        }
    }

    pub fn approval_summary(&self) -> &'static str {
        if self.idempotency_replayed {
            "Payment approval replayed; invoice already settled."
        } else {
            "Invoice approved as paid and payment recorded."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, days: u32, updated_at: &str) -> CollectionCase {
        CollectionCase {
            id: CaseId::new(id).unwrap(),
            invoice_id: InvoiceId::new("inv").unwrap(),
            client_id: ClientId::new("cl").unwrap(),
            status: CaseStatus::Open,
            reason: None,
            days_past_due: days,
            aging_bucket: AgingBucket::Days1To30,
            outstanding_amount: "10.00".to_string(),
            opened_at: String::new(),
            last_action_at: None,
            closed_at: None,
            created_at: String::new(),
            updated_at: updated_at.to_string(),
        }
    }

    #[test]
    fn cases_sort_by_days_then_recency() {
        let mut cases = vec![
            case("a", 10, "2026-01-01T00:00:00Z"),
            case("b", 45, "2026-01-01T00:00:00Z"),
            case("c", 10, "2026-03-01T00:00:00Z"),
        ];
        sort_cases(&mut cases);
        let ids: Vec<&str> = cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn aging_bucket_uses_backend_codes() {
        let bucket: AgingBucket = serde_json::from_value(serde_json::json!("90_plus")).unwrap();
        assert_eq!(bucket, AgingBucket::Days90Plus);
        assert_eq!(bucket.label(), "90+ days");
        assert_eq!(AgingBucket::parse("31_60"), Some(AgingBucket::Days31To60));
    }

    #[test]
    fn only_manual_actions_are_parsed_from_forms() {
        assert_eq!(ActionType::parse_manual("note"), Some(ActionType::Note));
        assert_eq!(ActionType::parse_manual("case_closed"), None);
    }
}
