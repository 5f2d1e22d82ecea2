use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClientId, ContractId, InvoiceId, OfferId};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Issued,
    Paid,
    Overdue,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Void => "void",
        }
    }

    /// Whether an operator may still approve the invoice as paid.
    pub fn is_payable(&self) -> bool {
        matches!(self, Self::Issued | Self::Overdue)
    }
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub billing_run_id: Option<String>,
    pub client_id: ClientId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub currency: String,
    pub subtotal_amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    pub issued_at: String,
    pub pdf_file_name: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceLineType {
    Recurring,
    Activation,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLine {
    pub id: String,
    pub invoice_id: InvoiceId,
    pub contract_id: Option<ContractId>,
    pub line_type: InvoiceLineType,
    pub description: String,
    pub quantity: String,
    pub unit_amount: String,
    pub line_total: String,
}

/// Invoice with its lines, as returned by the detail endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
}

/// Filters of the invoice center, sent as query parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceFilter {
    pub client_id: Option<ClientId>,
    pub service: Option<crate::domain::offer::ServiceCategory>,
    pub offer_id: Option<OfferId>,
}

/// Body of `POST /billing/runs`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BillingRunRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_days: u32,
    pub tax_rate: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BillingRunResult {
    pub billing_run_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub invoice_count: u32,
    pub subtotal_amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    #[serde(default)]
    pub invoice_ids: Vec<InvoiceId>,
    #[serde(default)]
    pub idempotency_replayed: bool,
}

impl BillingRunResult {
    pub fn summary(&self) -> String {
        if self.idempotency_replayed {
            format!("Billing run replayed: {} invoices.", self.invoice_count)
        } else {
            format!(
                "Billing run completed: {} invoices issued.",
                self.invoice_count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_detail_reads_flat_lines() {
        let detail: InvoiceDetail = serde_json::from_value(serde_json::json!({
            "id": "inv-1",
            "billing_run_id": "run-1",
            "client_id": "cl-1",
            "period_start": "2026-01-01",
            "period_end": "2026-01-31",
            "due_date": "2026-02-15",
            "status": "issued",
            "currency": "MAD",
            "subtotal_amount": "100.00",
            "tax_amount": "20.00",
            "total_amount": "120.00",
            "issued_at": "2026-02-01T00:00:00Z",
            "pdf_file_name": null,
            "lines": [{
                "id": "l-1",
                "invoice_id": "inv-1",
                "contract_id": "c-1",
                "line_type": "recurring",
                "description": "Monthly fee",
                "quantity": "1",
                "unit_amount": "100.00",
                "line_total": "100.00"
            }]
        }))
        .unwrap();
        assert_eq!(detail.invoice.id.as_str(), "inv-1");
        assert_eq!(detail.lines.len(), 1);
        assert!(detail.invoice.status.is_payable());
    }

    #[test]
    fn billing_summary_distinguishes_replay() {
        let mut result = BillingRunResult {
            billing_run_id: "run-1".to_string(),
            period_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            invoice_count: 3,
            subtotal_amount: "0".to_string(),
            tax_amount: "0".to_string(),
            total_amount: "0".to_string(),
            invoice_ids: vec![],
            idempotency_replayed: false,
        };
        assert_eq!(result.summary(), "Billing run completed: 3 invoices issued.");
        result.idempotency_replayed = true;
        assert_eq!(result.summary(), "Billing run replayed: 3 invoices.");
    }
}
