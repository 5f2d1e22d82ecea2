//! Self-service ("landing") payloads exchanged with the backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::offer::ServiceCategory;
use crate::domain::types::{Cin, ContractId, InvoiceId, LookupToken, OfferId};

/// Offer as exposed to end customers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OfferSummary {
    pub id: OfferId,
    pub name: String,
    pub service_category: ServiceCategory,
    pub service_type: String,
    pub monthly_fee: String,
    pub activation_fee: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OfferCategory {
    pub service_category: ServiceCategory,
    pub offers: Vec<OfferSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Bootstrap {
    pub offer_categories: Vec<OfferCategory>,
}

impl Bootstrap {
    pub fn offers_for(&self, category: ServiceCategory) -> &[OfferSummary] {
        self.offer_categories
            .iter()
            .find(|c| c.service_category == category)
            .map(|c| c.offers.as_slice())
            .unwrap_or_default()
    }

    pub fn find_offer(&self, category: ServiceCategory, offer_id: &OfferId) -> Option<&OfferSummary> {
        self.offers_for(category).iter().find(|o| &o.id == offer_id)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyCinRequest {
    pub cin: Cin,
}

/// Result of a CIN verification. Only the masked contact is ever shown.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CinVerification {
    pub cin: String,
    pub masked_contact: String,
    pub lookup_token: LookupToken,
    pub expires_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LookupClient {
    pub cin: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LookupSubscription {
    pub contract_id: ContractId,
    pub service_identifier: String,
    pub service_category: ServiceCategory,
    pub current_offer: OfferSummary,
    #[serde(default)]
    pub eligible_offers: Vec<OfferSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionsLookup {
    pub client: LookupClient,
    pub subscriptions: Vec<LookupSubscription>,
}

impl SubscriptionsLookup {
    pub fn subscription(&self, contract_id: &ContractId) -> Option<&LookupSubscription> {
        self.subscriptions
            .iter()
            .find(|s| &s.contract_id == contract_id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BillingInvoiceSummary {
    pub invoice_id: InvoiceId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub issued_at: String,
    pub status: String,
    pub currency: String,
    pub subtotal_amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    pub document_download_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BillingLookup {
    pub client: LookupClient,
    pub invoices: Vec<BillingInvoiceSummary>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MobileNumberMode {
    UseExisting,
    #[default]
    AssignNew,
}

/// Line-number block of a new-subscription submission.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum LineNumberRequest {
    ExistingMobile {
        mobile_number_mode: MobileNumberMode,
        existing_mobile_local_number: String,
    },
    NewMobile {
        mobile_number_mode: MobileNumberMode,
        requested_mobile_local_number: String,
    },
    HomeLandline {
        home_landline_local_number: String,
    },
}

/// Body of `POST /landing/submit/new`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewSubscriptionRequest {
    pub service_category: ServiceCategory,
    pub offer_id: OfferId,
    pub cin: Cin,
    pub full_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub contract_start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment_months: Option<u32>,
    #[serde(flatten)]
    pub line: LineNumberRequest,
}

/// Body of `POST /landing/submit/plan-change`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PlanChangeRequest {
    pub cin: String,
    pub source_contract_id: ContractId,
    pub target_offer_id: OfferId,
    pub contract_start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment_months: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContractRef {
    pub id: ContractId,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmitResponse {
    pub contract: ContractRef,
    pub client_cin: String,
    pub service_identifier: String,
    pub provisioning_mode: String,
    #[serde(default)]
    pub document_download_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DocumentLinkRequest {
    pub cin: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentLink {
    pub contract_id: ContractId,
    pub document_download_url: String,
}

/// Turns a tokenized document path into an absolute URL against `api_base`.
pub fn to_download_url(api_base: &str, path: Option<&str>) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if path.starts_with("http://") || path.starts_with("https://") {
        Some(path.to_string())
    } else {
        Some(format!("{}{}", api_base.trim_end_matches('/'), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_download_paths_are_prefixed_with_api_base() {
        assert_eq!(
            to_download_url("http://localhost:8010/", Some("/api/v1/documents/x?token=t")),
            Some("http://localhost:8010/api/v1/documents/x?token=t".to_string())
        );
        assert_eq!(
            to_download_url("http://localhost:8010", Some("https://cdn.example/doc.pdf")),
            Some("https://cdn.example/doc.pdf".to_string())
        );
        assert_eq!(to_download_url("http://localhost:8010", None), None);
        assert_eq!(to_download_url("http://localhost:8010", Some("  ")), None);
    }

    #[test]
    fn new_subscription_flattens_line_block() {
        let request = NewSubscriptionRequest {
            service_category: ServiceCategory::Mobile,
            offer_id: OfferId::new("o-1").unwrap(),
            cin: Cin::new("ab1234").unwrap(),
            full_name: "Amina Alaoui".to_string(),
            email: None,
            address: None,
            contact_phone: Some("+212612345678".to_string()),
            contract_start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            commitment_months: Some(12),
            line: LineNumberRequest::ExistingMobile {
                mobile_number_mode: MobileNumberMode::UseExisting,
                existing_mobile_local_number: "612345678".to_string(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["cin"], "AB1234");
        assert_eq!(json["mobile_number_mode"], "use_existing");
        assert_eq!(json["existing_mobile_local_number"], "612345678");
        assert!(json["email"].is_null());
        assert!(json.get("home_landline_local_number").is_none());
    }

    #[test]
    fn bootstrap_filters_offers_by_category() {
        let bootstrap: Bootstrap = serde_json::from_value(serde_json::json!({
            "offer_categories": [{
                "service_category": "internet",
                "offers": [{
                    "id": "o-9",
                    "name": "Fiber 100",
                    "service_category": "internet",
                    "service_type": "fiber",
                    "monthly_fee": "299.00",
                    "activation_fee": "0.00"
                }]
            }]
        }))
        .unwrap();
        assert!(bootstrap.offers_for(ServiceCategory::Mobile).is_empty());
        let id = OfferId::new("o-9").unwrap();
        assert!(bootstrap.find_offer(ServiceCategory::Internet, &id).is_some());
    }
}
