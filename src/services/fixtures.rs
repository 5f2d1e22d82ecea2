//! Backend records used by the service tests.

use chrono::NaiveDate;

use crate::api::ListEnvelope;
use crate::domain::billing::{Invoice, InvoiceDetail, InvoiceStatus};
use crate::domain::client::{
    Client, ClientStatus, ClientType, ServiceType, Subscriber, SubscriberStatus,
};
use crate::domain::collections::{AgingBucket, CaseStatus, CollectionCase};
use crate::domain::contract::{Contract, ContractStatus};
use crate::domain::offer::{Offer, OfferStatus, ServiceCategory};
use crate::domain::types::{
    CaseId, ClientId, ContractId, InvoiceId, OfferId, SubscriberId,
};

pub fn envelope<T>(data: Vec<T>) -> ListEnvelope<T> {
    ListEnvelope {
        data,
        meta: Default::default(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn client(id: &str) -> Client {
    Client {
        id: ClientId::new(id).unwrap(),
        client_type: ClientType::Individual,
        full_name: format!("Client {id}"),
        address: None,
        email: None,
        phone: None,
        is_delinquent: false,
        status: ClientStatus::Active,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

pub fn subscriber(id: &str, client_id: &str, service_type: ServiceType) -> Subscriber {
    Subscriber {
        id: SubscriberId::new(id).unwrap(),
        client_id: ClientId::new(client_id).unwrap(),
        service_type,
        service_identifier: format!("+2126000000{id}"),
        status: SubscriberStatus::Active,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub fn mobile_offer(id: &str) -> Offer {
    Offer {
        id: OfferId::new(id).unwrap(),
        name: format!("Mobile {id}"),
        service_category: ServiceCategory::Mobile,
        service_type: ServiceType::Mobile,
        mobile_data_gb: Some(20),
        mobile_calls_hours: None,
        internet_access_type: None,
        internet_fiber_speed_mbps: None,
        internet_adsl_speed_mbps: None,
        internet_landline_included: false,
        internet_tv_included: false,
        landline_national_included: false,
        landline_international_hours: None,
        landline_phone_hours: None,
        version: 3,
        monthly_fee: "99.00".to_string(),
        activation_fee: "0.00".to_string(),
        status: OfferStatus::Active,
        valid_from: date(2026, 1, 1),
        valid_to: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub fn contract(id: &str, client_id: &str, subscriber_id: &str) -> Contract {
    Contract {
        id: ContractId::new(id).unwrap(),
        client_id: ClientId::new(client_id).unwrap(),
        subscriber_id: SubscriberId::new(subscriber_id).unwrap(),
        offer_id: OfferId::new("o-old").unwrap(),
        status: ContractStatus::Active,
        start_date: date(2025, 6, 1),
        end_date: None,
        commitment_months: Some(12),
        activated_at: None,
        terminated_at: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

pub fn invoice(id: &str, issued_at: &str) -> Invoice {
    Invoice {
        id: InvoiceId::new(id).unwrap(),
        billing_run_id: Some("run-1".to_string()),
        client_id: ClientId::new("cl-1").unwrap(),
        period_start: date(2026, 1, 1),
        period_end: date(2026, 1, 31),
        due_date: date(2026, 2, 15),
        status: InvoiceStatus::Issued,
        currency: "MAD".to_string(),
        subtotal_amount: "100.00".to_string(),
        tax_amount: "20.00".to_string(),
        total_amount: "120.00".to_string(),
        issued_at: issued_at.to_string(),
        pdf_file_name: None,
    }
}

pub fn invoice_detail(id: &str) -> InvoiceDetail {
    InvoiceDetail {
        invoice: invoice(id, "2026-02-01T00:00:00Z"),
        lines: Vec::new(),
    }
}

pub fn case(id: &str, invoice_id: &str, days_past_due: u32, updated_at: &str) -> CollectionCase {
    CollectionCase {
        id: CaseId::new(id).unwrap(),
        invoice_id: InvoiceId::new(invoice_id).unwrap(),
        client_id: ClientId::new("cl-1").unwrap(),
        status: CaseStatus::Open,
        reason: None,
        days_past_due,
        aging_bucket: AgingBucket::Days1To30,
        outstanding_amount: "120.00".to_string(),
        opened_at: String::new(),
        last_action_at: None,
        closed_at: None,
        created_at: String::new(),
        updated_at: updated_at.to_string(),
    }
}
