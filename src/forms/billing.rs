use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingRunRequest, InvoiceFilter};
use crate::domain::offer::{Offer, ServiceCategory};
use crate::domain::types::{ClientId, OfferId};
use crate::forms::{FormError, parse_date, parse_decimal};

const MAX_DUE_DAYS: u32 = 90;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
/// Billing run form of the invoice center.
pub struct BillingRunForm {
    #[serde(default)]
    pub period_start: String,
    #[serde(default)]
    pub period_end: String,
    #[serde(default)]
    pub due_days: String,
    #[serde(default)]
    pub tax_rate: String,
}

impl BillingRunForm {
    /// Current calendar month, 15 due days, no tax.
    pub fn new(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);
        Self {
            period_start: start.format("%Y-%m-%d").to_string(),
            period_end: end.format("%Y-%m-%d").to_string(),
            due_days: "15".to_string(),
            tax_rate: "0.00".to_string(),
        }
    }
}

impl TryFrom<BillingRunForm> for BillingRunRequest {
    type Error = FormError;

    fn try_from(form: BillingRunForm) -> Result<Self, Self::Error> {
        let start = parse_date(&form.period_start, "period start")?;
        let end = parse_date(&form.period_end, "period end")?;
        let (Some(period_start), Some(period_end)) = (start, end) else {
            return Err(FormError::BillingPeriodRequired);
        };
        if period_end < period_start {
            return Err(FormError::BillingPeriodOrder);
        }
        let due_days = form
            .due_days
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|days| (1..=MAX_DUE_DAYS).contains(days))
            .ok_or(FormError::DueDays)?;
        let tax_rate = parse_decimal(&form.tax_rate)
            .filter(|rate| (0.0..=1.0).contains(rate))
            .ok_or(FormError::TaxRate)?;

        Ok(BillingRunRequest {
            period_start,
            period_end,
            due_days,
            tax_rate: format!("{tax_rate:.2}"),
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
/// Invoice center filters, carried as query parameters.
pub struct InvoiceFilterForm {
    #[serde(default)]
    pub client_id: String,
    /// `all` or a service category.
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub offer_id: String,
}

impl InvoiceFilterForm {
    pub fn service(&self) -> Option<ServiceCategory> {
        ServiceCategory::parse_filter(&self.service)
    }

    /// Offers selectable in the offer filter for the chosen service.
    pub fn selectable_offers<'a>(&self, offers: &'a [Offer]) -> Vec<&'a Offer> {
        let service = self.service();
        offers
            .iter()
            .filter(|offer| service.is_none_or(|s| offer.service_category == s))
            .collect()
    }

    /// Drops an offer filter that no longer belongs to the selected service.
    pub fn reconcile(&mut self, offers: &[Offer]) {
        let Some(offer_id) = OfferId::parse_optional(&self.offer_id) else {
            self.offer_id.clear();
            return;
        };
        if !self
            .selectable_offers(offers)
            .iter()
            .any(|offer| offer.id == offer_id)
        {
            self.offer_id.clear();
        }
    }

    pub fn to_filter(&self) -> InvoiceFilter {
        InvoiceFilter {
            client_id: ClientId::parse_optional(&self.client_id),
            service: self.service(),
            offer_id: OfferId::parse_optional(&self.offer_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_filter() == InvoiceFilter::default()
    }
}
