use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::offer::{
    InternetAccessType, Offer, OfferComponents, OfferPayload, OfferStatus, ServiceCategory,
};
use crate::domain::types::OfferId;
use crate::forms::{FormError, PositiveInt, checkbox, parse_date, parse_decimal};

#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq)]
/// Offer create/edit form of the console; every category's inputs are posted
/// but only the selected category's are used.
pub struct OfferForm {
    /// Set when the form edits an existing offer.
    #[serde(default)]
    pub editing_offer_id: String,
    #[validate(length(max = 120))]
    pub name: String,
    pub service_category: String,
    #[serde(default)]
    pub mobile_data_gb: String,
    #[serde(default)]
    pub mobile_calls_hours: String,
    #[serde(default)]
    pub internet_access_type: String,
    #[serde(default)]
    pub internet_fiber_speed_mbps: String,
    #[serde(default)]
    pub internet_adsl_speed_mbps: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub internet_tv_included: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub landline_national_included: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub landline_international_enabled: bool,
    #[serde(default)]
    pub landline_international_hours: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub landline_phone_enabled: bool,
    #[serde(default)]
    pub landline_phone_hours: String,
    pub monthly_fee: String,
    #[serde(default)]
    pub activation_fee: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub use_validation_date: bool,
    #[serde(default)]
    pub valid_to: String,
}

impl OfferForm {
    /// Blank form for a new offer.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            editing_offer_id: String::new(),
            name: String::new(),
            service_category: ServiceCategory::Mobile.as_str().to_string(),
            mobile_data_gb: String::new(),
            mobile_calls_hours: String::new(),
            internet_access_type: InternetAccessType::Fiber.as_str().to_string(),
            internet_fiber_speed_mbps: String::new(),
            internet_adsl_speed_mbps: String::new(),
            internet_tv_included: false,
            landline_national_included: true,
            landline_international_enabled: false,
            landline_international_hours: String::new(),
            landline_phone_enabled: false,
            landline_phone_hours: String::new(),
            monthly_fee: "49.90".to_string(),
            activation_fee: "0.00".to_string(),
            status: OfferStatus::Active.as_str().to_string(),
            valid_from: today.format("%Y-%m-%d").to_string(),
            use_validation_date: false,
            valid_to: String::new(),
        }
    }

    /// Form pre-filled from an existing offer for edit mode.
    pub fn from_offer(offer: &Offer) -> Self {
        fn text(value: Option<u32>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        Self {
            editing_offer_id: offer.id.to_string(),
            name: offer.name.clone(),
            service_category: offer.service_category.as_str().to_string(),
            mobile_data_gb: text(offer.mobile_data_gb),
            mobile_calls_hours: text(offer.mobile_calls_hours),
            internet_access_type: offer
                .internet_access_type
                .unwrap_or_default()
                .as_str()
                .to_string(),
            internet_fiber_speed_mbps: text(offer.internet_fiber_speed_mbps),
            internet_adsl_speed_mbps: text(offer.internet_adsl_speed_mbps),
            internet_tv_included: offer.internet_tv_included,
            landline_national_included: offer.landline_national_included,
            landline_international_enabled: offer.landline_international_hours.is_some(),
            landline_international_hours: text(offer.landline_international_hours),
            landline_phone_enabled: offer.landline_phone_hours.is_some(),
            landline_phone_hours: text(offer.landline_phone_hours),
            monthly_fee: offer.monthly_fee.clone(),
            activation_fee: offer.activation_fee.clone(),
            status: offer.status.as_str().to_string(),
            valid_from: offer.valid_from.format("%Y-%m-%d").to_string(),
            use_validation_date: offer.valid_to.is_some(),
            valid_to: offer
                .valid_to
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn editing_offer_id(&self) -> Option<OfferId> {
        OfferId::parse_optional(&self.editing_offer_id)
    }

    pub fn category(&self) -> ServiceCategory {
        ServiceCategory::parse_filter(&self.service_category).unwrap_or_default()
    }

    fn access_type(&self) -> InternetAccessType {
        InternetAccessType::parse(&self.internet_access_type).unwrap_or_default()
    }

    /// Component block of the selected category; blank and invalid numbers read as absent.
    pub fn components(&self) -> OfferComponents {
        let value = |raw: &str| PositiveInt::parse(raw).value();
        match self.category() {
            ServiceCategory::Mobile => OfferComponents::Mobile {
                mobile_data_gb: value(&self.mobile_data_gb),
                mobile_calls_hours: value(&self.mobile_calls_hours),
            },
            ServiceCategory::Internet => {
                let access = self.access_type();
                OfferComponents::Internet {
                    internet_access_type: access,
                    internet_fiber_speed_mbps: (access == InternetAccessType::Fiber)
                        .then(|| value(&self.internet_fiber_speed_mbps))
                        .flatten(),
                    internet_adsl_speed_mbps: (access == InternetAccessType::Adsl)
                        .then(|| value(&self.internet_adsl_speed_mbps))
                        .flatten(),
                    internet_landline_included: true,
                    internet_tv_included: self.internet_tv_included,
                }
            }
            ServiceCategory::Landline => OfferComponents::Landline {
                landline_national_included: self.landline_national_included,
                landline_international_hours: self
                    .landline_international_enabled
                    .then(|| value(&self.landline_international_hours))
                    .flatten(),
                landline_phone_hours: self
                    .landline_phone_enabled
                    .then(|| value(&self.landline_phone_hours))
                    .flatten(),
            },
        }
    }

    fn components_checked(&self) -> Result<OfferComponents, FormError> {
        match self.category() {
            ServiceCategory::Mobile => {
                let data = PositiveInt::parse(&self.mobile_data_gb);
                let calls = PositiveInt::parse(&self.mobile_calls_hours);
                if data == PositiveInt::Invalid {
                    return Err(FormError::MobileData);
                }
                if calls == PositiveInt::Invalid {
                    return Err(FormError::MobileCalls);
                }
                if data == PositiveInt::Empty && calls == PositiveInt::Empty {
                    return Err(FormError::MobileComponents);
                }
            }
            ServiceCategory::Internet => match self.access_type() {
                InternetAccessType::Fiber => {
                    if PositiveInt::parse(&self.internet_fiber_speed_mbps).value().is_none() {
                        return Err(FormError::FiberSpeed);
                    }
                }
                InternetAccessType::Adsl => {
                    if PositiveInt::parse(&self.internet_adsl_speed_mbps).value().is_none() {
                        return Err(FormError::AdslSpeed);
                    }
                }
            },
            ServiceCategory::Landline => {
                let gated = |enabled: bool, raw: &str| {
                    if enabled {
                        PositiveInt::parse(raw)
                    } else {
                        PositiveInt::Empty
                    }
                };
                let international = gated(
                    self.landline_international_enabled,
                    &self.landline_international_hours,
                );
                let phone = gated(self.landline_phone_enabled, &self.landline_phone_hours);
                if international == PositiveInt::Invalid {
                    return Err(FormError::LandlineInternational);
                }
                if phone == PositiveInt::Invalid {
                    return Err(FormError::LandlinePhone);
                }
                if !self.landline_national_included
                    && international == PositiveInt::Empty
                    && phone == PositiveInt::Empty
                {
                    return Err(FormError::LandlineComponents);
                }
            }
        }
        Ok(self.components())
    }

    /// Live preview of the bundled components.
    pub fn preview(&self) -> String {
        self.components().summary()
    }

    /// Validates the form and builds the create/update body.
    ///
    /// `version` is the version of the offer being edited, 1 for a new offer.
    pub fn into_payload(self, version: u32) -> Result<OfferPayload, FormError> {
        self.validate()?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::OfferNameRequired);
        }
        if !parse_decimal(&self.monthly_fee).is_some_and(|fee| fee > 0.0) {
            return Err(FormError::MonthlyFee);
        }
        let activation_fee = if self.activation_fee.trim().is_empty() {
            "0.00".to_string()
        } else {
            self.activation_fee.trim().to_string()
        };
        if !parse_decimal(&activation_fee).is_some_and(|fee| fee >= 0.0) {
            return Err(FormError::ActivationFee);
        }

        let valid_from = parse_date(&self.valid_from, "valid from")?
            .ok_or(FormError::InvalidDate("valid from"))?;
        let valid_to = if self.use_validation_date {
            let valid_to = parse_date(&self.valid_to, "validation date")?
                .ok_or(FormError::ValidToRequired)?;
            if valid_to < valid_from {
                return Err(FormError::ValidToBeforeValidFrom);
            }
            Some(valid_to)
        } else {
            None
        };

        let components = self.components_checked()?;
        let status = OfferStatus::parse(&self.status).ok_or(FormError::UnknownOption("status"))?;

        Ok(OfferPayload {
            name: name.to_string(),
            service_category: self.category(),
            version,
            monthly_fee: self.monthly_fee.trim().to_string(),
            activation_fee,
            status,
            valid_from,
            valid_to,
            components,
        })
    }
}

/// Status change posted from the offer list.
#[derive(Deserialize)]
pub struct OfferStatusForm {
    pub status: String,
}

impl OfferStatusForm {
    pub fn status(&self) -> Result<OfferStatus, FormError> {
        OfferStatus::parse(&self.status).ok_or(FormError::UnknownOption("status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn mobile_form() -> OfferForm {
        let mut form = OfferForm::new(today());
        form.name = "  Mobile 20  ".to_string();
        form.mobile_data_gb = "20".to_string();
        form
    }

    #[test]
    fn valid_mobile_offer_builds_payload() {
        let payload = mobile_form().into_payload(1).unwrap();
        assert_eq!(payload.name, "Mobile 20");
        assert_eq!(payload.version, 1);
        assert_eq!(payload.valid_from, today());
        assert_eq!(
            payload.components,
            OfferComponents::Mobile {
                mobile_data_gb: Some(20),
                mobile_calls_hours: None
            }
        );
    }

    #[test]
    fn checks_run_in_order() {
        let mut form = mobile_form();
        form.name = " ".to_string();
        form.monthly_fee = "0".to_string();
        assert_eq!(form.into_payload(1), Err(FormError::OfferNameRequired));

        let mut form = mobile_form();
        form.monthly_fee = "abc".to_string();
        assert_eq!(form.into_payload(1), Err(FormError::MonthlyFee));

        let mut form = mobile_form();
        form.activation_fee = "-1".to_string();
        assert_eq!(form.into_payload(1), Err(FormError::ActivationFee));

        let mut form = mobile_form();
        form.use_validation_date = true;
        assert_eq!(form.into_payload(1), Err(FormError::ValidToRequired));

        let mut form = mobile_form();
        form.use_validation_date = true;
        form.valid_to = "2026-02-01".to_string();
        assert_eq!(form.into_payload(1), Err(FormError::ValidToBeforeValidFrom));
    }

    #[test]
    fn mobile_components_are_validated() {
        let mut form = mobile_form();
        form.mobile_data_gb = "1.5".to_string();
        assert_eq!(form.into_payload(1), Err(FormError::MobileData));

        let mut form = mobile_form();
        form.mobile_calls_hours = "0".to_string();
        assert_eq!(form.into_payload(1), Err(FormError::MobileCalls));

        let mut form = mobile_form();
        form.mobile_data_gb.clear();
        assert_eq!(form.into_payload(1), Err(FormError::MobileComponents));
    }

    #[test]
    fn internet_offer_requires_speed_of_selected_access() {
        let mut form = mobile_form();
        form.service_category = "internet".to_string();
        form.internet_access_type = "adsl".to_string();
        form.internet_fiber_speed_mbps = "100".to_string();
        assert_eq!(form.clone().into_payload(1), Err(FormError::AdslSpeed));

        form.internet_adsl_speed_mbps = "20".to_string();
        form.internet_tv_included = true;
        let payload = form.into_payload(3).unwrap();
        assert_eq!(payload.version, 3);
        assert_eq!(
            payload.components,
            OfferComponents::Internet {
                internet_access_type: InternetAccessType::Adsl,
                internet_fiber_speed_mbps: None,
                internet_adsl_speed_mbps: Some(20),
                internet_landline_included: true,
                internet_tv_included: true,
            }
        );
    }

    #[test]
    fn disabled_landline_hours_are_ignored() {
        let mut form = mobile_form();
        form.service_category = "landline".to_string();
        form.landline_national_included = false;
        form.landline_international_hours = "oops".to_string();
        assert_eq!(form.clone().into_payload(1), Err(FormError::LandlineComponents));

        form.landline_international_enabled = true;
        assert_eq!(
            form.clone().into_payload(1),
            Err(FormError::LandlineInternational)
        );

        form.landline_international_hours = "10".to_string();
        assert_eq!(form.preview(), "International 10h");
        assert!(form.into_payload(1).is_ok());
    }

    #[test]
    fn edit_form_is_prefilled_from_offer() {
        let offer: Offer = serde_json::from_value(serde_json::json!({
            "id": "o-7",
            "name": "Home Plus",
            "service_category": "landline",
            "service_type": "landline",
            "mobile_data_gb": null,
            "mobile_calls_hours": null,
            "internet_access_type": null,
            "internet_fiber_speed_mbps": null,
            "internet_adsl_speed_mbps": null,
            "landline_national_included": true,
            "landline_international_hours": null,
            "landline_phone_hours": 4,
            "version": 2,
            "monthly_fee": "79.00",
            "activation_fee": "0.00",
            "status": "active",
            "valid_from": "2026-01-01",
            "valid_to": "2026-12-31",
            "created_at": "",
            "updated_at": ""
        }))
        .unwrap();

        let form = OfferForm::from_offer(&offer);
        assert_eq!(form.editing_offer_id(), OfferId::parse_optional("o-7"));
        assert!(form.landline_phone_enabled);
        assert!(!form.landline_international_enabled);
        assert!(form.use_validation_date);
        assert_eq!(form.preview(), "National unlimited + Phone 4h");

        let payload = form.into_payload(offer.version).unwrap();
        assert_eq!(payload.version, 2);
        assert_eq!(payload.components, offer.components());
        assert_eq!(OfferForm::new(today()).preview(), "-");
    }
}
