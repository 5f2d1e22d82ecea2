//! Forms posted by the self-service portal.

use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::domain::landing::MobileNumberMode;
use crate::domain::offer::ServiceCategory;
use crate::domain::types::{ContractId, OfferId};
use crate::domain::wizard::{Flow, IdentityDetails, IdentityInput};
use crate::forms::{FormError, parse_date};

#[derive(Deserialize)]
pub struct FlowForm {
    pub flow: String,
}

impl FlowForm {
    pub fn flow(&self) -> Result<Flow, FormError> {
        Flow::parse(&self.flow).ok_or(FormError::UnknownOption("flow"))
    }
}

#[derive(Deserialize)]
pub struct ServiceForm {
    pub service: String,
}

impl ServiceForm {
    pub fn service(&self) -> Result<ServiceCategory, FormError> {
        ServiceCategory::parse_filter(&self.service).ok_or(FormError::UnknownOption("service"))
    }
}

#[derive(Deserialize)]
pub struct OfferChoiceForm {
    #[serde(default)]
    pub offer_id: String,
}

impl OfferChoiceForm {
    pub fn offer_id(&self) -> Option<OfferId> {
        OfferId::parse_optional(&self.offer_id)
    }
}

/// What a step's submit button asks for.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepIntent {
    /// Store the choice and re-render the same step.
    Select,
    #[default]
    Continue,
}

#[derive(Deserialize)]
pub struct PhoneForm {
    pub mobile_mode: MobileNumberMode,
    #[serde(default)]
    pub intent: StepIntent,
}

#[derive(Deserialize, Validate)]
pub struct IdentityForm {
    #[serde(default)]
    #[validate(length(max = 40))]
    pub cin: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 300))]
    pub address: String,
    /// Only rendered when the visitor keeps an existing mobile number.
    pub existing_mobile: Option<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub commitment_months: String,
}

impl IdentityForm {
    /// `fallback_start` is used when the date input is left empty.
    pub fn into_input(self, fallback_start: NaiveDate) -> Result<IdentityInput, FormError> {
        self.validate()?;
        let start_date = parse_date(&self.start_date, "start date")?.unwrap_or(fallback_start);
        Ok(IdentityInput {
            details: IdentityDetails {
                cin: self.cin,
                full_name: self.full_name,
                email: self.email,
                address: self.address,
            },
            existing_mobile_input: self.existing_mobile,
            start_date,
            commitment_months: self.commitment_months,
        })
    }
}

#[derive(Deserialize)]
pub struct CinForm {
    #[serde(default)]
    pub cin: String,
}

#[derive(Deserialize)]
pub struct PlanOfferForm {
    #[serde(default)]
    pub source_contract_id: String,
    #[serde(default)]
    pub target_offer_id: String,
    #[serde(default)]
    pub intent: StepIntent,
}

impl PlanOfferForm {
    pub fn source(&self) -> Option<ContractId> {
        ContractId::parse_optional(&self.source_contract_id)
    }

    pub fn target(&self) -> Option<OfferId> {
        OfferId::parse_optional(&self.target_offer_id)
    }
}

#[derive(Deserialize)]
pub struct PlanSubmitForm {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub commitment_months: String,
}

impl PlanSubmitForm {
    pub fn start_date(&self, fallback: NaiveDate) -> Result<NaiveDate, FormError> {
        Ok(parse_date(&self.start_date, "start date")?.unwrap_or(fallback))
    }
}
