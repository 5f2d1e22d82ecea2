use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::client::{ClientStatus, ClientType, NewClient};
use crate::domain::contract::{ContractStatus, NewSubscriberRef, ProvisionRequest};
use crate::domain::types::{ClientEmail, ClientId, ContractId, FullName, OfferId, PhoneNumber};
use crate::forms::{FormError, PositiveInt, checkbox, parse_date};

/// Shortest accepted full name of a client created during provisioning.
const MIN_FULL_NAME_LEN: usize = 3;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    #[default]
    Existing,
    New,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, PartialEq)]
/// Contract provisioning draft. Posted on every change so the target contract
/// and mode can be re-derived, and kept in the session between requests.
pub struct ProvisionForm {
    #[serde(default)]
    pub client_mode: ClientMode,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub offer_id: String,
    #[serde(default)]
    pub contract_start_date: String,
    #[serde(default)]
    pub commitment_months: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub auto_activate: bool,
    #[serde(default)]
    pub target_contract_id: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub new_service_identifier: String,
    #[serde(default)]
    pub client_type: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ProvisionForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            contract_start_date: today.format("%Y-%m-%d").to_string(),
            commitment_months: "12".to_string(),
            auto_activate: true,
            client_type: "individual".to_string(),
            ..Self::default()
        }
    }

    pub fn existing_client_flow(&self) -> bool {
        self.client_mode == ClientMode::Existing
    }

    pub fn client_id(&self) -> Option<ClientId> {
        ClientId::parse_optional(&self.client_id)
    }

    pub fn offer_id(&self) -> Option<OfferId> {
        OfferId::parse_optional(&self.offer_id)
    }

    pub fn target_contract_id(&self) -> Option<ContractId> {
        ContractId::parse_optional(&self.target_contract_id)
    }

    /// `first last`, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn service_identifier(&self) -> &str {
        self.new_service_identifier.trim()
    }

    /// Contact email of a new client; blank means none was given.
    fn new_client_email(&self) -> Result<Option<ClientEmail>, FormError> {
        if self.email.trim().is_empty() {
            return Ok(None);
        }
        ClientEmail::new(self.email.as_str())
            .map(Some)
            .map_err(|_| FormError::NewClientEmail)
    }

    fn new_client_phone(&self) -> Result<Option<PhoneNumber>, FormError> {
        if self.phone.trim().is_empty() {
            return Ok(None);
        }
        PhoneNumber::new(self.phone.as_str())
            .map(Some)
            .map_err(|_| FormError::NewClientPhone)
    }

    /// Checks that do not depend on backend data, in banner order.
    pub fn check_selection(&self) -> Result<(), FormError> {
        self.validate()?;
        if self.offer_id().is_none() {
            return Err(FormError::OfferRequired);
        }
        if self.existing_client_flow() && self.client_id().is_none() {
            return Err(FormError::ClientRequired);
        }
        if !self.existing_client_flow() && self.full_name().chars().count() < MIN_FULL_NAME_LEN {
            return Err(FormError::NewClientName);
        }
        Ok(())
    }

    /// Builds the provision body once the draft passed [`Self::check_selection`]
    /// and the target contract has been reconciled.
    pub fn build_request(
        &self,
        target_contract_id: Option<ContractId>,
    ) -> Result<ProvisionRequest, FormError> {
        self.check_selection()?;
        let offer_id = self.offer_id().ok_or(FormError::OfferRequired)?;
        let contract_start_date = parse_date(&self.contract_start_date, "contract start date")?
            .ok_or(FormError::InvalidDate("contract start date"))?;
        let commitment_months = match PositiveInt::parse(&self.commitment_months) {
            PositiveInt::Empty => None,
            PositiveInt::Value(months) => Some(months),
            PositiveInt::Invalid => return Err(FormError::CommitmentMonths),
        };

        let (client_id, client, target_contract_id) = if self.existing_client_flow() {
            (self.client_id(), None, target_contract_id)
        } else {
            let client_type =
                ClientType::parse(&self.client_type).ok_or(FormError::UnknownOption("client type"))?;
            let client = NewClient::new(
                client_type,
                FullName::new(self.full_name())?,
                Some(self.address.clone()),
                self.new_client_email()?,
                self.new_client_phone()?,
            );
            (None, Some(client), None)
        };

        let identifier = self.service_identifier();
        let subscriber = (!identifier.is_empty()).then(|| NewSubscriberRef {
            service_identifier: identifier.to_string(),
        });

        Ok(ProvisionRequest {
            offer_id,
            provisioning_intent: "auto",
            contract_start_date,
            auto_activate: self.auto_activate,
            client_id,
            client,
            commitment_months,
            target_contract_id,
            subscriber,
        })
    }

    /// Resets the per-request inputs after a successful provisioning.
    pub fn clear_after_provision(&mut self) {
        self.target_contract_id.clear();
        self.new_service_identifier.clear();
        if !self.existing_client_flow() {
            self.first_name.clear();
            self.last_name.clear();
            self.address.clear();
            self.email.clear();
            self.phone.clear();
        }
    }
}

/// Status change posted from the contract list.
#[derive(Deserialize)]
pub struct ContractStatusForm {
    pub status: String,
}

impl ContractStatusForm {
    pub fn status(&self) -> Result<ContractStatus, FormError> {
        ContractStatus::parse(&self.status).ok_or(FormError::UnknownOption("status"))
    }
}

/// Status change posted from the client list.
#[derive(Deserialize)]
pub struct ClientStatusForm {
    pub status: String,
}

impl ClientStatusForm {
    pub fn status(&self) -> Result<ClientStatus, FormError> {
        ClientStatus::parse(&self.status).ok_or(FormError::UnknownOption("status"))
    }
}
