use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::client::{Client, NewClient, Subscriber};
use crate::domain::types::{ClientId, ContractId, OfferId, SubscriberId};

/// Contract status machine: draft, then active, then suspended or terminated.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    Active,
    Suspended,
    Terminated,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 4] =
        [Self::Draft, Self::Active, Self::Suspended, Self::Terminated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Terminated => "terminated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }
}

impl Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub id: ContractId,
    pub client_id: ClientId,
    pub subscriber_id: SubscriberId,
    pub offer_id: OfferId,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub commitment_months: Option<u32>,
    pub activated_at: Option<String>,
    pub terminated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// How the backend satisfied a provisioning request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningOutcome {
    UpgradeExistingContract,
    NewContract,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ContractProvisionResult {
    pub contract: Contract,
    pub created_client: bool,
    pub created_subscriber: bool,
    pub provisioning_mode: ProvisioningOutcome,
    #[serde(default)]
    pub client: Option<Client>,
    #[serde(default)]
    pub subscriber: Option<Subscriber>,
}

impl ContractProvisionResult {
    /// Banner text shown once the provisioning call succeeds.
    pub fn summary(&self) -> String {
        let mode = match self.provisioning_mode {
            ProvisioningOutcome::UpgradeExistingContract => "Existing contract upgraded.",
            ProvisioningOutcome::NewContract => "New contract created.",
        };
        let subscriber = if self.created_subscriber {
            "new subscriber auto-created"
        } else {
            "existing subscriber reused"
        };
        format!("{mode} {subscriber}.")
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewSubscriberRef {
    pub service_identifier: String,
}

/// Body of `POST /contracts/provision`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProvisionRequest {
    pub offer_id: OfferId,
    pub provisioning_intent: &'static str,
    pub contract_start_date: NaiveDate,
    pub auto_activate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<NewClient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_contract_id: Option<ContractId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<NewSubscriberRef>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ContractStatusUpdate {
    pub status: ContractStatus,
}
