use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::types::{ClientEmail, ClientId, FullName, PhoneNumber, SubscriberId};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    #[default]
    Individual,
    Business,
}

impl ClientType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "individual" => Some(Self::Individual),
            "business" => Some(Self::Business),
            _ => None,
        }
    }
}

/// Lifecycle of a customer record; transitions are operator-triggered only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Suspended,
    Terminated,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 3] = [Self::Active, Self::Suspended, Self::Terminated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Terminated => "terminated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }
}

impl Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub client_type: ClientType,
    pub full_name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_delinquent: bool,
    pub status: ClientStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Kind of line a subscriber (and the offer it runs) provides.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Mobile,
    Fiber,
    Adsl,
    Tv,
    Addon,
    Landline,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Fiber => "fiber",
            Self::Adsl => "adsl",
            Self::Tv => "tv",
            Self::Addon => "addon",
            Self::Landline => "landline",
        }
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberStatus {
    Active,
    Suspended,
    Terminated,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub client_id: ClientId,
    pub service_type: ServiceType,
    pub service_identifier: String,
    pub status: SubscriberStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// New-client block of a provisioning request.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewClient {
    pub client_type: ClientType,
    pub full_name: FullName,
    pub address: Option<String>,
    pub email: Option<ClientEmail>,
    pub phone: Option<PhoneNumber>,
}

impl NewClient {
    #[must_use]
    pub fn new(
        client_type: ClientType,
        full_name: FullName,
        address: Option<String>,
        email: Option<ClientEmail>,
        phone: Option<PhoneNumber>,
    ) -> Self {
        Self {
            client_type,
            full_name,
            address: address
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            email,
            phone,
        }
    }
}

/// Body of a customer status update.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ClientStatusUpdate {
    pub status: ClientStatus,
}
