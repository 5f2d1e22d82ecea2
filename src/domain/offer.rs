use std::fmt::Display;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::client::ServiceType;
use crate::domain::types::OfferId;

/// Catalog family an offer belongs to.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    #[default]
    Mobile,
    Internet,
    Landline,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 3] = [Self::Mobile, Self::Internet, Self::Landline];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Internet => "internet",
            Self::Landline => "landline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Internet => "Internet",
            Self::Landline => "Landline",
        }
    }

    /// Parses a select value, `"all"` and unknown values meaning no filter.
    pub fn parse_filter(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value.trim())
    }
}

impl Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InternetAccessType {
    #[default]
    Fiber,
    Adsl,
}

impl InternetAccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fiber => "fiber",
            Self::Adsl => "adsl",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [Self::Fiber, Self::Adsl]
            .into_iter()
            .find(|t| t.as_str() == value.trim())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Active,
    Retired,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 2] = [Self::Active, Self::Retired];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retired => "retired",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub name: String,
    pub service_category: ServiceCategory,
    pub service_type: ServiceType,
    pub mobile_data_gb: Option<u32>,
    pub mobile_calls_hours: Option<u32>,
    pub internet_access_type: Option<InternetAccessType>,
    pub internet_fiber_speed_mbps: Option<u32>,
    pub internet_adsl_speed_mbps: Option<u32>,
    #[serde(default)]
    pub internet_landline_included: bool,
    #[serde(default)]
    pub internet_tv_included: bool,
    #[serde(default)]
    pub landline_national_included: bool,
    pub landline_international_hours: Option<u32>,
    pub landline_phone_hours: Option<u32>,
    pub version: u32,
    pub monthly_fee: String,
    pub activation_fee: String,
    pub status: OfferStatus,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl Offer {
    /// Human label used in selects: `Name (Category / type)`.
    pub fn label(&self) -> String {
        format!(
            "{} ({} / {})",
            self.name,
            self.service_category.label(),
            self.service_type
        )
    }

    /// Components of this offer's own category.
    pub fn components(&self) -> OfferComponents {
        match self.service_category {
            ServiceCategory::Mobile => OfferComponents::Mobile {
                mobile_data_gb: self.mobile_data_gb,
                mobile_calls_hours: self.mobile_calls_hours,
            },
            ServiceCategory::Internet => OfferComponents::Internet {
                internet_access_type: self.internet_access_type.unwrap_or_default(),
                internet_fiber_speed_mbps: self.internet_fiber_speed_mbps,
                internet_adsl_speed_mbps: self.internet_adsl_speed_mbps,
                internet_landline_included: true,
                internet_tv_included: self.internet_tv_included,
            },
            ServiceCategory::Landline => OfferComponents::Landline {
                landline_national_included: self.landline_national_included,
                landline_international_hours: self.landline_international_hours,
                landline_phone_hours: self.landline_phone_hours,
            },
        }
    }

    /// Short summary of the bundled components, `-` when none.
    pub fn components_summary(&self) -> String {
        self.components().summary()
    }
}

/// Create/update body for an offer. Fields of other categories stay absent.
#[derive(Clone, Debug, Serialize, PartialEq, Default)]
pub struct OfferPayload {
    pub name: String,
    pub service_category: ServiceCategory,
    pub version: u32,
    pub monthly_fee: String,
    pub activation_fee: String,
    pub status: OfferStatus,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    #[serde(flatten)]
    pub components: OfferComponents,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OfferComponents {
    Mobile {
        mobile_data_gb: Option<u32>,
        mobile_calls_hours: Option<u32>,
    },
    Internet {
        internet_access_type: InternetAccessType,
        internet_fiber_speed_mbps: Option<u32>,
        internet_adsl_speed_mbps: Option<u32>,
        internet_landline_included: bool,
        internet_tv_included: bool,
    },
    Landline {
        landline_national_included: bool,
        landline_international_hours: Option<u32>,
        landline_phone_hours: Option<u32>,
    },
}

impl OfferComponents {
    /// Short summary such as `20Go data + 5h calls`, `-` when nothing is bundled.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self {
            Self::Mobile {
                mobile_data_gb,
                mobile_calls_hours,
            } => {
                if let Some(data) = mobile_data_gb {
                    parts.push(format!("{data}Go data"));
                }
                if let Some(calls) = mobile_calls_hours {
                    parts.push(format!("{calls}h calls"));
                }
            }
            Self::Internet {
                internet_access_type,
                internet_fiber_speed_mbps,
                internet_adsl_speed_mbps,
                internet_tv_included,
                ..
            } => {
                let speed = match internet_access_type {
                    InternetAccessType::Fiber => internet_fiber_speed_mbps.map(|s| ("Fiber", s)),
                    InternetAccessType::Adsl => internet_adsl_speed_mbps.map(|s| ("ADSL", s)),
                };
                if let Some((kind, speed)) = speed {
                    parts.push(format!("{kind} {speed}Mbps"));
                }
                parts.push("Landline".to_string());
                if *internet_tv_included {
                    parts.push("TV".to_string());
                }
            }
            Self::Landline {
                landline_national_included,
                landline_international_hours,
                landline_phone_hours,
            } => {
                if *landline_national_included {
                    parts.push("National unlimited".to_string());
                }
                if let Some(hours) = landline_international_hours {
                    parts.push(format!("International {hours}h"));
                }
                if let Some(hours) = landline_phone_hours {
                    parts.push(format!("Phone {hours}h"));
                }
            }
        }
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

impl Default for OfferComponents {
    fn default() -> Self {
        Self::Mobile {
            mobile_data_gb: None,
            mobile_calls_hours: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct OfferStatusUpdate {
    pub status: OfferStatus,
}
