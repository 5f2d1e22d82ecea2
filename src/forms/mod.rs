//! Form definitions backing the console and portal routes.
//!
//! Every form is deserialized from raw strings and converted into a backend
//! payload; conversions stop at the first failing rule and report it with the
//! message shown in the status banner.

use serde::Deserialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod billing;
pub mod collections;
pub mod contracts;
pub mod offers;
pub mod portal;

#[derive(Debug, Error, PartialEq)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("Invalid form input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid value: {0}")]
    TypeConstraint(#[from] TypeConstraintError),

    #[error("Unknown {0} value.")]
    UnknownOption(&'static str),

    #[error("Enter a valid date for {0}.")]
    InvalidDate(&'static str),

    // Offers.
    #[error("Offer name is required.")]
    OfferNameRequired,
    #[error("Monthly fee must be greater than zero.")]
    MonthlyFee,
    #[error("Other fees (activation fee) must be zero or greater.")]
    ActivationFee,
    #[error("Validation date is required when enabled.")]
    ValidToRequired,
    #[error("Validation date cannot be earlier than valid from date.")]
    ValidToBeforeValidFrom,
    #[error("Mobile data must be a positive integer (Go).")]
    MobileData,
    #[error("Mobile calls must be a positive integer (hours).")]
    MobileCalls,
    #[error("Mobile offers require at least one component: Data or Calls.")]
    MobileComponents,
    #[error("Fiber speed must be a positive integer (Mbps).")]
    FiberSpeed,
    #[error("ADSL speed must be a positive integer (Mbps).")]
    AdslSpeed,
    #[error("Landline international hours must be a positive integer.")]
    LandlineInternational,
    #[error("Landline phone hours must be a positive integer.")]
    LandlinePhone,
    #[error("Landline offers require at least one component: National, International, or Phone.")]
    LandlineComponents,

    // Contract provisioning.
    #[error("Select an offer before provisioning a contract.")]
    OfferRequired,
    #[error("Select a client before provisioning a contract.")]
    ClientRequired,
    #[error("Provide first name and last name for new-client provisioning.")]
    NewClientName,
    #[error("Enter a valid email address for the new client.")]
    NewClientEmail,
    #[error("Enter a valid phone number for the new client.")]
    NewClientPhone,
    #[error("Commitment months must be a positive integer.")]
    CommitmentMonths,

    // Billing runs.
    #[error("Billing period start and end dates are required.")]
    BillingPeriodRequired,
    #[error("Billing period end cannot be earlier than start.")]
    BillingPeriodOrder,
    #[error("Due days must be an integer between 1 and 90.")]
    DueDays,
    #[error("Tax rate must be between 0.00 and 1.00.")]
    TaxRate,

    // Collections.
    #[error("Select an invoice before recording payment.")]
    InvoiceRequired,
    #[error("Payment amount must be greater than zero.")]
    PaymentAmount,
    #[error("Select a collection case first.")]
    CaseRequired,
    #[error("Note text is required for note action.")]
    NoteRequired,
}

/// Outcome of reading an optional positive integer field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PositiveInt {
    Empty,
    Value(u32),
    Invalid,
}

impl PositiveInt {
    pub(crate) fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.parse::<u32>() {
            Ok(value) if value > 0 => Self::Value(value),
            _ => Self::Invalid,
        }
    }

    pub(crate) fn value(self) -> Option<u32> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Parses a decimal amount typed into a form; `None` for blanks and garbage.
pub(crate) fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses an `<input type="date">` value; blanks are `Ok(None)`.
pub(crate) fn parse_date(
    raw: &str,
    field: &'static str,
) -> Result<Option<chrono::NaiveDate>, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FormError::InvalidDate(field))
}

/// Reads an HTML checkbox, which is only posted (usually as `on`) when ticked.
///
/// Use together with `#[serde(default)]` so an absent field reads as `false`.
pub(crate) fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // Forms post strings; the session copy stores a plain bool.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Flag(bool),
        Text(String),
    }

    Ok(match Checkbox::deserialize(deserializer)? {
        Checkbox::Flag(flag) => flag,
        Checkbox::Text(value) => !matches!(value.trim(), "" | "false" | "off" | "0"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_int_distinguishes_blank_from_invalid() {
        assert_eq!(PositiveInt::parse("  "), PositiveInt::Empty);
        assert_eq!(PositiveInt::parse(" 20 "), PositiveInt::Value(20));
        assert_eq!(PositiveInt::parse("0"), PositiveInt::Invalid);
        assert_eq!(PositiveInt::parse("-3"), PositiveInt::Invalid);
        assert_eq!(PositiveInt::parse("2.5"), PositiveInt::Invalid);
    }

    #[derive(Deserialize)]
    struct Toggle {
        #[serde(default, deserialize_with = "checkbox")]
        enabled: bool,
    }

    #[test]
    fn dates_and_checkboxes() {
        assert_eq!(parse_date("", "start"), Ok(None));
        assert!(parse_date("2026-02-30", "start").is_err());

        let on: Toggle = serde_json::from_value(serde_json::json!({"enabled": "on"})).unwrap();
        assert!(on.enabled);
        let absent: Toggle = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!absent.enabled);
        let off: Toggle = serde_json::from_value(serde_json::json!({"enabled": "false"})).unwrap();
        assert!(!off.enabled);
        let stored: Toggle = serde_json::from_value(serde_json::json!({"enabled": true})).unwrap();
        assert!(stored.enabled);
    }
}
