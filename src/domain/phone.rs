//! Moroccan numbering rules for portal-entered and generated line numbers.

use rand::Rng;
use thiserror::Error;

pub const COUNTRY_CODE: &str = "212";
const NSN_LEN: usize = 9;

/// Kind of line a national number must belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Mobile,
    Landline,
}

impl LineKind {
    fn leading_digits(self) -> [char; 2] {
        match self {
            Self::Mobile => ['6', '7'],
            Self::Landline => ['5', '8'],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhoneError {
    #[error("national number must have exactly 9 digits")]
    InvalidLength,
    #[error("national number does not start with an allowed digit for this line kind")]
    InvalidPrefix,
}

/// A validated number: international form plus the national significant number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedNumber {
    pub canonical: String,
    pub nsn: String,
}

/// Strips formatting, the `212` country code or a single trunk `0`, then
/// checks length and leading digit for `kind`.
pub fn normalize_moroccan_number(raw: &str, kind: LineKind) -> Result<NormalizedNumber, PhoneError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let nsn = if let Some(rest) = digits.strip_prefix(COUNTRY_CODE) {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        digits.as_str()
    };

    if nsn.len() != NSN_LEN {
        return Err(PhoneError::InvalidLength);
    }
    let first = nsn.chars().next().ok_or(PhoneError::InvalidLength)?;
    if !kind.leading_digits().contains(&first) {
        return Err(PhoneError::InvalidPrefix);
    }

    Ok(NormalizedNumber {
        canonical: format!("+{COUNTRY_CODE}{nsn}"),
        nsn: nsn.to_string(),
    })
}

/// Draws a fresh national number valid for `kind`.
pub fn random_nsn<R: Rng + ?Sized>(rng: &mut R, kind: LineKind) -> String {
    let options = kind.leading_digits();
    let mut nsn = String::with_capacity(NSN_LEN);
    nsn.push(options[rng.gen_range(0..options.len())]);
    for _ in 1..NSN_LEN {
        let digit = rng.gen_range(0..10u32);
        nsn.push(char::from_digit(digit, 10).unwrap_or('0'));
    }
    nsn
}

/// International form of a bare national number.
pub fn canonical(nsn: &str) -> String {
    format!("+{COUNTRY_CODE}{nsn}")
}
