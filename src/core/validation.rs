//! Input validation rules shared by create, update and transfer.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;

/// Maximum name length, in characters
pub const MAX_NAME_LEN: usize = 100;
/// Maximum description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 255;
/// Maximum digits before the decimal point
pub const MAX_INTEGER_DIGITS: u32 = 13;
/// Maximum digits after the decimal point
pub const MAX_FRACTION_DIGITS: u32 = 2;

/// Trims the name and checks it is non-empty and at most 100 characters.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Checks the optional description is at most 255 characters.
pub fn validate_description(description: Option<String>) -> Result<Option<String>> {
    if let Some(text) = &description {
        if text.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::validation(format!(
                "Description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
    }
    Ok(description)
}

/// A benefit value: present, strictly positive, within 13.2 digits.
pub fn validate_value(value: Option<Decimal>) -> Result<Decimal> {
    validate_positive_money("Value", value)
}

/// A transfer amount: present, strictly positive, within 13.2 digits.
pub fn validate_amount(amount: Option<Decimal>) -> Result<Decimal> {
    validate_positive_money("Amount", amount)
}

fn validate_positive_money(field: &str, value: Option<Decimal>) -> Result<Decimal> {
    let value = value.ok_or_else(|| Error::validation(format!("{field} is required")))?;
    if value <= Decimal::ZERO {
        return Err(Error::validation(format!(
            "{field} must be greater than zero"
        )));
    }
    if !fits_money_digits(value) {
        return Err(Error::validation(format!(
            "{field} must have at most {MAX_INTEGER_DIGITS} integer digits and {MAX_FRACTION_DIGITS} decimal places"
        )));
    }
    Ok(value)
}

/// True when `value` has at most 13 integer digits and 2 significant
/// fractional digits. Trailing zeros (`1.500`) do not count.
#[must_use]
pub fn fits_money_digits(value: Decimal) -> bool {
    let normalized = value.normalize();
    if normalized.scale() > MAX_FRACTION_DIGITS {
        return false;
    }
    normalized.trunc().abs() < max_integer_part()
}

fn max_integer_part() -> Decimal {
    Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS))
}
