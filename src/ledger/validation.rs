//! Input validation for ledger calls
//!
//! The gateway runs these on raw request fields before calling the service.
//! The service runs [`validate_profile`] and [`validate_amount`] again on the
//! typed values it receives.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::error::BalanceError;
use super::types::ProfileId;

/// Parse a profile id from its textual (UUID) form
pub fn parse_profile_id(raw: &str) -> Result<ProfileId, BalanceError> {
    if raw.is_empty() {
        return Err(BalanceError::InvalidProfile(
            "profile id is required".to_string(),
        ));
    }

    let profile_id = ProfileId::from_str(raw)
        .map_err(|e| BalanceError::InvalidProfile(format!("'{}' is not a UUID: {}", raw, e)))?;

    validate_profile(profile_id)?;
    Ok(profile_id)
}

/// Reject identifiers that cannot name a real profile
pub fn validate_profile(profile_id: ProfileId) -> Result<(), BalanceError> {
    if profile_id.is_nil() {
        return Err(BalanceError::InvalidProfile(
            "nil UUID is not a profile id".to_string(),
        ));
    }
    Ok(())
}

/// Parse a signed amount from its decimal string form.
///
/// `None` means the field was not supplied at all.
pub fn parse_amount(raw: Option<&str>) -> Result<Decimal, BalanceError> {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return Err(BalanceError::InvalidAmount("amount is required".to_string())),
    };

    // Decimal has no NaN/inf, so those spellings fail here.
    let amount = Decimal::from_str(raw)
        .map_err(|_| BalanceError::InvalidAmount(format!("'{}' is not a decimal", raw)))?;

    validate_amount(amount)
}

/// Check a signed amount and return it normalized (trailing zeros dropped)
pub fn validate_amount(amount: Decimal) -> Result<Decimal, BalanceError> {
    if amount.is_zero() {
        return Err(BalanceError::InvalidAmount(
            "amount must be non-zero".to_string(),
        ));
    }
    Ok(amount.normalize())
}
