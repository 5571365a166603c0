use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("value is empty")]
    Empty,
    #[error("'{0}' is not a non-negative integer")]
    NotAnInteger(String),
    #[error("'{0}' does not fit in 256 bits")]
    Overflow(String),
}

/// Parses a plain decimal integer. Signs, decimal points, exponents and hex
/// prefixes are all rejected.
pub fn parse_decimal(raw: &str) -> Result<U256, UnitsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::NotAnInteger(trimmed.to_string()));
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| UnitsError::Overflow(trimmed.to_string()))
}

pub fn format_units(amount: U256, decimals: u8, precision: u8) -> String {
    let ten = U256::from(10u64);
    let base = ten.pow(U256::from(decimals));
    let whole = amount / base;
    let precision = precision.min(decimals);
    if precision == 0 {
        return whole.to_string();
    }

    let fraction = (amount % base) / ten.pow(U256::from(decimals - precision));
    format!(
        "{whole}.{:0>width$}",
        fraction.to_string(),
        width = usize::from(precision)
    )
}
