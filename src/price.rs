use chrono::{
    DateTime,
    Utc,
};
use std::fmt;

/// Decimal places of the oracle's fixed-point answer.
pub const PRICE_DECIMALS: u32 = 8;

/// Most recent ETH/USDT reading from the platform's oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceSample {
    pub raw: u128,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(raw: u128) -> Self {
        Self {
            raw,
            fetched_at: Utc::now(),
        }
    }
}

impl fmt::Display for PriceSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.raw, PRICE_DECIMALS))
    }
}

/// Fixed-point integer to a decimal string that keeps every fractional digit.
pub fn format_units(raw: u128, decimals: u32) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let one_unit = 10u128.pow(decimals);
    let whole = raw / one_unit;
    let fractional = raw % one_unit;
    format!("{whole}.{fractional:0width$}", width = decimals as usize)
}
