//! Economic Tiers
//!
//! Derived economic classification. A tier is never stored on an agent; it is
//! recomputed from money every time it is needed.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use sim_events::EconomicTier;
//!
//! assert_eq!(EconomicTier::from_money(Decimal::from(47)), EconomicTier::Poor);
//! assert_eq!(EconomicTier::from_money(Decimal::from(45_000)), EconomicTier::Wealthy);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bounds (exclusive) for each tier.
pub mod thresholds {
    /// Money below this is poor
    pub const POOR_BELOW: i64 = 100;
    /// Money below this is middle class
    pub const MIDDLE_BELOW: i64 = 10_000;
    /// Money below this is wealthy; at or above is ultra wealthy
    pub const WEALTHY_BELOW: i64 = 1_000_000;
}

/// Economic tier, ordered from poorest to richest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomicTier {
    Poor,
    Middle,
    Wealthy,
    UltraWealthy,
}

impl EconomicTier {
    /// Classifies an amount of money. Monotonic and total over all decimals.
    pub fn from_money(money: Decimal) -> Self {
        if money < Decimal::from(thresholds::POOR_BELOW) {
            EconomicTier::Poor
        } else if money < Decimal::from(thresholds::MIDDLE_BELOW) {
            EconomicTier::Middle
        } else if money < Decimal::from(thresholds::WEALTHY_BELOW) {
            EconomicTier::Wealthy
        } else {
            EconomicTier::UltraWealthy
        }
    }

    pub fn is_poor(self) -> bool {
        matches!(self, EconomicTier::Poor)
    }

    /// Wealthy or ultra wealthy.
    pub fn is_affluent(self) -> bool {
        matches!(self, EconomicTier::Wealthy | EconomicTier::UltraWealthy)
    }

    pub fn all() -> &'static [EconomicTier] {
        &[
            EconomicTier::Poor,
            EconomicTier::Middle,
            EconomicTier::Wealthy,
            EconomicTier::UltraWealthy,
        ]
    }
}

impl fmt::Display for EconomicTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EconomicTier::Poor => write!(f, "poor"),
            EconomicTier::Middle => write!(f, "middle"),
            EconomicTier::Wealthy => write!(f, "wealthy"),
            EconomicTier::UltraWealthy => write!(f, "ultra_wealthy"),
        }
    }
}

/// Error for unrecognized tier names.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTierError(pub String);

impl fmt::Display for ParseTierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid economic tier: '{}'", self.0)
    }
}

impl std::error::Error for ParseTierError {}

impl FromStr for EconomicTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poor" => Ok(EconomicTier::Poor),
            "middle" => Ok(EconomicTier::Middle),
            "wealthy" => Ok(EconomicTier::Wealthy),
            "ultra_wealthy" | "ultra" => Ok(EconomicTier::UltraWealthy),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}
