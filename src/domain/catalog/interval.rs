//! Billing interval definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a membership is billed.
///
/// Prices in the catalog are monthly; the interval scales them by its
/// multiplier and determines how long one purchase lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingInterval {
    /// All supported intervals.
    pub const ALL: [BillingInterval; 3] = [
        BillingInterval::Monthly,
        BillingInterval::Quarterly,
        BillingInterval::Yearly,
    ];

    /// Factor converting a monthly price into the price for this interval.
    pub fn multiplier(&self) -> u32 {
        match self {
            BillingInterval::Monthly => 1,
            BillingInterval::Quarterly => 3,
            BillingInterval::Yearly => 12,
        }
    }

    /// Length of one billing period in days.
    pub fn days(&self) -> i64 {
        match self {
            BillingInterval::Monthly => 30,
            BillingInterval::Quarterly => 90,
            BillingInterval::Yearly => 365,
        }
    }

    /// Maps an extension length in months to its equivalent interval.
    ///
    /// Only 1, 3 and 12 months have an equivalent.
    pub fn from_months(months: u32) -> Option<Self> {
        match months {
            1 => Some(BillingInterval::Monthly),
            3 => Some(BillingInterval::Quarterly),
            12 => Some(BillingInterval::Yearly),
            _ => None,
        }
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Quarterly => "quarterly",
            BillingInterval::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raised when an interval name is not one of the supported values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized billing interval '{0}'")]
pub struct UnknownInterval(pub String);

impl FromStr for BillingInterval {
    type Err = UnknownInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(BillingInterval::Monthly),
            "quarterly" => Ok(BillingInterval::Quarterly),
            "yearly" => Ok(BillingInterval::Yearly),
            _ => Err(UnknownInterval(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers_match_table() {
        assert_eq!(BillingInterval::Monthly.multiplier(), 1);
        assert_eq!(BillingInterval::Quarterly.multiplier(), 3);
        assert_eq!(BillingInterval::Yearly.multiplier(), 12);
    }

    #[test]
    fn from_months_accepts_only_table_values() {
        assert_eq!(BillingInterval::from_months(1), Some(BillingInterval::Monthly));
        assert_eq!(BillingInterval::from_months(3), Some(BillingInterval::Quarterly));
        assert_eq!(BillingInterval::from_months(12), Some(BillingInterval::Yearly));
        assert_eq!(BillingInterval::from_months(2), None);
        assert_eq!(BillingInterval::from_months(0), None);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Quarterly".parse(), Ok(BillingInterval::Quarterly));
        assert_eq!(" yearly ".parse(), Ok(BillingInterval::Yearly));
    }

    #[test]
    fn unknown_interval_is_rejected() {
        let err = "weekly".parse::<BillingInterval>().unwrap_err();
        assert_eq!(err, UnknownInterval("weekly".to_string()));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&BillingInterval::Yearly).unwrap();
        assert_eq!(json, "\"yearly\"");
    }
}
