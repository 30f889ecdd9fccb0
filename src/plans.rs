//! Plan tiers and token quota limits
//!
//! Plans form a closed set (free, pro, premium) with a static limits
//! table. Unknown tier names are rejected at parse time rather than
//! silently mapped to the free tier.

use crate::error::{ChatLedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription plan tier for a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Default tier for unpaid accounts
    Free,
    /// Paid tier
    Pro,
    /// Highest paid tier
    Premium,
}

impl PlanTier {
    /// Token limits for this tier
    ///
    /// # Examples
    ///
    /// ```
    /// use chatledger::plans::PlanTier;
    ///
    /// let limits = PlanTier::Free.limits();
    /// assert_eq!(limits.daily_tokens, 10_000);
    /// ```
    pub fn limits(self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits {
                daily_tokens: 10_000,
                monthly_tokens: 100_000,
                max_tokens_per_request: 1_000,
            },
            PlanTier::Pro => PlanLimits {
                daily_tokens: 100_000,
                monthly_tokens: 1_000_000,
                max_tokens_per_request: 4_000,
            },
            PlanTier::Premium => PlanLimits {
                daily_tokens: 500_000,
                monthly_tokens: 5_000_000,
                max_tokens_per_request: 8_000,
            },
        }
    }

    /// Canonical lowercase name of the tier
    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "premium" => Ok(PlanTier::Premium),
            other => Err(ChatLedgerError::UnknownPlan(other.to_string()).into()),
        }
    }
}

/// Token quota limits attached to a plan tier
///
/// Static configuration: limits are compiled in, not user-editable at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Tokens a principal may consume per calendar day
    pub daily_tokens: u64,
    /// Tokens a principal may consume per calendar month
    pub monthly_tokens: u64,
    /// Completion budget for a single request
    pub max_tokens_per_request: u32,
}
