//! Token usage accounting and quota enforcement
//!
//! The ledger records immutable usage events and answers "how much has
//! this principal consumed today / this month". Quota gating is a
//! pre-flight check only: there is no transaction spanning the check and
//! the later recording, so two concurrent sends can both pass the gate
//! and overshoot the limit by at most (in-flight requests x
//! max_tokens_per_request). That race is an accepted tradeoff, not a bug.
//!
//! Failure posture is asymmetric by design: recording failures are
//! reported as an ignorable [`RecordOutcome`] and never fail the caller,
//! while read failures degrade to zero so a broken ledger never blocks
//! the chat path.

use crate::plans::{PlanLimits, PlanTier};
use crate::storage::{RequestKind, SqliteStorage, UsageEvent};
use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

/// Result of a best-effort usage recording
///
/// Callers on the primary chat path may ignore this value; tests and
/// diagnostics can inspect it.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// The event was persisted
    Recorded(UsageEvent),
    /// The event was lost; the reason has already been logged
    Dropped(String),
}

impl RecordOutcome {
    /// Whether the event reached storage
    pub fn is_recorded(&self) -> bool {
        matches!(self, RecordOutcome::Recorded(_))
    }
}

/// Outcome of a pre-flight quota check
#[derive(Debug, Clone, Copy)]
pub struct QuotaCheck {
    /// Whether a new request may proceed
    pub allowed: bool,
    /// Tokens consumed since local midnight
    pub daily_used: u64,
    /// Tokens consumed since the first of the month
    pub monthly_used: u64,
    /// Daily tokens left before the limit
    pub remaining_daily: u64,
    /// Monthly tokens left before the limit
    pub remaining_monthly: u64,
    /// The limits the check was evaluated against
    pub limits: PlanLimits,
}

impl QuotaCheck {
    /// Evaluate a quota check from the two usage sums and a limits table
    ///
    /// Pure function: a request is allowed while both sums are strictly
    /// below their limits. A request that would cross a limit is still
    /// allowed when the pre-flight sums are below it; overshoot is
    /// bounded post-hoc, not prevented.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatledger::chat::QuotaCheck;
    /// use chatledger::plans::PlanTier;
    ///
    /// let check = QuotaCheck::evaluate(9_500, 50_000, PlanTier::Free.limits());
    /// assert!(check.allowed);
    /// assert_eq!(check.remaining_daily, 500);
    /// ```
    pub fn evaluate(daily_used: u64, monthly_used: u64, limits: PlanLimits) -> Self {
        Self {
            allowed: daily_used < limits.daily_tokens && monthly_used < limits.monthly_tokens,
            daily_used,
            monthly_used,
            remaining_daily: limits.daily_tokens.saturating_sub(daily_used),
            remaining_monthly: limits.monthly_tokens.saturating_sub(monthly_used),
            limits,
        }
    }
}

/// Start of the calendar day containing `as_of`, at local midnight
///
/// Returns the instant in UTC. A DST gap at midnight resolves to the
/// earliest valid local time.
pub fn day_start(as_of: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = as_of.with_timezone(&Local).date_naive();
    let midnight = local_date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(as_of)
}

/// Start of the calendar month containing `as_of`, at local midnight
pub fn month_start(as_of: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = as_of.with_timezone(&Local).date_naive();
    let first = match local_date.with_day(1) {
        Some(d) => d,
        None => return as_of,
    };
    let midnight = first.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(as_of)
}

/// Tracks and queries token consumption per principal and time window
#[derive(Debug, Clone)]
pub struct UsageLedger {
    storage: SqliteStorage,
}

impl UsageLedger {
    /// Create a ledger over the given storage
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// Append a usage event, best-effort
    ///
    /// Never fails the caller: a storage error is logged and reported as
    /// [`RecordOutcome::Dropped`].
    pub fn record(
        &self,
        principal_id: &str,
        tokens: u64,
        model: &str,
        kind: RequestKind,
    ) -> RecordOutcome {
        let event = UsageEvent {
            id: Uuid::new_v4().to_string(),
            principal_id: principal_id.to_string(),
            model: model.to_string(),
            tokens,
            request_kind: kind,
            created_at: Utc::now(),
        };

        match self.storage.insert_usage_event(&event) {
            Ok(()) => RecordOutcome::Recorded(event),
            Err(e) => {
                tracing::warn!(
                    "Failed to record usage event for {} ({} tokens): {}",
                    principal_id,
                    tokens,
                    e
                );
                RecordOutcome::Dropped(e.to_string())
            }
        }
    }

    /// Tokens the principal consumed on the calendar day of `as_of`
    ///
    /// Fail-open: returns 0 when the query fails.
    pub async fn daily_usage(&self, principal_id: &str, as_of: DateTime<Utc>) -> u64 {
        self.usage_since(principal_id, day_start(as_of)).await
    }

    /// Tokens the principal consumed in the calendar month of `as_of`
    ///
    /// Fail-open: returns 0 when the query fails.
    pub async fn monthly_usage(&self, principal_id: &str, as_of: DateTime<Utc>) -> u64 {
        self.usage_since(principal_id, month_start(as_of)).await
    }

    /// Pre-flight quota check against the principal's plan limits
    ///
    /// The daily and monthly sums are independent aggregations and are
    /// fetched concurrently. No side effects.
    pub async fn check_quota(&self, principal_id: &str, tier: PlanTier) -> QuotaCheck {
        let now = Utc::now();
        let (daily, monthly) = tokio::join!(
            self.daily_usage(principal_id, now),
            self.monthly_usage(principal_id, now)
        );
        QuotaCheck::evaluate(daily, monthly, tier.limits())
    }

    async fn usage_since(&self, principal_id: &str, since: DateTime<Utc>) -> u64 {
        let storage = self.storage.clone();
        let principal = principal_id.to_string();

        let result =
            tokio::task::spawn_blocking(move || storage.usage_since(&principal, since)).await;

        match result {
            Ok(Ok(total)) => total,
            Ok(Err(e)) => {
                tracing::warn!("Usage query failed for {}: {}", principal_id, e);
                0
            }
            Err(e) => {
                tracing::warn!("Usage query task failed for {}: {}", principal_id, e);
                0
            }
        }
    }
}
