use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::balance::Balance;
use crate::context::ExecutionContext;

/// Attached deposit at or above which a message is marked premium (10^22 base units).
pub const PREMIUM_THRESHOLD: Balance = Balance(10_000_000_000_000_000_000_000);

pub fn is_premium(attached_deposit: Balance) -> bool {
    attached_deposit >= PREMIUM_THRESHOLD
}

/// One guest book entry.
///
/// Only `text` comes from the caller. `premium`, `sender` and `signed_date`
/// are derived from the [`ExecutionContext`] when the record is created and
/// never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub text: String,
    pub premium: bool,
    pub sender: AccountId,
    /// Block timestamp in nanoseconds.
    #[serde(rename = "signedDate")]
    pub signed_date: u64,
}

impl PostedMessage {
    pub fn new(text: impl Into<String>, ctx: &ExecutionContext) -> Self {
        Self {
            text: text.into(),
            premium: is_premium(ctx.attached_deposit),
            sender: ctx.predecessor.clone(),
            signed_date: ctx.block_timestamp,
        }
    }

    pub fn signed_at(&self) -> DateTime<Utc> {
        // u64 nanoseconds can exceed i64 only after the year 2262.
        DateTime::from_timestamp_nanos(i64::try_from(self.signed_date).unwrap_or(i64::MAX))
    }
}
