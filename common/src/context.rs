use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::balance::Balance;

/// Trusted per-call values supplied by the host, never by the caller's arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Authenticated identity of the immediate caller.
    pub predecessor: AccountId,
    /// Value attached to this call.
    pub attached_deposit: Balance,
    /// Block timestamp in nanoseconds since the Unix epoch.
    pub block_timestamp: u64,
}

impl ExecutionContext {
    pub fn new(predecessor: AccountId, attached_deposit: Balance, block_timestamp: u64) -> Self {
        Self {
            predecessor,
            attached_deposit,
            block_timestamp,
        }
    }
}
