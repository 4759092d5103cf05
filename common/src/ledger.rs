//! The guest book ledger: an append-only sequence of [`PostedMessage`]s.
//!
//! Every operation takes the storage handle explicitly, so the same logic runs
//! against an in-memory store and against the node's sled trees.

use serde::Deserialize;
use thiserror::Error;

use crate::call::{AddMessageArgs, METHOD_ADD_MESSAGE, METHOD_GET_MESSAGES};
use crate::context::ExecutionContext;
use crate::message::PostedMessage;
use crate::store::{MessageStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("{0} changes state and cannot be called as a view")]
    NotAView(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append a message. `premium`, `sender` and `signed_date` come from `ctx` only.
pub fn add_message<S: MessageStore>(
    store: &mut S,
    text: impl Into<String>,
    ctx: &ExecutionContext,
) -> Result<PostedMessage, LedgerError> {
    let record = PostedMessage::new(text, ctx);
    store.push(&record)?;
    Ok(record)
}

/// Every record, in insertion order.
pub fn get_messages<S: MessageStore>(store: &S) -> Result<Vec<PostedMessage>, LedgerError> {
    Ok(store.messages()?)
}

/// Run a state-changing method by name with JSON arguments.
pub fn call<S: MessageStore>(
    store: &mut S,
    method: &str,
    args: &serde_json::Value,
    ctx: &ExecutionContext,
) -> Result<Option<PostedMessage>, LedgerError> {
    match method {
        METHOD_ADD_MESSAGE => {
            let args = AddMessageArgs::deserialize(args)
                .map_err(|e| LedgerError::InvalidArgs(e.to_string()))?;
            add_message(store, args.text, ctx).map(Some)
        }
        METHOD_GET_MESSAGES => Ok(None),
        other => Err(LedgerError::UnknownMethod(other.to_string())),
    }
}

/// Run a read-only method by name and return its JSON-encoded result.
pub fn view<S: MessageStore>(store: &S, method: &str) -> Result<Vec<u8>, LedgerError> {
    match method {
        METHOD_GET_MESSAGES => Ok(serde_json::to_vec(&get_messages(store)?)?),
        METHOD_ADD_MESSAGE => Err(LedgerError::NotAView(method.to_string())),
        other => Err(LedgerError::UnknownMethod(other.to_string())),
    }
}
