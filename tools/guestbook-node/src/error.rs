use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use guestbook_common::account::AccountId;
use guestbook_common::balance::Balance;
use guestbook_common::ledger::LedgerError;
use guestbook_common::store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("failed to decode stored value: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),
    #[error("receiver {0} is not the guest book contract")]
    WrongReceiver(AccountId),
    #[error("{account} cannot attach {needed}: balance is {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: Balance,
        available: Balance,
    },
    #[error("balance of {0} would overflow")]
    BalanceOverflow(AccountId),
    #[error("transaction has no actions")]
    NoActions,
    #[error("stored host key is corrupt")]
    CorruptHostKey,
}

impl NodeError {
    pub fn status(&self) -> StatusCode {
        match self {
            NodeError::Ledger(
                LedgerError::UnknownMethod(_)
                | LedgerError::NotAView(_)
                | LedgerError::InvalidArgs(_),
            )
            | NodeError::WrongReceiver(_)
            | NodeError::NoActions => StatusCode::BAD_REQUEST,
            NodeError::UnknownAccount(_) => StatusCode::NOT_FOUND,
            NodeError::InsufficientBalance { .. } | NodeError::BalanceOverflow(_) => {
                StatusCode::PAYMENT_REQUIRED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::warn!("rejected: {self}");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
