//! Frontend state: the signed-in account, the cached message list and the
//! submit guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use guestbook_common::account::AccountId;
use guestbook_common::balance::{parse_near_amount, AmountError};
use guestbook_common::call::{AccountView, SubmitResponse};
use guestbook_common::message::PostedMessage;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, GuestbookApi};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("sign in before posting")]
    NotSignedIn,
    #[error("a message is already being submitted")]
    SubmitInFlight,
    #[error("no other signed-in account to switch to")]
    NoOtherAccount,
    #[error("invalid donation: {0}")]
    Donation(#[from] AmountError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Default)]
struct AppState {
    account: Option<AccountView>,
    /// Every account signed in during this session, in sign-in order.
    known: Vec<AccountId>,
    messages: Vec<PostedMessage>,
}

/// Clears the in-flight flag when the submit finishes, whatever the outcome.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct App<A> {
    api: A,
    state: Mutex<AppState>,
    submitting: AtomicBool,
}

impl<A: GuestbookApi> App<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(AppState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks the account up on the node and makes it the current one.
    pub async fn sign_in(&self, account_id: &AccountId) -> Result<AccountView, AppError> {
        let view = self.api.view_account(account_id).await?;
        info!(account = %view.account_id, balance = %view.amount, "signed in");
        let mut state = self.state();
        if !state.known.contains(&view.account_id) {
            state.known.push(view.account_id.clone());
        }
        state.account = Some(view.clone());
        Ok(view)
    }

    /// Adds an account to the switch rotation without contacting the node.
    pub fn remember(&self, account_id: AccountId) {
        let mut state = self.state();
        if !state.known.contains(&account_id) {
            state.known.push(account_id);
        }
    }

    pub fn known_accounts(&self) -> Vec<AccountId> {
        self.state().known.clone()
    }

    /// Moves to the next known account, wrapping after the last one.
    pub async fn switch_account(&self) -> Result<AccountView, AppError> {
        let next = {
            let state = self.state();
            let current = state.account.as_ref().ok_or(AppError::NotSignedIn)?;
            if state.known.len() < 2 {
                return Err(AppError::NoOtherAccount);
            }
            let next = match state.known.iter().position(|a| *a == current.account_id) {
                Some(i) if i + 1 < state.known.len() => i + 1,
                _ => 0,
            };
            info!(from = %current.account_id, to = %state.known[next], "switching account");
            state.known[next].clone()
        };
        self.sign_in(&next).await
    }

    /// Signs every account out.
    pub fn sign_out(&self) {
        let mut state = self.state();
        state.known.clear();
        if let Some(view) = state.account.take() {
            info!(account = %view.account_id, "signed out");
        }
    }

    pub fn account(&self) -> Option<AccountView> {
        self.state().account.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Reloads the ledger. A failed read keeps the previous list and is
    /// only logged.
    pub async fn refresh_messages(&self) -> usize {
        match self.api.get_messages().await {
            Ok(messages) => {
                let mut state = self.state();
                state.messages = messages;
                state.messages.len()
            }
            Err(e) => {
                warn!("failed to refresh messages: {e}");
                self.state().messages.len()
            }
        }
    }

    /// Posts `text` with `donation` whole tokens attached (empty means none),
    /// then refreshes the list.
    pub async fn add_message(
        &self,
        text: &str,
        donation: &str,
    ) -> Result<SubmitResponse, AppError> {
        let signer = self
            .account()
            .map(|view| view.account_id)
            .ok_or(AppError::NotSignedIn)?;
        let deposit = parse_near_amount(donation)?;

        if self.submitting.swap(true, Ordering::AcqRel) {
            return Err(AppError::SubmitInFlight);
        }
        let _guard = SubmitGuard(&self.submitting);

        let response = self.api.add_message(&signer, text, deposit).await?;
        info!(signer = %signer, deposit = %deposit, "message submitted");
        self.refresh_messages().await;
        Ok(response)
    }

    /// Messages to render: only while signed in, and only when there are any.
    pub fn visible_messages(&self) -> Option<Vec<PostedMessage>> {
        let state = self.state();
        if state.account.is_none() || state.messages.is_empty() {
            return None;
        }
        Some(state.messages.clone())
    }
}
