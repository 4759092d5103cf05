//! Executes queries and transactions against the ledger.
//!
//! All state-changing calls go through one lock, so each request runs to
//! completion before the next one starts. A submitted request commits every
//! deposit transfer, record and block height bump of all its transactions in
//! a single sled transaction, so a failed request leaves no trace.

use ed25519_dalek::{SigningKey, VerifyingKey};
use guestbook_common::account::AccountId;
use guestbook_common::balance::Balance;
use guestbook_common::call::{
    AccountView, Action, CallResult, QueryRequest, QueryResponse, SubmitRequest, SubmitResponse,
    TransactionOutcome,
};
use guestbook_common::context::ExecutionContext;
use guestbook_common::ledger;
use guestbook_common::message::PostedMessage;
use guestbook_common::replica::GuestbookDelta;
use guestbook_common::store::MessageStore;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::Transactional;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::store::{decode_height, AccountRecord, SledStore, TxMessages, BLOCK_HEIGHT_KEY};

pub struct Runtime {
    store: SledStore,
    contract_id: AccountId,
    initial_balance: Balance,
    host_key: SigningKey,
    /// Serializes state changes; holds the last block timestamp handed out.
    call_lock: Mutex<u64>,
}

/// One action with the context the host stamped on it.
struct PendingCall {
    ctx: ExecutionContext,
    method_name: String,
    args: serde_json::Value,
    gas: u64,
}

impl Runtime {
    pub fn new(store: SledStore, config: &NodeConfig) -> Result<Self, NodeError> {
        if store.account(&config.contract_id)?.is_none() {
            store.put_account(
                &config.contract_id,
                &AccountRecord {
                    amount: Balance::ZERO,
                },
            )?;
        }
        let host_key = store.host_key()?;
        Ok(Self {
            store,
            contract_id: config.contract_id.clone(),
            initial_balance: config.initial_balance,
            host_key,
            call_lock: Mutex::new(0),
        })
    }

    pub fn contract_id(&self) -> &AccountId {
        &self.contract_id
    }

    pub fn store(&self) -> &SledStore {
        &self.store
    }

    /// Public half of the key replicas verify records against.
    pub fn host_public_key(&self) -> VerifyingKey {
        self.host_key.verifying_key()
    }

    /// Signed records from position `from` on, for pushing to a replica.
    pub fn replica_delta(&self, from: u64) -> Result<GuestbookDelta, NodeError> {
        let from = from.min(self.store.len()?);
        let messages = self.store.signed_messages(from, &self.host_key)?;
        debug!(from, count = messages.len(), "replica delta");
        Ok(GuestbookDelta { from, messages })
    }

    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse, NodeError> {
        match request {
            QueryRequest::ViewAccount { account_id, .. } => {
                // Unseen accounts report the balance they would start with.
                let amount = match self.store.account(&account_id)? {
                    Some(record) => record.amount,
                    None => self.initial_balance,
                };
                Ok(QueryResponse::Account(AccountView {
                    account_id,
                    amount,
                    block_height: self.store.block_height()?,
                }))
            }
            QueryRequest::CallFunction {
                account_id,
                method_name,
                ..
            } => {
                if account_id != self.contract_id {
                    return Err(NodeError::UnknownAccount(account_id));
                }
                let result = ledger::view(&self.store, &method_name)?;
                debug!(method = %method_name, bytes = result.len(), "view call");
                Ok(QueryResponse::CallResult(CallResult {
                    result,
                    block_height: self.store.block_height()?,
                }))
            }
        }
    }

    /// Execute every action of every transaction, all or nothing.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, NodeError> {
        for tx in &request.transactions {
            if tx.receiver_id != self.contract_id {
                return Err(NodeError::WrongReceiver(tx.receiver_id.clone()));
            }
            if tx.actions.is_empty() {
                return Err(NodeError::NoActions);
            }
        }

        let mut last_timestamp = self.call_lock.lock().await;
        let mut block_timestamp = *last_timestamp;
        let mut calls = Vec::new();
        for tx in request.transactions {
            for action in tx.actions {
                let Action::FunctionCall {
                    method_name,
                    args,
                    gas,
                    deposit,
                } = action;
                block_timestamp = next_timestamp(block_timestamp);
                calls.push(PendingCall {
                    ctx: ExecutionContext::new(tx.signer_id.clone(), deposit, block_timestamp),
                    method_name,
                    args,
                    gas,
                });
            }
        }

        let results = self.commit(&calls)?;
        *last_timestamp = block_timestamp;
        drop(last_timestamp);

        let outcomes = calls
            .into_iter()
            .zip(results)
            .map(|(call, (block_height, message))| {
                if let Some(m) = &message {
                    info!(
                        sender = %m.sender,
                        premium = m.premium,
                        block_height,
                        gas = call.gas,
                        "message appended"
                    );
                }
                TransactionOutcome {
                    signer_id: call.ctx.predecessor,
                    method_name: call.method_name,
                    block_height,
                    message,
                }
            })
            .collect();
        Ok(SubmitResponse { outcomes })
    }

    /// All calls as one atomic sled transaction. Caller holds `call_lock`.
    fn commit(
        &self,
        calls: &[PendingCall],
    ) -> Result<Vec<(u64, Option<PostedMessage>)>, NodeError> {
        let ledger_len = self.store.len()?;
        let initial_balance = self.initial_balance;
        let contract_id = &self.contract_id;

        let result = (&self.store.accounts, &self.store.messages, &self.store.meta).transaction(
            |(accounts, messages, meta)| -> TxResult<Vec<(u64, Option<PostedMessage>)>> {
                let mut tx_messages = TxMessages::new(messages, ledger_len);
                let mut height = decode_height(meta.get(BLOCK_HEIGHT_KEY)?.as_deref());
                let mut results = Vec::with_capacity(calls.len());

                for call in calls {
                    transfer(
                        accounts,
                        &call.ctx.predecessor,
                        contract_id,
                        call.ctx.attached_deposit,
                        initial_balance,
                    )?;
                    let message =
                        ledger::call(&mut tx_messages, &call.method_name, &call.args, &call.ctx)
                            .map_err(|e| ConflictableTransactionError::Abort(NodeError::from(e)))?;
                    height += 1;
                    results.push((height, message));
                }

                meta.insert(BLOCK_HEIGHT_KEY, height.to_be_bytes().to_vec())?;
                Ok(results)
            },
        );

        result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => NodeError::Storage(e),
        })
    }
}

type TxResult<T> = Result<T, ConflictableTransactionError<NodeError>>;

fn read_account(
    accounts: &TransactionalTree,
    id: &AccountId,
    initial_balance: Balance,
) -> TxResult<AccountRecord> {
    match accounts.get(id.as_str())? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| ConflictableTransactionError::Abort(NodeError::Codec(e))),
        None => Ok(AccountRecord {
            amount: initial_balance,
        }),
    }
}

fn write_account(accounts: &TransactionalTree, id: &AccountId, record: &AccountRecord) -> TxResult<()> {
    let bytes = serde_json::to_vec(record)
        .map_err(|e| ConflictableTransactionError::Abort(NodeError::Codec(e)))?;
    accounts.insert(id.as_str(), bytes)?;
    Ok(())
}

/// Move the attached deposit from the caller to the contract account.
/// The caller's account is created with the initial balance on first use.
fn transfer(
    accounts: &TransactionalTree,
    from: &AccountId,
    to: &AccountId,
    amount: Balance,
    initial_balance: Balance,
) -> TxResult<()> {
    let mut sender = read_account(accounts, from, initial_balance)?;
    sender.amount = sender.amount.checked_sub(amount).ok_or_else(|| {
        ConflictableTransactionError::Abort(NodeError::InsufficientBalance {
            account: from.clone(),
            needed: amount,
            available: sender.amount,
        })
    })?;
    write_account(accounts, from, &sender)?;

    let mut receiver = read_account(accounts, to, Balance::ZERO)?;
    receiver.amount = receiver.amount.checked_add(amount).ok_or_else(|| {
        ConflictableTransactionError::Abort(NodeError::BalanceOverflow(to.clone()))
    })?;
    write_account(accounts, to, &receiver)
}

/// Wall-clock nanoseconds, forced past the previous block's timestamp.
fn next_timestamp(last: u64) -> u64 {
    let now = chrono::Utc::now()
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0);
    now.max(last + 1)
}
