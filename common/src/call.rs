//! Request and response shapes exchanged between the client, the relay and the node.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::balance::Balance;
use crate::message::PostedMessage;

pub const METHOD_ADD_MESSAGE: &str = "addMessage";
pub const METHOD_GET_MESSAGES: &str = "getMessages";

/// Gas attached to every `addMessage` call (30 TGas).
pub const DEFAULT_GAS: u64 = 30_000_000_000_000;

/// Arguments of `addMessage`. Unknown fields are ignored, so a forged
/// `sender` or `signedDate` in the payload has no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMessageArgs {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finality {
    #[default]
    Final,
    Optimistic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum QueryRequest {
    ViewAccount {
        account_id: AccountId,
        #[serde(default)]
        finality: Finality,
    },
    CallFunction {
        account_id: AccountId,
        method_name: String,
        #[serde(default)]
        args_base64: String,
        #[serde(default)]
        finality: Finality,
    },
}

impl QueryRequest {
    pub fn get_messages(contract_id: AccountId) -> Self {
        QueryRequest::CallFunction {
            account_id: contract_id,
            method_name: METHOD_GET_MESSAGES.to_string(),
            args_base64: String::new(),
            finality: Finality::Optimistic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Account(AccountView),
    CallResult(CallResult),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub account_id: AccountId,
    pub amount: Balance,
    pub block_height: u64,
}

/// Raw bytes returned by a view call; for `getMessages` they are UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub result: Vec<u8>,
    pub block_height: u64,
}

impl CallResult {
    pub fn messages(&self) -> Result<Vec<PostedMessage>, serde_json::Error> {
        serde_json::from_slice(&self.result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Action {
    FunctionCall {
        method_name: String,
        args: serde_json::Value,
        gas: u64,
        deposit: Balance,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Caller identity, authenticated by the relay that forwards the transaction.
    pub signer_id: AccountId,
    pub receiver_id: AccountId,
    pub actions: Vec<Action>,
}

impl Transaction {
    pub fn add_message(
        signer_id: AccountId,
        contract_id: AccountId,
        text: impl Into<String>,
        deposit: Balance,
    ) -> Self {
        let text: String = text.into();
        Transaction {
            signer_id,
            receiver_id: contract_id,
            actions: vec![Action::FunctionCall {
                method_name: METHOD_ADD_MESSAGE.to_string(),
                args: serde_json::json!({ "text": text }),
                gas: DEFAULT_GAS,
                deposit,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub signer_id: AccountId,
    pub method_name: String,
    pub block_height: u64,
    /// The record appended by `addMessage`, if any.
    pub message: Option<PostedMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub outcomes: Vec<TransactionOutcome>,
}
