//! Node access used by the client application.

use async_trait::async_trait;
use guestbook_common::account::AccountId;
use guestbook_common::balance::Balance;
use guestbook_common::call::{
    AccountView, Finality, QueryRequest, QueryResponse, SubmitRequest, SubmitResponse, Transaction,
};
use guestbook_common::message::PostedMessage;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to node failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("node rejected the request ({status}): {message}")]
    Node { status: u16, message: String },
    #[error("malformed view result: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("node returned an unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}

/// The three calls the guest book frontend makes against the chain.
#[async_trait]
pub trait GuestbookApi: Send + Sync {
    async fn view_account(&self, account_id: &AccountId) -> Result<AccountView, ApiError>;

    /// Reads the whole ledger at optimistic finality.
    async fn get_messages(&self) -> Result<Vec<PostedMessage>, ApiError>;

    /// Submits `addMessage` signed as `signer` with `deposit` attached.
    async fn add_message(
        &self,
        signer: &AccountId,
        text: &str,
        deposit: Balance,
    ) -> Result<SubmitResponse, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for `guestbook-node`.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    base_url: String,
    contract_id: AccountId,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>, contract_id: AccountId) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            contract_id,
        }
    }

    pub fn contract_id(&self) -> &AccountId {
        &self.contract_id
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(ApiError::Node {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl GuestbookApi for NodeClient {
    async fn view_account(&self, account_id: &AccountId) -> Result<AccountView, ApiError> {
        let request = QueryRequest::ViewAccount {
            account_id: account_id.clone(),
            finality: Finality::Final,
        };
        match self.post("/query", &request).await? {
            QueryResponse::Account(view) => Ok(view),
            QueryResponse::CallResult(_) => Err(ApiError::UnexpectedResponse("view_account")),
        }
    }

    async fn get_messages(&self) -> Result<Vec<PostedMessage>, ApiError> {
        let request = QueryRequest::get_messages(self.contract_id.clone());
        match self.post("/query", &request).await? {
            QueryResponse::CallResult(result) => Ok(result.messages()?),
            QueryResponse::Account(_) => Err(ApiError::UnexpectedResponse("getMessages")),
        }
    }

    async fn add_message(
        &self,
        signer: &AccountId,
        text: &str,
        deposit: Balance,
    ) -> Result<SubmitResponse, ApiError> {
        let request = SubmitRequest {
            transactions: vec![Transaction::add_message(
                signer.clone(),
                self.contract_id.clone(),
                text,
                deposit,
            )],
        };
        self.post("/transactions", &request).await
    }
}
