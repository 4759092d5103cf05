//! sled-backed persistence for the ledger, account balances and block height.

use std::path::Path;

use ed25519_dalek::SigningKey;
use guestbook_common::account::AccountId;
use guestbook_common::balance::Balance;
use guestbook_common::message::PostedMessage;
use guestbook_common::replica::SignedMessage;
use guestbook_common::store::{MessageStore, StoreError};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionalTree;
use sled::{Db, Tree};

use crate::error::NodeError;

/// Fixed storage prefix of the message collection.
pub const LEDGER_PREFIX: &str = "m";

const ACCOUNTS_TREE: &str = "accounts";
const META_TREE: &str = "meta";
pub(crate) const BLOCK_HEIGHT_KEY: &[u8] = b"block_height";
const HOST_KEY: &[u8] = b"host_key";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub amount: Balance,
}

/// Big-endian keys make sled's lexicographic order equal insertion order.
pub(crate) fn record_key(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

fn decode_record(index: u64, bytes: &[u8]) -> Result<PostedMessage, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        index,
        reason: e.to_string(),
    })
}

fn decode_u64(bytes: &[u8]) -> Option<u64> {
    <[u8; 8]>::try_from(bytes).ok().map(u64::from_be_bytes)
}

pub(crate) fn decode_height(bytes: Option<&[u8]>) -> u64 {
    bytes.and_then(decode_u64).unwrap_or(0)
}

pub struct SledStore {
    _db: Db,
    pub(crate) messages: Tree,
    pub(crate) accounts: Tree,
    pub(crate) meta: Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        Self::from_db(sled::open(path)?)
    }

    /// A store that lives only as long as the process.
    pub fn temporary() -> Result<Self, NodeError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, NodeError> {
        Ok(Self {
            messages: db.open_tree(LEDGER_PREFIX)?,
            accounts: db.open_tree(ACCOUNTS_TREE)?,
            meta: db.open_tree(META_TREE)?,
            _db: db,
        })
    }

    pub fn account(&self, id: &AccountId) -> Result<Option<AccountRecord>, NodeError> {
        match self.accounts.get(id.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_account(&self, id: &AccountId, record: &AccountRecord) -> Result<(), NodeError> {
        self.accounts
            .insert(id.as_str(), serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Record count, one past the last key. Keys are dense from zero.
    fn ledger_len(&self) -> Result<u64, sled::Error> {
        Ok(self
            .messages
            .last()?
            .and_then(|(key, _)| decode_u64(&key))
            .map_or(0, |last| last + 1))
    }

    /// The node's signing key, created on first start.
    pub fn host_key(&self) -> Result<SigningKey, NodeError> {
        if let Some(bytes) = self.meta.get(HOST_KEY)? {
            let secret =
                <[u8; 32]>::try_from(bytes.as_ref()).map_err(|_| NodeError::CorruptHostKey)?;
            return Ok(SigningKey::from_bytes(&secret));
        }
        let key = SigningKey::generate(&mut OsRng);
        self.meta.insert(HOST_KEY, key.to_bytes().to_vec())?;
        Ok(key)
    }

    /// Records from position `from` on, each signed with `key`.
    pub fn signed_messages(
        &self,
        from: u64,
        key: &SigningKey,
    ) -> Result<Vec<SignedMessage>, NodeError> {
        self.messages
            .range(record_key(from)..)
            .enumerate()
            .map(|(offset, item)| -> Result<SignedMessage, NodeError> {
                let (_key, bytes) = item?;
                let index = from + offset as u64;
                let message = decode_record(index, &bytes)?;
                Ok(SignedMessage::sign(key, index, message)?)
            })
            .collect()
    }

    pub fn block_height(&self) -> Result<u64, NodeError> {
        Ok(decode_height(self.meta.get(BLOCK_HEIGHT_KEY)?.as_deref()))
    }

    pub fn flush(&self) -> Result<(), NodeError> {
        self.messages.flush()?;
        self.accounts.flush()?;
        self.meta.flush()?;
        Ok(())
    }
}

impl MessageStore for SledStore {
    fn len(&self) -> Result<u64, StoreError> {
        self.ledger_len()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn get(&self, index: u64) -> Result<Option<PostedMessage>, StoreError> {
        let bytes = self
            .messages
            .get(record_key(index))
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        bytes.map(|b| decode_record(index, &b)).transpose()
    }

    fn push(&mut self, record: &PostedMessage) -> Result<u64, StoreError> {
        let index = MessageStore::len(self)?;
        let bytes = serde_json::to_vec(record).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.messages
            .insert(record_key(index), bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(index)
    }

    fn messages(&self) -> Result<Vec<PostedMessage>, StoreError> {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let (_key, bytes) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
                decode_record(i as u64, &bytes)
            })
            .collect()
    }
}

/// The message tree as seen from inside a sled transaction.
///
/// Callers must hold the runtime's call lock so `len` cannot go stale.
pub(crate) struct TxMessages<'a> {
    tree: &'a TransactionalTree,
    len: u64,
}

impl<'a> TxMessages<'a> {
    pub(crate) fn new(tree: &'a TransactionalTree, len: u64) -> Self {
        Self { tree, len }
    }
}

impl MessageStore for TxMessages<'_> {
    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.len)
    }

    fn get(&self, index: u64) -> Result<Option<PostedMessage>, StoreError> {
        let bytes = self
            .tree
            .get(&record_key(index)[..])
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        bytes.map(|b| decode_record(index, &b)).transpose()
    }

    fn push(&mut self, record: &PostedMessage) -> Result<u64, StoreError> {
        let index = self.len;
        let bytes = serde_json::to_vec(record).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.tree
            .insert(record_key(index).to_vec(), bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.len += 1;
        Ok(index)
    }
}
