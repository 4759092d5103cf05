use thiserror::Error;

use crate::message::PostedMessage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("record {index} is corrupt: {reason}")]
    Corrupt { index: u64, reason: String },
}

/// Ordered, append-only storage for posted messages.
///
/// Positions start at zero and are dense: the record appended after `len()`
/// records lives at position `len()`.
pub trait MessageStore {
    fn len(&self) -> Result<u64, StoreError>;

    fn get(&self, index: u64) -> Result<Option<PostedMessage>, StoreError>;

    /// Append a record and return its position.
    fn push(&mut self, record: &PostedMessage) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// All records in insertion order.
    fn messages(&self) -> Result<Vec<PostedMessage>, StoreError> {
        let len = self.len()?;
        (0..len)
            .map(|i| {
                self.get(i)?.ok_or_else(|| StoreError::Corrupt {
                    index: i,
                    reason: "missing record".into(),
                })
            })
            .collect()
    }
}

/// Vec-backed store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    records: Vec<PostedMessage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<PostedMessage> {
        self.records
    }
}

impl From<Vec<PostedMessage>> for MemoryStore {
    fn from(records: Vec<PostedMessage>) -> Self {
        Self { records }
    }
}

impl MessageStore for MemoryStore {
    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.records.len() as u64)
    }

    fn get(&self, index: u64) -> Result<Option<PostedMessage>, StoreError> {
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get(i))
            .cloned())
    }

    fn push(&mut self, record: &PostedMessage) -> Result<u64, StoreError> {
        self.records.push(record.clone());
        Ok(self.records.len() as u64 - 1)
    }

    fn messages(&self) -> Result<Vec<PostedMessage>, StoreError> {
        Ok(self.records.clone())
    }
}
