//! The ledger as replicated in Freenet contract state.
//!
//! Only the host executes calls, so only the host can vouch for `sender`,
//! `premium` and `signedDate`. It signs each record together with its
//! position, and replicas accept records only under the host's key.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::PostedMessage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    #[error("delta starts at {from} but the ledger only has {len} records")]
    Gap { from: u64, len: u64 },
    #[error("record {index} differs from the stored one")]
    Diverged { index: u64 },
    #[error("record {index} is not signed by the host")]
    BadSignature { index: u64 },
    #[error("record signed for position {signed} found at position {index}")]
    Misplaced { index: u64, signed: u64 },
    #[error("host key is not a 32-byte ed25519 public key")]
    InvalidHostKey,
}

/// Contract parameters are the raw 32 bytes of the host's public key.
pub fn host_key_from_bytes(bytes: &[u8]) -> Result<VerifyingKey, ReplicaError> {
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| ReplicaError::InvalidHostKey)?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| ReplicaError::InvalidHostKey)
}

#[derive(Serialize)]
struct SignableMessage<'a> {
    index: u64,
    message: &'a PostedMessage,
}

fn signable_bytes(index: u64, message: &PostedMessage) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&SignableMessage { index, message })
}

/// A ledger record at a fixed position, signed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub index: u64,
    pub message: PostedMessage,
    pub signature: Signature,
}

impl SignedMessage {
    pub fn sign(
        key: &SigningKey,
        index: u64,
        message: PostedMessage,
    ) -> Result<Self, serde_json::Error> {
        let signature = key.sign(&signable_bytes(index, &message)?);
        Ok(Self {
            index,
            message,
            signature,
        })
    }

    pub fn verify_signature(&self, host: &VerifyingKey) -> bool {
        signable_bytes(self.index, &self.message)
            .is_ok_and(|msg| host.verify(&msg, &self.signature).is_ok())
    }

    /// Checks the signature and that the record sits where it was signed.
    fn verify_at(&self, position: u64, host: &VerifyingKey) -> Result<(), ReplicaError> {
        if self.index != position {
            return Err(ReplicaError::Misplaced {
                index: position,
                signed: self.index,
            });
        }
        if !self.verify_signature(host) {
            return Err(ReplicaError::BadSignature { index: position });
        }
        Ok(())
    }
}

/// Full replicated state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookState {
    pub messages: Vec<SignedMessage>,
}

/// How much of the ledger a peer already has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookSummary {
    pub len: u64,
}

/// Records starting at position `from`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookDelta {
    pub from: u64,
    pub messages: Vec<SignedMessage>,
}

impl GuestbookDelta {
    pub fn verify(&self, host: &VerifyingKey) -> Result<(), ReplicaError> {
        self.messages
            .iter()
            .enumerate()
            .try_for_each(|(offset, m)| m.verify_at(self.from + offset as u64, host))
    }
}

impl GuestbookState {
    pub fn len(&self) -> u64 {
        self.messages.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<&PostedMessage> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.messages.get(i))
            .map(|m| &m.message)
    }

    /// The plain records, in ledger order.
    pub fn posted(&self) -> Vec<PostedMessage> {
        self.messages.iter().map(|m| m.message.clone()).collect()
    }

    /// Every record carries the host's signature for its own position.
    pub fn verify(&self, host: &VerifyingKey) -> Result<(), ReplicaError> {
        self.messages
            .iter()
            .enumerate()
            .try_for_each(|(i, m)| m.verify_at(i as u64, host))
    }

    pub fn summarize(&self) -> GuestbookSummary {
        GuestbookSummary { len: self.len() }
    }

    /// Records the summarizer is missing.
    pub fn delta(&self, summary: &GuestbookSummary) -> GuestbookDelta {
        let from = summary.len.min(self.len());
        GuestbookDelta {
            from,
            messages: self.messages[from as usize..].to_vec(),
        }
    }

    /// Append the part of `delta` beyond our current length.
    ///
    /// Every incoming record must be signed by `host` for its position, and
    /// the overlapping part must match what we already hold. On error
    /// nothing changes.
    pub fn apply_delta(
        &mut self,
        delta: GuestbookDelta,
        host: &VerifyingKey,
    ) -> Result<u64, ReplicaError> {
        let len = self.len();
        if delta.from > len {
            return Err(ReplicaError::Gap {
                from: delta.from,
                len,
            });
        }
        delta.verify(host)?;
        for (offset, record) in delta.messages.iter().enumerate() {
            let index = delta.from + offset as u64;
            if index >= len {
                break;
            }
            if self.messages[index as usize] != *record {
                return Err(ReplicaError::Diverged { index });
            }
        }
        let skip = (len - delta.from) as usize;
        let appended = delta.messages.len().saturating_sub(skip);
        self.messages.extend(delta.messages.into_iter().skip(skip));
        Ok(appended as u64)
    }

    /// Merge a full state, accepted only when ours is a prefix of it.
    pub fn extend_from(
        &mut self,
        other: GuestbookState,
        host: &VerifyingKey,
    ) -> Result<u64, ReplicaError> {
        self.apply_delta(
            GuestbookDelta {
                from: 0,
                messages: other.messages,
            },
            host,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::Balance;
    use crate::context::ExecutionContext;

    fn host() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn posted(text: &str, ts: u64) -> PostedMessage {
        let ctx = ExecutionContext::new("alice".parse().unwrap(), Balance::ZERO, ts);
        PostedMessage::new(text, &ctx)
    }

    fn state_with(n: u64) -> GuestbookState {
        let key = host();
        GuestbookState {
            messages: (0..n)
                .map(|i| SignedMessage::sign(&key, i, posted(&format!("m{i}"), i)).unwrap())
                .collect(),
        }
    }

    #[test]
    fn host_key_must_be_32_bytes() {
        let key = host().verifying_key();
        assert_eq!(host_key_from_bytes(key.as_bytes()).unwrap(), key);
        assert_eq!(
            host_key_from_bytes(&[1, 2, 3]),
            Err(ReplicaError::InvalidHostKey)
        );
    }

    #[test]
    fn signed_state_verifies() {
        let state = state_with(3);
        assert_eq!(state.verify(&host().verifying_key()), Ok(()));
        assert_eq!(state.get(1).unwrap().text, "m1");
        assert!(state.get(u64::MAX).is_none());
        assert_eq!(state.posted().len(), 3);
    }

    #[test]
    fn tampered_provenance_fails_verification() {
        let mut state = state_with(2);
        state.messages[1].message.sender = "mallory".parse().unwrap();
        assert_eq!(
            state.verify(&host().verifying_key()),
            Err(ReplicaError::BadSignature { index: 1 })
        );

        let mut state = state_with(2);
        state.messages[0].message.premium = true;
        assert!(state.verify(&host().verifying_key()).is_err());
    }

    #[test]
    fn other_key_is_rejected() {
        let intruder = SigningKey::from_bytes(&[9u8; 32]);
        let forged = SignedMessage::sign(&intruder, 0, posted("hi", 1)).unwrap();
        assert!(!forged.verify_signature(&host().verifying_key()));
    }

    #[test]
    fn delta_carries_missing_tail() {
        let state = state_with(5);
        let delta = state.delta(&GuestbookSummary { len: 3 });
        assert_eq!(delta.from, 3);
        assert_eq!(delta.messages.len(), 2);

        let mut behind = state_with(3);
        assert_eq!(behind.apply_delta(delta, &host().verifying_key()).unwrap(), 2);
        assert_eq!(behind, state);
    }

    #[test]
    fn delta_for_ahead_summary_is_empty() {
        let state = state_with(2);
        let delta = state.delta(&GuestbookSummary { len: 10 });
        assert_eq!(delta.from, 2);
        assert!(delta.messages.is_empty());
    }

    #[test]
    fn overlapping_delta_appends_only_new_records() {
        let full = state_with(4);
        let mut partial = state_with(2);
        let delta = full.delta(&GuestbookSummary { len: 1 });
        assert_eq!(partial.apply_delta(delta, &host().verifying_key()).unwrap(), 2);
        assert_eq!(partial, full);
    }

    #[test]
    fn gap_rewrite_and_replay_are_rejected() {
        let key = host().verifying_key();
        let mut state = state_with(2);

        let far = state_with(5).delta(&GuestbookSummary { len: 4 });
        assert!(matches!(
            state.apply_delta(far, &key),
            Err(ReplicaError::Gap { .. })
        ));

        // Record 0 is validly signed, but only for position 0.
        let replay = GuestbookDelta {
            from: 2,
            messages: vec![state.messages[0].clone()],
        };
        assert_eq!(
            state.apply_delta(replay, &key),
            Err(ReplicaError::Misplaced { index: 2, signed: 0 })
        );

        let mut rewritten = state_with(3);
        rewritten.messages[1] = SignedMessage::sign(&host(), 1, posted("rewritten", 1)).unwrap();
        assert_eq!(
            state.extend_from(rewritten, &key),
            Err(ReplicaError::Diverged { index: 1 })
        );
        assert_eq!(state, state_with(2));
    }

    #[test]
    fn forged_tail_leaves_state_untouched() {
        let key = host().verifying_key();
        let mut state = state_with(1);
        let mut delta = state_with(3).delta(&GuestbookSummary { len: 1 });
        delta.messages[1].message.signed_date = 1;
        assert_eq!(
            state.apply_delta(delta, &key),
            Err(ReplicaError::BadSignature { index: 2 })
        );
        assert_eq!(state, state_with(1));
    }

    #[test]
    fn shorter_state_does_not_truncate() {
        let mut state = state_with(3);
        assert_eq!(state.extend_from(state_with(1), &host().verifying_key()).unwrap(), 0);
        assert_eq!(state.len(), 3);
    }
}
