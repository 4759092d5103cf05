//! Freenet contract holding a replica of the guest book ledger.
//!
//! The contract never executes calls itself: it only accepts records signed
//! by the host node whose public key is the contract's parameters.

use ed25519_dalek::VerifyingKey;
use freenet_stdlib::prelude::*;
use guestbook_common::replica::{
    host_key_from_bytes, GuestbookDelta, GuestbookState, GuestbookSummary, ReplicaError,
};

fn rejected(e: ReplicaError) -> ContractError {
    ContractError::InvalidUpdateWithInfo {
        reason: e.to_string(),
    }
}

pub fn host_key(parameters: &Parameters<'_>) -> Result<VerifyingKey, ContractError> {
    host_key_from_bytes(parameters.as_ref()).map_err(|e| ContractError::Other(e.to_string()))
}

/// Empty state bytes mean a freshly deployed, empty guest book.
pub fn decode_state(bytes: &[u8]) -> Result<GuestbookState, ContractError> {
    if bytes.is_empty() {
        return Ok(GuestbookState::default());
    }
    serde_json::from_slice(bytes).map_err(|e| ContractError::Deser(e.to_string()))
}

pub fn validate(host: &VerifyingKey, state: &[u8]) -> ValidateResult {
    match decode_state(state) {
        Ok(guestbook) if guestbook.verify(host).is_ok() => ValidateResult::Valid,
        _ => ValidateResult::Invalid,
    }
}

fn merge_state(
    guestbook: &mut GuestbookState,
    host: &VerifyingKey,
    bytes: &[u8],
) -> Result<(), ContractError> {
    if bytes.is_empty() {
        return Ok(());
    }
    let other = decode_state(bytes)?;
    guestbook.extend_from(other, host).map_err(rejected)?;
    Ok(())
}

fn merge_delta(
    guestbook: &mut GuestbookState,
    host: &VerifyingKey,
    bytes: &[u8],
) -> Result<(), ContractError> {
    if bytes.is_empty() {
        return Ok(());
    }
    let delta: GuestbookDelta =
        serde_json::from_slice(bytes).map_err(|e| ContractError::Deser(e.to_string()))?;
    guestbook.apply_delta(delta, host).map_err(rejected)?;
    Ok(())
}

/// Fold every update into the current state. Any rejected update fails the
/// whole batch.
pub fn update(
    host: &VerifyingKey,
    state: &[u8],
    data: Vec<UpdateData<'_>>,
) -> Result<GuestbookState, ContractError> {
    let mut guestbook = decode_state(state)?;
    for ud in data {
        match ud {
            UpdateData::State(s) => merge_state(&mut guestbook, host, s.as_ref())?,
            UpdateData::Delta(d) => merge_delta(&mut guestbook, host, d.as_ref())?,
            UpdateData::StateAndDelta { state, delta } => {
                merge_state(&mut guestbook, host, state.as_ref())?;
                merge_delta(&mut guestbook, host, delta.as_ref())?;
            }
            _ => return Err(ContractError::InvalidUpdate),
        }
    }
    Ok(guestbook)
}

pub fn decode_summary(bytes: &[u8]) -> Result<GuestbookSummary, ContractError> {
    if bytes.is_empty() {
        return Ok(GuestbookSummary::default());
    }
    serde_json::from_slice(bytes).map_err(|e| ContractError::Deser(e.to_string()))
}

#[cfg(feature = "contract")]
mod contract_impl {
    use freenet_stdlib::prelude::*;

    use super::{decode_state, decode_summary, host_key, update, validate};

    pub struct Contract;

    #[contract]
    impl ContractInterface for Contract {
        fn validate_state(
            parameters: Parameters<'static>,
            state: State<'static>,
            _related: RelatedContracts<'static>,
        ) -> Result<ValidateResult, ContractError> {
            let host = host_key(&parameters)?;
            Ok(validate(&host, state.as_ref()))
        }

        fn update_state(
            parameters: Parameters<'static>,
            state: State<'static>,
            data: Vec<UpdateData<'static>>,
        ) -> Result<UpdateModification<'static>, ContractError> {
            let host = host_key(&parameters)?;
            let guestbook = update(&host, state.as_ref(), data)?;
            let serialized =
                serde_json::to_vec(&guestbook).map_err(|e| ContractError::Other(e.to_string()))?;
            Ok(UpdateModification::valid(State::from(serialized)))
        }

        fn summarize_state(
            _parameters: Parameters<'static>,
            state: State<'static>,
        ) -> Result<StateSummary<'static>, ContractError> {
            let guestbook = decode_state(state.as_ref())?;
            let serialized = serde_json::to_vec(&guestbook.summarize())
                .map_err(|e| ContractError::Other(e.to_string()))?;
            Ok(StateSummary::from(serialized))
        }

        fn get_state_delta(
            _parameters: Parameters<'static>,
            state: State<'static>,
            summary: StateSummary<'static>,
        ) -> Result<StateDelta<'static>, ContractError> {
            let guestbook = decode_state(state.as_ref())?;
            let summary = decode_summary(summary.as_ref())?;
            let serialized = serde_json::to_vec(&guestbook.delta(&summary))
                .map_err(|e| ContractError::Other(e.to_string()))?;
            Ok(StateDelta::from(serialized))
        }
    }
}
