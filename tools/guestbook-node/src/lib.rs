//! Host node for the guest book ledger.
//!
//! Plays the part of the platform around the ledger: it keeps the records and
//! account balances in sled, stamps each call with the caller, the attached
//! deposit and the block time, and serves the client's read and write calls
//! over HTTP.

pub mod config;
pub mod error;
pub mod router;
pub mod runtime;
pub mod store;

use std::sync::Arc;

pub use config::NodeConfig;
pub use error::NodeError;
pub use router::build_router;
pub use runtime::Runtime;
pub use store::SledStore;

/// Open the configured store and build the runtime on top of it.
pub fn open_runtime(config: &NodeConfig) -> Result<Arc<Runtime>, NodeError> {
    let store = if config.temporary {
        SledStore::temporary()?
    } else {
        SledStore::open(config.data_dir())?
    };
    Ok(Arc::new(Runtime::new(store, config)?))
}
