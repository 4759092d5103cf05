use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use guestbook_common::account::AccountId;
use guestbook_common::balance::{parse_near_amount, Balance};

#[derive(Debug, Clone, Parser)]
#[command(name = "guestbook-node", about = "Guest book host node and relay")]
pub struct NodeConfig {
    /// Address to serve the HTTP API on.
    #[arg(long, default_value = "127.0.0.1:3030")]
    pub listen: SocketAddr,

    /// Directory holding the sled database (default: <data dir>/guestbook-node).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep all state in memory and discard it on exit.
    #[arg(long)]
    pub temporary: bool,

    /// Account the guest book contract is deployed under.
    #[arg(long, default_value = "guestbook.test")]
    pub contract_id: AccountId,

    /// Whole tokens credited to an account the first time it is seen.
    #[arg(long, default_value = "100", value_parser = parse_tokens)]
    pub initial_balance: Balance,
}

fn parse_tokens(s: &str) -> Result<Balance, String> {
    parse_near_amount(s).map_err(|e| e.to_string())
}

impl NodeConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("guestbook-node")
        })
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::parse_from(["guestbook-node"])
    }
}
