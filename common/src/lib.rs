pub mod account;
pub mod balance;
pub mod call;
pub mod context;
pub mod ledger;
pub mod message;
pub mod replica;
pub mod store;
