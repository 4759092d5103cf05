//! Client side of the guest book: node access, application state and
//! terminal rendering.

pub mod api;
pub mod app;
pub mod display;
pub mod session;

pub use api::{ApiError, GuestbookApi, NodeClient};
pub use app::{App, AppError};
