pub mod account;
pub mod auth;
pub mod crypto;
pub mod event;
pub mod log;
pub mod session;
pub mod visibility;
pub mod workflow;
