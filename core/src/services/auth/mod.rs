//! Login service
//!
//! This module provides password login on top of the token lifecycle:
//! - Credential verification with bcrypt
//! - Account locking after repeated failures
//! - Current-identity lookup, refresh and logout

mod account_lock;
mod service;

#[cfg(test)]
mod tests;

pub use account_lock::AccountLockPolicy;
pub use service::{AuthService, LoginResult};
