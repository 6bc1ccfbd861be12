//! Token service module for JWT management
//!
//! This module handles all token-related operations including:
//! - Encoding, inspecting and verifying tokens (`codec`)
//! - Issuing access/refresh pairs under a per-identity rate limit
//! - One-shot refresh token rotation
//! - Revocation and background cleanup of the revocation set

pub mod codec;
mod cleanup;
mod config;
mod rate_limiter;
mod service;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use codec::{DecodeError, EncodedToken, TokenCodec, VerificationError};
pub use config::TokenServiceConfig;
pub use rate_limiter::{IssuanceRateLimiter, RateLimitDecision};
pub use service::{retained_until, token_digest, InvalidReason, TokenService, Verification};
