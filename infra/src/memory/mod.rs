//! Process-local implementations of the core storage ports
//!
//! State lives in `DashMap`s, so every operation on a single key is atomic
//! without a global lock. Nothing survives a restart and nothing is shared
//! between instances; use the Redis store for that.

mod identity_repository;
mod revocation_store;

#[cfg(test)]
mod tests;

pub use identity_repository::InMemoryIdentityRepository;
pub use revocation_store::InMemoryRevocationStore;
