//! Domain entities representing core business objects.

pub mod identity;
pub mod token;

// Re-export commonly used types
pub use identity::{Identity, IdentityStatus, IdentitySummary};
pub use token::{
    SubjectType, TokenPair, TokenPayload, TokenSubject, TokenType, JWT_AUDIENCE, JWT_ISSUER,
};
