pub mod auth;
pub mod cors;

pub use auth::{AccessTokenVerifier, AuthContext, JwtAuth, OptionalAuth};
pub use cors::create_cors;
