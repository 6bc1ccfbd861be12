//! Tests for the token manager and interceptor

#[cfg(test)]
mod interceptor_tests;
