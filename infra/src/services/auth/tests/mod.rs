#[cfg(test)]
mod rate_limiter_tests;
