#[cfg(test)]
mod identity_repository_tests;
