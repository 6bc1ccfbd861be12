pub mod error;

pub use error::{
    error_response_builder, error_status, handle_domain_error, handle_validation_errors,
};
