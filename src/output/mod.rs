//! Output validation

mod validator;

pub use validator::OutputValidator;
