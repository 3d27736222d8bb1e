mod helpers;
pub mod op;
mod secret;
mod vnd;

pub use helpers::parse_boolean_flag;
pub use secret::Secret;
pub use vnd::{Vnd, VndConversionError};
