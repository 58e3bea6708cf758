mod amount;
mod helpers;

pub mod op;
mod secret;

pub use amount::{Amount, AmountConversionError, DEFAULT_CURRENCY};
pub use helpers::parse_boolean_flag;
pub use secret::Secret;
