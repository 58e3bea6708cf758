mod order_number;
mod phone;

pub use order_number::new_order_number;
pub use phone::{PhoneRules, DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_DIGITS};
