use crate::checkout_objects::ValidationError;

pub const DEFAULT_COUNTRY_CODE: &str = "255";
pub const DEFAULT_NATIONAL_DIGITS: usize = 9;

/// Normalizes buyer phone numbers into the international form the payment provider expects, without a leading `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    country_code: String,
    national_digits: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_DIGITS)
    }
}

impl PhoneRules {
    pub fn new<S: Into<String>>(country_code: S, national_digits: usize) -> Self {
        Self { country_code: country_code.into(), national_digits }
    }

    pub fn country_code(&self) -> &str {
        self.country_code.as_str()
    }

    /// `0712 345 678`, `+255 712 345 678` and `255712345678` all become `255712345678`.
    ///
    /// Whitespace is removed, then a leading `+` is dropped and a leading national `0` is replaced with the country
    /// code. Anything that is not then the country code followed by exactly the expected number of digits is
    /// rejected.
    pub fn normalize(&self, raw: &str) -> Result<String, ValidationError> {
        let compact = raw.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        if compact.is_empty() {
            return Err(ValidationError::MissingPhone);
        }
        let compact = compact.strip_prefix('+').unwrap_or(&compact);
        let normalized = match compact.strip_prefix('0') {
            Some(national) => format!("{}{national}", self.country_code),
            None => compact.to_string(),
        };
        let national = normalized.strip_prefix(self.country_code.as_str());
        match national {
            Some(n) if n.len() == self.national_digits && n.chars().all(|c| c.is_ascii_digit()) => Ok(normalized),
            _ => Err(ValidationError::InvalidPhone(raw.to_string())),
        }
    }
}
