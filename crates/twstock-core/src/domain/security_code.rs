use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

pub const MIN_CODE_LEN: usize = 4;
pub const MAX_CODE_LEN: usize = 6;

/// Exchange security identifier: 4 to 6 ASCII digits (e.g. `2330`, `006208`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityCode(String);

impl SecurityCode {
    /// Parse a code, stripping the feed's `="..."` formula-escape decoration.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input
            .trim()
            .trim_start_matches('=')
            .trim_matches('"')
            .trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySecurityCode);
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if !ch.is_ascii_digit() {
                return Err(ValidationError::SecurityCodeInvalidChar { ch, index });
            }
        }

        let len = trimmed.len();
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
            return Err(ValidationError::SecurityCodeLength {
                len,
                min: MIN_CODE_LEN,
                max: MAX_CODE_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SecurityCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SecurityCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for SecurityCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SecurityCode> for String {
    fn from(value: SecurityCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_formula_escape_decoration() {
        let parsed = SecurityCode::parse("=\"2330\"").expect("code should parse");
        assert_eq!(parsed.as_str(), "2330");

        let etf = SecurityCode::parse("\"006208\"").expect("code should parse");
        assert_eq!(etf.as_str(), "006208");
    }

    #[test]
    fn rejects_wrong_length() {
        let err = SecurityCode::parse("123").expect_err("must fail");
        assert!(matches!(err, ValidationError::SecurityCodeLength { len: 3, .. }));

        let err = SecurityCode::parse("1234567").expect_err("must fail");
        assert!(matches!(err, ValidationError::SecurityCodeLength { len: 7, .. }));
    }

    #[test]
    fn rejects_non_digit_codes() {
        let err = SecurityCode::parse("00632R").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::SecurityCodeInvalidChar { ch: 'R', index: 5 }
        ));
    }
}
