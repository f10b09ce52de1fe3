use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

/// Remove everything that is not a decimal digit.
pub fn strip_non_digits(raw: &str) -> String {
    NON_DIGIT.replace_all(raw, "").into_owned()
}

/// Display format for a partially typed CEP.
///
/// Once more than 5 digits are present, a single hyphen goes after the 5th
/// digit. Digits past the 8th never show up in the formatted value.
pub fn format_partial(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    if digits.len() > 5 {
        let tail_end = digits.len().min(8);
        format!("{}-{}", &digits[..5], &digits[5..tail_end])
    } else {
        digits
    }
}

/// A validated CEP: exactly 8 decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cep(String);

impl Cep {
    /// Parse from raw user input, stripping separators and anything else
    /// that is not a digit. Anything other than exactly 8 digits is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = strip_non_digits(raw);
        if digits.len() == 8 { Some(Self(digits)) } else { None }
    }

    /// The bare 8-digit form, as it goes into lookup URLs.
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    /// Hyphenated `XXXXX-XXX` form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..5], &self.0[5..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_non_digits() {
        assert_eq!(strip_non_digits("01310-100"), "01310100");
        assert_eq!(strip_non_digits("01310-100abc"), "01310100");
        assert_eq!(strip_non_digits("a b c"), "");
        assert_eq!(strip_non_digits(""), "");
    }

    #[test]
    fn test_format_partial() {
        assert_eq!(format_partial(""), "");
        assert_eq!(format_partial("0"), "0");
        assert_eq!(format_partial("01310"), "01310");
        assert_eq!(format_partial("013101"), "01310-1");
        assert_eq!(format_partial("01310100"), "01310-100");
        // non-digits are stripped before formatting
        assert_eq!(format_partial("01310-100"), "01310-100");
        assert_eq!(format_partial("01.310.100"), "01310-100");
        // digits past the 8th are not shown
        assert_eq!(format_partial("0131010099"), "01310-100");
    }

    #[test]
    fn test_format_partial_single_hyphen() {
        for raw in ["01310100", "01310-100", "-01310100-", "0-1-3-1-0-1-0-0"] {
            let formatted = format_partial(raw);
            assert_eq!(formatted.matches('-').count(), 1, "input {raw:?}");
            assert_eq!(formatted, "01310-100", "input {raw:?}");
        }
    }

    #[test]
    fn test_parse() {
        let cep = Cep::parse("01310-100abc").unwrap();
        assert_eq!(cep.digits(), "01310100");
        assert_eq!(cep.to_string(), "01310-100");

        assert!(Cep::parse("0131010").is_none());
        assert!(Cep::parse("013101000").is_none());
        assert!(Cep::parse("").is_none());
        assert!(Cep::parse("abcdefgh").is_none());
    }
}
