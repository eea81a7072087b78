use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for ISO-4217 currency codes as accepted by the payment vendors
    /// - Valid: "USD", "EUR", "RUB"
    /// - Invalid: "usd", "US", "USDT", "U5D"
    pub static ref CURRENCY_REGEX: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();

    /// Regex for the primary subtag of an IETF language tag reported by Telegram
    /// - Valid: "en", "ru-RU" (captures "ru"), "zh-hans" (captures "zh")
    /// - Invalid: "", "1en", "e"
    pub static ref LANGUAGE_TAG_REGEX: Regex =
        Regex::new(r"^([A-Za-z]{2,3})(?:[-_][A-Za-z0-9]{1,8})*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_regex_valid() {
        assert!(CURRENCY_REGEX.is_match("USD"));
        assert!(CURRENCY_REGEX.is_match("EUR"));
        assert!(CURRENCY_REGEX.is_match("RUB"));
    }

    #[test]
    fn test_currency_regex_invalid() {
        assert!(!CURRENCY_REGEX.is_match("usd")); // lowercase
        assert!(!CURRENCY_REGEX.is_match("US")); // too short
        assert!(!CURRENCY_REGEX.is_match("USDT")); // too long
        assert!(!CURRENCY_REGEX.is_match("U5D")); // digit
        assert!(!CURRENCY_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_language_tag_regex_captures_primary_subtag() {
        let primary = |tag: &str| {
            LANGUAGE_TAG_REGEX
                .captures(tag)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };
        assert_eq!(primary("en").as_deref(), Some("en"));
        assert_eq!(primary("ru-RU").as_deref(), Some("ru"));
        assert_eq!(primary("zh-hans").as_deref(), Some("zh"));
        assert_eq!(primary("pt_br").as_deref(), Some("pt"));
        assert_eq!(primary(""), None);
        assert_eq!(primary("1en"), None);
        assert_eq!(primary("e"), None);
    }
}
