//! Phone number normalization.
//!
//! Both the conversation registry key and the gateway chat address are
//! derived through this one module, so a lookup on an inbound sender key
//! always matches a key produced at send time.

/// Platform suffix for direct-chat addresses.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Country code substituted for a local trunk "0" prefix.
const COUNTRY_PREFIX: &str = "212";

/// Canonicalize a free-text phone number into a digit-string key.
///
/// Strips whitespace, hyphens, parentheses and periods, drops one leading
/// `+`, and replaces one leading `0` with the country prefix. Pure and
/// total: malformed input yields a nonsensical but deterministic key.
/// Idempotent on already-canonical keys.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    match cleaned.strip_prefix('0') {
        Some(rest) => format!("{COUNTRY_PREFIX}{rest}"),
        None => cleaned.to_string(),
    }
}

/// Build the gateway chat address for a normalized key.
pub fn chat_address(key: &str) -> String {
    format!("{key}{CHAT_SUFFIX}")
}

/// Strip the chat suffix from an inbound sender address.
pub fn sender_key(address: &str) -> &str {
    address.strip_suffix(CHAT_SUFFIX).unwrap_or(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_becomes_country_prefix() {
        assert_eq!(normalize("0612345678"), "212612345678");
    }

    #[test]
    fn leading_plus_is_stripped() {
        assert_eq!(normalize("+212612345678"), "212612345678");
    }

    #[test]
    fn separators_are_stripped() {
        assert_eq!(normalize("06-12 34.56(78)"), "212612345678");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("0612345678");
        assert_eq!(normalize(&once), once);
        // A canonical key never triggers a second prefix substitution.
        assert_eq!(normalize("212612345678"), "212612345678");
    }

    #[test]
    fn only_first_zero_is_replaced() {
        assert_eq!(normalize("0012345"), "212012345");
    }

    #[test]
    fn plus_stripped_before_zero_check() {
        // "+0..." loses the plus, then the zero is substituted.
        assert_eq!(normalize("+0612345678"), "212612345678");
    }

    #[test]
    fn address_round_trip() {
        let key = normalize("0612345678");
        let address = chat_address(&key);
        assert_eq!(address, "212612345678@c.us");
        assert_eq!(sender_key(&address), key);
    }

    #[test]
    fn sender_key_passes_through_bare_keys() {
        assert_eq!(sender_key("212612345678"), "212612345678");
    }
}
