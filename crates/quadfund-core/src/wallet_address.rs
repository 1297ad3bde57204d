//! Wallet address normalisation
//!
//! Some stored owners are JSON-encoded arrays (`["0xabc"]`) instead of plain
//! addresses. Every comparison goes through these helpers.

/// One address from a query or form field: unwraps a JSON array encoding,
/// strips brackets and quotes, lowercases. Only the first entry survives, so
/// stored owner lists go through [`canonical_wallet`] instead.
pub fn normalize_wallet(raw: &str) -> String {
    candidates(raw)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// All addresses encoded in a stored value, normalised.
pub fn candidates(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list
                .iter()
                .map(|w| strip(w))
                .filter(|w| !w.is_empty())
                .collect();
        }
    }
    let stripped = strip(trimmed);
    if stripped.is_empty() {
        Vec::new()
    } else {
        vec![stripped]
    }
}

/// Stored form of an owner value. A single owner becomes a plain normalised
/// address; several owners stay a JSON array with every entry normalised.
pub fn canonical_wallet(raw: &str) -> String {
    let mut owners = candidates(raw);
    match owners.len() {
        0 => String::new(),
        1 => owners.remove(0),
        _ => serde_json::Value::from(owners).to_string(),
    }
}

fn strip(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '[' | ']' | '"'))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn without_prefix(addr: &str) -> &str {
    addr.strip_prefix("0x").unwrap_or(addr)
}

/// Equal after normalisation, tolerating a missing `0x` on either side.
pub fn wallets_match(a: &str, b: &str) -> bool {
    let a = normalize_wallet(a);
    let b = normalize_wallet(b);
    !a.is_empty() && without_prefix(&a) == without_prefix(&b)
}

/// Whether `provided` is one of the owners encoded in `stored`.
pub fn is_owner(stored: &str, provided: &str) -> bool {
    let provided = normalize_wallet(provided);
    if provided.is_empty() {
        return false;
    }
    candidates(stored)
        .iter()
        .any(|owner| without_prefix(owner) == without_prefix(&provided))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_address() {
        assert_eq!(normalize_wallet("  0xABCdef "), "0xabcdef");
    }

    #[test]
    fn test_normalize_json_array() {
        assert_eq!(normalize_wallet("[\"0xAbC\"]"), "0xabc");
    }

    #[test]
    fn test_normalize_broken_json_array() {
        assert_eq!(normalize_wallet("[\"0xabc\""), "0xabc");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_wallet(""), "");
        assert_eq!(normalize_wallet("[]"), "");
    }

    #[test]
    fn test_match_ignores_prefix_and_case() {
        assert!(wallets_match("0xABC", "abc"));
        assert!(wallets_match("abc", "0xabc"));
        assert!(wallets_match("[\"0xabc\"]", "0xABC"));
        assert!(!wallets_match("0xabc", "0xabd"));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!wallets_match("", ""));
        assert!(!is_owner("", ""));
        assert!(!is_owner("0xabc", ""));
    }

    #[test]
    fn test_owner_in_json_array_list() {
        let stored = "[\"0x111\", \"0x222\"]";
        assert!(is_owner(stored, "0x222"));
        assert!(is_owner(stored, "111"));
        assert!(!is_owner(stored, "0x333"));
    }

    #[test]
    fn test_canonical_keeps_every_owner() {
        assert_eq!(canonical_wallet("[\"0xAB\"]"), "0xab");
        assert_eq!(canonical_wallet(" 0xAB "), "0xab");
        assert_eq!(canonical_wallet("[]"), "");

        let shared = canonical_wallet("[\"0x111\", \"0xABC\"]");
        assert_eq!(shared, "[\"0x111\",\"0xabc\"]");
        assert!(is_owner(&shared, "0x111"));
        assert!(is_owner(&shared, "0xABC"));
        assert_eq!(canonical_wallet(&shared), shared);
    }

    #[test]
    fn test_owner_plain_string() {
        assert!(is_owner("0xowner", "0xOWNER"));
        assert!(!is_owner("0xowner", "0xother"));
    }
}
