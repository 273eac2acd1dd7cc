//! CPF (document number) normalization
//!
//! Validation and formatting are deliberately separate: the store formats
//! every CPF it writes but never rejects one. Callers decide whether an
//! invalid number may be saved.

/// Number of digits in a CPF
pub const DOCUMENT_DIGITS: usize = 11;

/// Keep only the ASCII digits of `raw`
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check a CPF against the national check-digit algorithm.
///
/// Punctuation is ignored. Exactly eleven digits are required, and the
/// repeated-digit sequences (`000.000.000-00`, `111.111.111-11`, ...) are
/// rejected even though their check digits work out.
pub fn is_valid_document(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != DOCUMENT_DIGITS {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Mod-11 check digit over `base`, weights descending from `base.len() + 1` to 2
fn check_digit(base: &[u32]) -> u32 {
    let top = base.len() as u32 + 1;
    let sum: u32 = base
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => r,
    }
}

/// Insert the canonical punctuation into an eleven-digit string: `DDD.DDD.DDD-DD`.
///
/// Does not validate check digits. Anything that is not exactly eleven digits
/// comes back as its bare digits, so re-normalizing a result is a no-op.
pub fn format_document(raw_digits: &str) -> String {
    let digits = strip_non_digits(raw_digits);
    if digits.len() != DOCUMENT_DIGITS {
        return digits;
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Strip then format: the form every CPF is stored and searched in
pub fn normalize_document(raw: &str) -> String {
    format_document(&strip_non_digits(raw))
}

/// Hide the middle digits for printed documents: `529.***.***-25`
pub fn mask_document(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    if digits.len() < 5 {
        return "***.***.***-**".to_string();
    }
    format!("{}.***.***-{}", &digits[..3], &digits[digits.len() - 2..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_documents() {
        assert!(is_valid_document("52998224725"));
        assert!(is_valid_document("529.982.247-25"));
        assert!(is_valid_document("111.444.777-35"));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(!is_valid_document("52998224724"));
        assert!(!is_valid_document("5299822472"));
        assert!(!is_valid_document("529982247250"));
        assert!(!is_valid_document(""));
        assert!(!is_valid_document("111.111.111-11"));
        assert!(!is_valid_document("00000000000"));
    }

    #[test]
    fn test_format_document() {
        assert_eq!(format_document("52998224725"), "529.982.247-25");
        assert_eq!(format_document("12345"), "12345");
        assert_eq!(format_document(""), "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["529.982.247-25", "52998224725", " 529 982 247 25 ", "123", "1234567890123", "abc"] {
            let once = format_document(&strip_non_digits(raw));
            let twice = format_document(&strip_non_digits(&once));
            assert_eq!(once, twice, "input {raw:?}");
        }
    }

    #[test]
    fn test_mask_document() {
        assert_eq!(mask_document("529.982.247-25"), "529.***.***-25");
        assert_eq!(mask_document("12"), "***.***.***-**");
    }
}
