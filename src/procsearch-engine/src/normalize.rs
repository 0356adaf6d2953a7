//! Case folding and whitespace tokenization shared by matching and highlighting.
//!
//! Folding maps every char to exactly one char, so a folded text has the
//! same char length as the original and offsets found in one are valid in
//! the other.

/// Lowercases a single char, keeping a one-to-one mapping.
///
/// Chars whose lowercase form expands to several chars (e.g. `İ`) fold to
/// the first char of that expansion.
#[inline]
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }
    c.to_lowercase().next().unwrap_or(c)
}

/// Folds a text into a vector of lowercase chars.
pub fn fold(text: &str) -> Vec<char> {
    text.chars().map(fold_char).collect()
}

/// Folds a text into a lowercase string.
pub fn fold_str(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Splits on runs of whitespace and lowercases each word.
///
/// Never yields empty tokens; an empty or blank input yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(fold_str).collect()
}

/// Like [`tokenize`], but returns each token as folded chars.
pub(crate) fn tokenize_chars(text: &str) -> Vec<Vec<char>> {
    text.split_whitespace().map(fold).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Nội soi  DẠ dày"), vec!["nội", "soi", "dạ", "dày"]);
    }

    #[test]
    fn test_tokenize_empty_and_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\n ").is_empty());
    }

    #[test]
    fn test_tokenize_mixed_whitespace() {
        assert_eq!(tokenize("\tnoi\n\nsoi  "), vec!["noi", "soi"]);
    }

    #[test]
    fn test_fold_preserves_char_length() {
        for text in ["İstanbul", "ĐIỆN TÂM ĐỒ", "ABC", "ß", ""] {
            assert_eq!(fold(text).len(), text.chars().count(), "{text}");
        }
        assert_eq!(fold_str("ĐIỆN TÂM ĐỒ"), "điện tâm đồ");
    }
}
