use serde::{Deserialize, Deserializer};

/// Normalizes free text typed into the form by stripping surrounding
/// whitespace and composing it into Unicode Normalization Form C.
/// Text that is empty after trimming counts as not provided.
///
/// ```
/// use giftwise::normalization::normalize_text;
/// assert_eq!(normalize_text(" Aisha "), Some("Aisha".to_owned()));
/// assert_eq!(normalize_text("   "), None);
/// ```
pub fn normalize_text(text: impl AsRef<str>) -> Option<String> {
    use unicode_normalization::UnicodeNormalization;

    let trimmed = text.as_ref().trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.nfc().collect())
    }
}

/// Deserializes an optional `String` after running it through `normalize_text`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let o: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(o.and_then(normalize_text))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use unicode_normalization::is_nfc;

    use super::normalize_text;

    fn count_whitespace(s: impl AsRef<str>) -> usize {
        s.as_ref().chars().filter(|c| c.is_whitespace()).count()
    }

    #[test]
    fn decomposed_names_are_composed() {
        assert_eq!(normalize_text("Zoe\u{301}"), Some("Zoé".to_owned()));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 10000, ..ProptestConfig::default()
        })]

        #[test]
        fn normalization_works(string in "(\\S.*\\S|\\S+)", space_before in "\\s*", space_after in "\\s*") {
            let normalized = normalize_text(format!("{}{}{}", space_before, string, space_after));
            prop_assert!(normalized.is_some(), "{:?} is not blank", string);

            let normalized = normalized.unwrap();

            prop_assert!(is_nfc(&normalized), "{:?} (normalized form of {:?}) is in NFC", normalized, string);

            prop_assert!(!normalized.starts_with(char::is_whitespace) && !normalized.ends_with(char::is_whitespace), "{:?} (normalized form of {:?}) has no leading or trailing whitespace", normalized, string);

            let trimmed = normalized.trim();

            prop_assert_eq!(count_whitespace(&normalized), count_whitespace(&trimmed), "{:?} (normalized form of {:?}) preserves inner whitespace", normalized, string);
        }

        #[test]
        fn blank_text_is_dropped(blank in "\\s*") {
            prop_assert_eq!(normalize_text(blank), None);
        }
    }
}
