//! Title matching key shared by the feed deduplicator and library lookups.

/// Lower-cases `title` and keeps only ASCII letters and digits, so
/// "Half-Life 2" and "half life 2" produce the same key.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_are_ignored() {
        assert_eq!(normalize_title("Half-Life 2"), "halflife2");
        assert_eq!(normalize_title("half life 2"), "halflife2");
        assert_eq!(normalize_title("DOOM (1993)"), "doom1993");
    }

    #[test]
    fn non_ascii_letters_are_stripped() {
        assert_eq!(normalize_title("Pokémon™ Café"), "pokmoncaf");
        assert_eq!(normalize_title(""), "");
    }
}
