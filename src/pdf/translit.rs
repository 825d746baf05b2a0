use regex::Regex;
use std::sync::OnceLock;

/// Maps Turkish diacritic letters to their closest ASCII equivalent,
/// case-preserving; every other character passes through unchanged.
/// Used for all rendered text when the Unicode font could not be fetched.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ç' => 'c',
            'Ç' => 'C',
            'ğ' => 'g',
            'Ğ' => 'G',
            'ı' => 'i',
            'İ' => 'I',
            'ö' => 'o',
            'Ö' => 'O',
            'ş' => 's',
            'Ş' => 'S',
            'ü' => 'u',
            'Ü' => 'U',
            other => other,
        })
        .collect()
}

/// Upper-cases with Turkish dotted/dotless rules (i → İ, ı → I) so the
/// participant name line follows the local convention.
pub fn turkish_upper(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'i' => out.push('İ'),
            'ı' => out.push('I'),
            other => out.extend(other.to_uppercase()),
        }
    }
    out
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Download-file stem: transliterate always (regardless of font status),
/// collapse whitespace runs to a single underscore, drop everything outside
/// [A-Za-z0-9_].
pub fn file_name_stem(name: &str) -> String {
    let flattened = sanitize(name.trim());
    let underscored = whitespace_run().replace_all(&flattened, "_");
    underscored
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIACRITICS: &str = "çÇğĞıİöÖşŞüÜ";

    #[test]
    fn sanitize_removes_every_diacritic() {
        let out = sanitize(DIACRITICS);
        assert_eq!(out, "cCgGiIoOsSuU");
        for c in DIACRITICS.chars() {
            assert!(!out.contains(c));
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["Ahmet Yılmaz", DIACRITICS, "hiç değişmeyen ascii", ""] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn sanitize_preserves_case_and_passthrough() {
        assert_eq!(sanitize("Gülşen ÖZTÜRK"), "Gulsen OZTURK");
        assert_eq!(sanitize("plain text 123!"), "plain text 123!");
    }

    #[test]
    fn turkish_upper_handles_dotted_i() {
        assert_eq!(turkish_upper("izmir ılgın"), "İZMİR ILGIN");
        assert_eq!(turkish_upper("Ahmet Yılmaz"), "AHMET YILMAZ");
    }

    #[test]
    fn file_name_stem_strips_and_underscores() {
        assert_eq!(file_name_stem("Ahmet Yılmaz"), "Ahmet_Yilmaz");
        assert_eq!(file_name_stem("  Gül  Şen  "), "Gul_Sen");
        assert_eq!(file_name_stem("a/b\\c:d*e"), "abcde");
        assert_eq!(file_name_stem("tab\tand\nnewline"), "tab_and_newline");
    }
}
