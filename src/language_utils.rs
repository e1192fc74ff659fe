use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code helpers for the caption language setting.
///
/// yt-dlp selects caption tracks by the code it is given, so codes are only
/// validated and named here, never rewritten.

// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a 2- or 3-letter ISO 639 code, tolerating a region suffix such as `pt-BR`
pub fn resolve_language(code: &str) -> Result<Language> {
    let normalized = code.trim().to_lowercase();
    let primary = normalized
        .split(['-', '_'])
        .next()
        .unwrap_or_default();

    let language = match primary.len() {
        2 => Language::from_639_1(primary),
        3 => {
            let part2t = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == primary)
                .map(|(_, t)| *t)
                .unwrap_or(primary);
            Language::from_639_3(part2t)
        }
        _ => None,
    };

    language.ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Check that a caption language code is a known ISO 639 code
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve_language(code).map(|_| ())
}

/// English name of the language, e.g. "Portuguese" for "pt"
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_name().to_string())
}
