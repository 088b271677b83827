//! Locale resolution from `Accept-Language`.
//!
//! Only the first preference is considered; quality values are not ranked.
//! Neither function fails: a missing or empty header resolves to `""`.

/// Returns the first locale of an `Accept-Language` value.
///
/// ```
/// use janus_core::locale::main_locale;
///
/// assert_eq!(main_locale(Some("fr-FR,en;q=0.8")), "fr-FR");
/// assert_eq!(main_locale(Some("de;q=0.9")), "de");
/// assert_eq!(main_locale(None), "");
/// ```
#[must_use]
pub fn main_locale(accept_language: Option<&str>) -> &str {
    accept_language
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.split(';').next())
        .map_or("", str::trim)
}

/// Returns the language part of the first locale.
///
/// ```
/// use janus_core::locale::main_lang;
///
/// assert_eq!(main_lang(Some("fr-FR,en;q=0.8")), "fr");
/// assert_eq!(main_lang(None), "");
/// ```
#[must_use]
pub fn main_lang(accept_language: Option<&str>) -> &str {
    main_locale(accept_language)
        .split('-')
        .next()
        .unwrap_or_default()
}
