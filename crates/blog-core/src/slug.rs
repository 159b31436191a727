//! URL-safe identifiers derived from titles and tag names.

/// Transliterated to ASCII, lower-cased, with every run of other characters
/// collapsed to a single hyphen. Falls back to `post` when nothing is left.
pub fn slugify(text: &str) -> String {
    let slug = ::slug::slugify(text);
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}
