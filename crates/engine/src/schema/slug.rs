//! URL slug generation.

/// Converts text into a URL slug.
///
/// ASCII letters and digits are kept and lowercased. Every run of other
/// characters collapses into a single `-`, and the result never starts or
/// ends with one.
///
/// ```
/// use shopdesk_engine::schema::slugify;
///
/// assert_eq!(slugify("Red T-Shirt!!"), "red-t-shirt");
/// assert_eq!(slugify("  Fall / Winter 2024  "), "fall-winter-2024");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}
