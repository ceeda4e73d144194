//! URL slug derivation for catalog titles.

/// Derive a URL-safe slug from a beat title.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, and strips leading/trailing dashes. The repository layer
/// appends a timestamp suffix when the result collides with an existing slug.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slug variant used when `slug` is already taken: `{slug}-{millis}`.
pub fn with_collision_suffix(slug: &str, timestamp_millis: i64) -> String {
    format!("{slug}-{timestamp_millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_dashes() {
        assert_eq!(slugify("Midnight Drive"), "midnight-drive");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Trap / Soul (Remix)!!"), "trap-soul-remix");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(slugify("--- Hot Beat ---"), "hot-beat");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("808 Nights, Vol. 2"), "808-nights-vol-2");
    }

    #[test]
    fn collision_suffix_is_appended() {
        assert_eq!(
            with_collision_suffix("midnight-drive", 1700000000000),
            "midnight-drive-1700000000000"
        );
    }
}
