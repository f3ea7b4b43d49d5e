use serde_json::Value;

/// Slug length bounds (inclusive).
pub const SLUG_MIN_LEN: usize = 3;
pub const SLUG_MAX_LEN: usize = 48;

/// Check a caller-supplied slug: lowercase ASCII letters, digits and single hyphens,
/// no leading/trailing hyphen.
pub fn check_slug(slug: &str) -> Result<(), &'static str> {
    if slug.len() < SLUG_MIN_LEN || slug.len() > SLUG_MAX_LEN {
        return Err("Slug must be between 3 and 48 characters.");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Slug may only contain lowercase letters, digits and hyphens.");
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err("Slug must not start or end with a hyphen or contain consecutive hyphens.");
    }
    Ok(())
}

/// Derive a slug from a display name: lowercase, non-alphanumerics collapsed to a
/// single hyphen, trimmed and truncated to `SLUG_MAX_LEN`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(SLUG_MAX_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Free-form metadata must be a JSON object when present.
pub fn check_json_object(value: Option<&Value>) -> Result<(), &'static str> {
    match value {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err("Metadata must be a JSON object."),
    }
}

/// Trimmed text, with whitespace-only treated as absent.
pub fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}
