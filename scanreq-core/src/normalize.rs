//! Requirement name normalization.
//!
//! Turns a raw manifest token such as `" Django==3.2 "` into the comparable
//! identifier `"django"`. The same function is applied to distribution names
//! read from the environment, so both sides of a lookup agree.

use regex::Regex;
use std::sync::OnceLock;

/// Relational operator followed by a dotted numeric version (`==3.2`, `>1`, `!=2.0.1`).
fn version_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // SAFETY: hardcoded pattern, covered by tests.
    REGEX.get_or_init(|| {
        Regex::new(r"[<=>!]=?\d+(\.\d+)*").expect("Hardcoded regex pattern is valid")
    })
}

/// Hyphen directly followed by a non-alphanumeric character.
fn stray_separator_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"-[^a-zA-Z0-9]").expect("Hardcoded regex pattern is valid"))
}

/// Anything that cannot appear in a normalized name.
fn noise_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("Hardcoded regex pattern is valid"))
}

/// Normalizes a raw requirement token into a bare, lowercase package name.
///
/// Steps, applied in order:
/// 1. drop a relational operator with its numeric version
/// 2. drop a hyphen followed by a non-alphanumeric character
/// 3. drop every character other than ASCII letters, digits, `-` and `_`
/// 4. lowercase and trim
///
/// ```rust,ignore
/// assert_eq!(clean_package_name("Flask>=1.0"), "flask");
/// assert_eq!(clean_package_name("django-cookie-cutter>2.0"), "django-cookie-cutter");
/// ```
pub fn clean_package_name(raw: &str) -> String {
    let cleaned = version_regex().replace_all(raw, "");
    let cleaned = stray_separator_regex().replace_all(&cleaned, "");
    let cleaned = noise_regex().replace_all(&cleaned, "");
    cleaned.trim().to_lowercase()
}
