//! Input syntax checks shared by the API layer.

use std::sync::OnceLock;

use regex::Regex;

/// Basic email syntax check used at checkout: something before the `@`,
/// a domain with at least one dot, no whitespace anywhere.
///
/// Deliverability is not verified; a bounced confirmation email does not
/// invalidate the purchase (the download token works regardless).
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile")
    });
    re.is_match(email)
}
