use std::sync::OnceLock;

use regex::Regex;

fn ifsc_pattern() -> &'static Regex {
    static IFSC: OnceLock<Regex> = OnceLock::new();
    IFSC.get_or_init(|| Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("IFSC pattern is valid"))
}

/// Four bank letters, a literal zero, then a six character branch code.
pub fn is_valid_ifsc(code: &str) -> bool {
    ifsc_pattern().is_match(code)
}

pub fn is_valid_account_number(account_number: &str) -> bool {
    (9..=18).contains(&account_number.len())
        && account_number.chars().all(|c| c.is_ascii_digit())
}
