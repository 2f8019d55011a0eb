//! Placeholder ISBNs for books that do not have a real one yet.
//!
//! Every book needs a unique identifier before it is published; drafts get
//! `PlaceHolder-XXXXXXXX` until the author assigns a real ISBN.

use rand::Rng;

pub const PLACEHOLDER_PREFIX: &str = "PlaceHolder-";

/// Attempts at a random placeholder before falling back to a timestamp.
pub const MAX_PLACEHOLDER_ATTEMPTS: usize = 100;

/// `PlaceHolder-` followed by 8 random digits.
pub fn random_placeholder() -> String {
    let n: u32 = rand::rng().random_range(10_000_000..=99_999_999);
    format!("{PLACEHOLDER_PREFIX}{n}")
}

/// Last-resort placeholder from the low 8 digits of a millisecond timestamp.
pub fn timestamp_placeholder(millis: i64) -> String {
    format!("{PLACEHOLDER_PREFIX}{:08}", millis.rem_euclid(100_000_000))
}

pub fn is_placeholder(isbn: &str) -> bool {
    isbn.strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|rest| rest.len() == 8 && rest.bytes().all(|b| b.is_ascii_digit()))
}
