//! Input validators shared by the API handlers.
//!
//! Each returns `CoreError::Validation` with a message fit for the client.

use crate::error::CoreError;
use crate::format::VALID_FORMATS;
use crate::kdp::spreadsheet::is_supported_file;
use crate::roles::VALID_ROLES;

pub const MAX_TITLE_LENGTH: usize = 500;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 64;

pub const PROJECT_DRAFT: &str = "draft";
pub const PROJECT_IN_REVIEW: &str = "in_review";
pub const PROJECT_PUBLISHED: &str = "published";
pub const PROJECT_ARCHIVED: &str = "archived";

pub const VALID_PROJECT_STATUSES: &[&str] =
    &[PROJECT_DRAFT, PROJECT_IN_REVIEW, PROJECT_PUBLISHED, PROJECT_ARCHIVED];

fn one_of(kind: &str, value: &str, allowed: &[&str]) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid {kind} '{value}'. Must be one of: {allowed:?}"
        )))
    }
}

/// Non-empty after trimming and at most [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters (got {len})"
        )));
    }
    Ok(())
}

pub fn validate_format(format: &str) -> Result<(), CoreError> {
    one_of("format", format, VALID_FORMATS)
}

pub fn validate_project_status(status: &str) -> Result<(), CoreError> {
    one_of("project status", status, VALID_PROJECT_STATUSES)
}

pub fn validate_role(role: &str) -> Result<(), CoreError> {
    one_of("role", role, VALID_ROLES)
}

/// Shape check only: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let valid = match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Invalid email address '{email}'")))
    }
}

pub fn validate_username(username: &str) -> Result<(), CoreError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(CoreError::Validation(
            "Username may only contain letters, digits, '_', '-' and '.'".to_string(),
        ));
    }
    Ok(())
}

/// Uploaded report must be a spreadsheet or CSV and no larger than
/// `max_bytes`.
pub fn validate_upload(file_name: &str, size: usize, max_bytes: usize) -> Result<(), CoreError> {
    if !is_supported_file(file_name) {
        return Err(CoreError::Validation(format!(
            "Unsupported file type '{file_name}'. Upload an Excel (.xlsx, .xls) or CSV file"
        )));
    }
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "File exceeds maximum size of {} MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn validate_marketplace(marketplace: &str) -> Result<(), CoreError> {
    if marketplace.trim().is_empty() {
        return Err(CoreError::Validation("Marketplace must not be empty".to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn titles() {
        assert!(validate_title("The Salt Road").is_ok());
        assert_matches!(validate_title("   "), Err(CoreError::Validation(_)));
        assert_matches!(validate_title(&"x".repeat(501)), Err(CoreError::Validation(_)));
        assert!(validate_title(&"x".repeat(500)).is_ok());
    }

    #[test]
    fn enumerations() {
        assert!(validate_format("hardcover").is_ok());
        assert!(validate_format("audiobook").is_err());
        assert!(validate_project_status("in_review").is_ok());
        assert!(validate_project_status("deleted").is_err());
        assert!(validate_role("superadmin").is_ok());
        assert!(validate_role("root").is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("a da@example.com").is_err());
    }

    #[test]
    fn usernames() {
        assert!(validate_username("ada_q").is_ok());
        assert!(validate_username("ad").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
        assert!(validate_username("ada quill").is_err());
    }

    #[test]
    fn uploads() {
        let max = 50 * 1024 * 1024;
        assert!(validate_upload("report.xlsx", 10, max).is_ok());
        assert!(validate_upload("report.CSV", 10, max).is_ok());
        assert_matches!(validate_upload("report.pdf", 10, max), Err(CoreError::Validation(_)));
        assert!(validate_upload("report.csv", 0, max).is_err());
        assert!(validate_upload("report.csv", max + 1, max).is_err());
    }

    #[test]
    fn marketplaces() {
        assert!(validate_marketplace("Amazon.de").is_ok());
        assert!(validate_marketplace(" ").is_err());
    }
}
