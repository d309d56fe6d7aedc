use crate::error::{Error, Result};
use validator::{Validate, ValidateEmail};

pub fn validate<T: Validate>(val: &T) -> Result<()> {
    val.validate()?;
    Ok(())
}

/// Lowercases and trims an email. Dedup of candidate identities keys on the
/// result, so every path into storage must go through here.
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if !email.validate_email() {
        return Err(Error::Validation("a valid email address is required".into()));
    }
    Ok(email)
}

/// Multipart form flags arrive as text. Accepts "true"/"1" and "false"/"0",
/// rejects anything else.
pub fn parse_flag(field: &str, raw: &str) -> Result<bool> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::Validation(format!(
            "invalid boolean value for {}: {}",
            field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  Ann.Lee@Example.COM ").unwrap(),
            "ann.lee@example.com"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(normalize_email("").is_err());
        assert!(normalize_email("   ").is_err());
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("missing@tld@twice").is_err());
    }

    #[test]
    fn flags_accept_both_spellings() {
        assert!(parse_flag("rodo_consent", "true").unwrap());
        assert!(parse_flag("rodo_consent", "1").unwrap());
        assert!(!parse_flag("remember_me", "false").unwrap());
        assert!(!parse_flag("remember_me", "0").unwrap());
    }

    #[test]
    fn junk_flags_are_rejected() {
        let err = parse_flag("remember_me", "yes").unwrap_err();
        assert!(err.to_string().contains("remember_me"));
    }
}
