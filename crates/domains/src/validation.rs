//! Input checks shared by uploads and author management.

use crate::error::{DomainError, Result};

/// Minimal structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
pub fn is_well_formed_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Accepts an author email only when its domain is on the institutional allow-list.
pub fn check_institutional_email(email: &str, allowed_domains: &[String]) -> Result<()> {
    if !is_well_formed_email(email) {
        return Err(DomainError::validation(format!("email '{email}' is not valid")));
    }
    let domain = email
        .rsplit_once('@')
        .map(|(_, d)| d.to_ascii_lowercase())
        .unwrap_or_default();
    if allowed_domains.iter().any(|d| d.eq_ignore_ascii_case(&domain)) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "email '{email}' does not belong to an allowed domain"
        )))
    }
}

/// Trims and rejects empty required text fields.
pub fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DomainError::validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Accepts only absolute http(s) links.
pub fn check_link(url: &str) -> Result<String> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !url.chars().any(char::is_whitespace) => {
            Ok(url.to_string())
        }
        _ => Err(DomainError::validation(format!("'{url}' is not a valid http(s) link"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["alumno.ipn.mx".to_string(), "ipn.mx".to_string()]
    }

    #[test]
    fn institutional_domains_are_accepted() {
        assert!(check_institutional_email("jperez@alumno.ipn.mx", &allowed()).is_ok());
        assert!(check_institutional_email("ana@IPN.MX", &allowed()).is_ok());
    }

    #[test]
    fn foreign_or_malformed_emails_are_rejected() {
        for email in [
            "jperez@gmail.com",
            "jperez@sub.ipn.mx",
            "no-at-sign",
            "@ipn.mx",
            "a b@ipn.mx",
            "x@ipn.mx.",
        ] {
            assert!(
                matches!(
                    check_institutional_email(email, &allowed()),
                    Err(DomainError::Validation(_))
                ),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(required_text("name", "  Tesis X ").unwrap(), "Tesis X");
        assert!(required_text("name", "   ").is_err());
    }

    #[test]
    fn links_must_be_http() {
        assert!(check_link("https://example.org/doc").is_ok());
        assert!(check_link("ftp://example.org").is_err());
        assert!(check_link("https://").is_err());
    }
}
