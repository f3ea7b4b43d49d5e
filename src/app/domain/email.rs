use validator::ValidationError;

/// Maximum email length per RFC 5321.
const MAX_EMAIL_LEN: usize = 254;

/// Email domain type. Once constructed, guaranteed to be valid, trimmed, and lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

impl Email {
    /// Normalize (trim + lowercase) and validate an address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized = email.as_ref().trim().to_lowercase();

        if normalized.len() > MAX_EMAIL_LEN {
            return Err(invalid("email_too_long", "Email address is too long"));
        }

        let (local, domain) = normalized
            .split_once('@')
            .ok_or_else(|| invalid("invalid_email", "Invalid email address format"))?;
        if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(invalid("invalid_email", "Invalid email address format"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_and_lowercased() {
        let email = Email::new("  Ada@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
    }

    #[test]
    fn rejects_missing_at_or_domain() {
        assert!(Email::new("nobody").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("ada@localhost").is_err());
        assert!(Email::new("ada@example.").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let long = "a".repeat(250) + "@example.com";
        assert!(Email::new(long).is_err());
    }
}
