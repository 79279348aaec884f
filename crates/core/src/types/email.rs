//! Email addresses typed into the registration form.

/// Rejected address, with the reason shown in logs.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid email: {0}")]
pub struct EmailError(&'static str);

/// A trimmed address of the shape `local@domain`.
///
/// The backend decides whether an account may use it; this only stops
/// obvious typos before a registration round trip.
///
/// ```
/// use portal_core::Email;
///
/// assert_eq!(Email::parse(" ada@example.com ").unwrap().as_str(), "ada@example.com");
/// assert!(Email::parse("ada@").is_err());
/// assert!(Email::parse("ada lovelace@example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// # Errors
    ///
    /// Returns `EmailError` when the trimmed input is empty, too long,
    /// contains whitespace, or lacks exactly one `@` between two non-empty
    /// parts.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let address = input.trim();
        if address.is_empty() {
            return Err(EmailError("empty"));
        }
        if address.len() > Self::MAX_LENGTH {
            return Err(EmailError("too long"));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(EmailError("contains whitespace"));
        }
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(address.to_owned()))
            }
            _ => Err(EmailError("expected local@domain")),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_form_input() {
        for input in ["ada@example.com", "ada+portal@mail.example.org", "  a@b\n"] {
            assert!(Email::parse(input).is_ok(), "{input:?} rejected");
        }
    }

    #[test]
    fn test_rejects_typos() {
        for input in ["", "   ", "ada", "@example.com", "ada@", "ada@@example.com", "a da@example.com"] {
            assert!(Email::parse(input).is_err(), "{input:?} accepted");
        }
        let long = format!("{}@example.com", "a".repeat(Email::MAX_LENGTH));
        assert_eq!(Email::parse(&long), Err(EmailError("too long")));
    }
}
