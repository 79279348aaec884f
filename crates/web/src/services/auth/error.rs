//! Form validation errors.

use thiserror::Error;

/// A form check that failed before any backend call was made.
///
/// Each variant maps to a message key so pages can show it in the
/// visitor's language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was empty.
    #[error("all fields are required")]
    FieldsRequired,

    /// Email address did not parse.
    #[error("invalid email address")]
    InvalidEmail,

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password shorter than the minimum length.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum number of characters.
        min: usize,
    },
}

impl ValidationError {
    /// The message catalog key for this error.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::FieldsRequired => "register.fieldsRequired",
            Self::InvalidEmail => "register.invalidEmail",
            Self::PasswordMismatch => "register.passwordMismatch",
            Self::PasswordTooShort { .. } => "register.passwordTooShort",
        }
    }
}
