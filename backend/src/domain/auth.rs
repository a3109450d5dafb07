//! Login credentials.
//!
//! Inbound adapters build [`LoginCredentials`] from raw request fields before
//! calling the [`crate::domain::ports::LoginService`] port.

use zeroize::Zeroizing;

/// Reasons a login payload is rejected before any lookup happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
}

impl LoginValidationError {
    /// Request field the failure refers to.
    pub const fn field(self) -> &'static str {
        match self {
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
        }
    }

    /// Stable machine-readable reason.
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyUsername => "empty_username",
            Self::EmptyPassword => "empty_password",
        }
    }
}

/// Validated login credentials.
///
/// The username is trimmed. The password keeps caller-provided whitespace and
/// is wiped from memory on drop.
///
/// # Examples
/// ```
/// use doctrack::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin ", "admin123").unwrap();
/// assert_eq!(creds.username(), "admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username used for the account lookup.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Plain-text password to verify against the stored hash.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("admin", "", LoginValidationError::EmptyPassword)]
    fn rejects_blank_fields(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("blank inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn keeps_password_whitespace() {
        let creds = LoginCredentials::try_from_parts("mayco.muniz", " pass ").expect("valid");
        assert_eq!(creds.username(), "mayco.muniz");
        assert_eq!(creds.password(), " pass ");
    }

    #[rstest]
    #[case(LoginValidationError::EmptyUsername, "username", "empty_username")]
    #[case(LoginValidationError::EmptyPassword, "password", "empty_password")]
    fn exposes_field_and_code(
        #[case] error: LoginValidationError,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        assert_eq!(error.field(), field);
        assert_eq!(error.code(), code);
    }
}
