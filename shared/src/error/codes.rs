//! Numeric error codes
//!
//! Serialized as bare numbers so the frontend can switch on them. Each code
//! carries its default message and HTTP status in one table.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

macro_rules! error_codes {
    ($( $(#[$doc:meta])* $name:ident = $value:literal, $status:ident, $message:literal; )*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u16", try_from = "u16")]
        #[repr(u16)]
        pub enum ErrorCode {
            $( $(#[$doc])* $name = $value, )*
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$name, )* ];

            /// Default English message
            pub const fn message(&self) -> &'static str {
                match self {
                    $( ErrorCode::$name => $message, )*
                }
            }

            pub fn http_status(&self) -> StatusCode {
                match self {
                    $( ErrorCode::$name => StatusCode::$status, )*
                }
            }
        }

        impl TryFrom<u16> for ErrorCode {
            type Error = InvalidErrorCode;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(ErrorCode::$name), )*
                    _ => Err(InvalidErrorCode(value)),
                }
            }
        }
    };
}

error_codes! {
    // 0xxx general
    ValidationFailed = 2, BAD_REQUEST, "Validation failed";
    NotFound = 3, NOT_FOUND, "Record not found";
    AlreadyExists = 4, CONFLICT, "Record already exists";

    // 1xxx auth
    NotAuthenticated = 1001, UNAUTHORIZED, "User is not authenticated";
    InvalidCredentials = 1002, UNAUTHORIZED, "Invalid username or password";
    TokenExpired = 1003, UNAUTHORIZED, "Token has expired";
    TokenInvalid = 1004, UNAUTHORIZED, "Token is invalid";
    /// Login attempts from one address exceeded the window
    TooManyAttempts = 1005, TOO_MANY_REQUESTS, "Too many login attempts, try again later";
    CurrentPasswordMismatch = 1006, UNAUTHORIZED, "Current password is incorrect";

    // 2xxx permission
    SuperRoleRequired = 2002, FORBIDDEN, "Supervisor or leader role required";
    /// Kiosk write from outside the allowed networks
    NetworkNotAllowed = 2003, FORBIDDEN, "Access is only allowed from the warehouse network";
    CannotDeleteSelf = 2004, BAD_REQUEST, "Cannot delete your own account";

    // 3xxx resource
    SyncConfirmationRequired = 3001, BAD_REQUEST,
        "Sync requires confirm: true. This will DELETE all existing data and replace it with new data.";
    UsernameExists = 3002, CONFLICT, "Username is already taken";
    UnknownRole = 3003, BAD_REQUEST, "Unknown role";
    UserNotFound = 3004, NOT_FOUND, "User not found";

    // 9xxx system
    InternalError = 9001, INTERNAL_SERVER_ERROR, "Internal server error";
    DatabaseError = 9002, INTERNAL_SERVER_ERROR, "Database error";
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A number that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::TooManyAttempts.code(), 1005);
        assert_eq!(ErrorCode::NetworkNotAllowed.code(), 2003);
        assert_eq!(ErrorCode::SyncConfirmationRequired.code(), 3001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_every_code_roundtrips() {
        for &code in ErrorCode::ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
            assert!(!code.message().is_empty());
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(InvalidErrorCode(4242).to_string(), "invalid error code: 4242");
    }

    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::CannotDeleteSelf).unwrap(), "2004");
        let code: ErrorCode = serde_json::from_str("1003").unwrap();
        assert_eq!(code, ErrorCode::TokenExpired);
        assert!(serde_json::from_str::<ErrorCode>("77").is_err());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::SyncConfirmationRequired.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TooManyAttempts.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ErrorCode::NetworkNotAllowed.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::UsernameExists.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
