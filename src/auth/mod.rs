mod helpers;
mod middleware;
mod password;
mod token;

pub use helpers::{
    TokenValidationError, ValidatedToken, extract_token_from_header, issue_token, validate_token,
};
pub use middleware::{AuthError, RequireAdmin, RequireOwner};
pub use password::{MIN_PASSWORD_LENGTH, hash_password, verify_password};
pub use token::{IssuedToken, TokenGenerator, TokenParts, parse_token};
