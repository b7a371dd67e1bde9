//! Password hashing and token issuance.

mod password_hasher;
mod token_issuer;

pub use password_hasher::PasswordHasher;
pub use token_issuer::{SessionToken, TokenIssuer};
