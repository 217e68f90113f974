// ABOUTME: Credential handling for Tandem: password hashing and JWT sessions
// ABOUTME: The rest of the system only ever sees a verified Principal

pub mod error;
pub mod jwt;
pub mod password;

pub use error::AuthError;
pub use jwt::{generate_access_token, validate_token, Claims, JwtConfig};
pub use password::{hash_password, verify_password, validate_password_strength};
