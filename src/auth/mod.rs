pub mod credentials;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::User;
use crate::validation::validate_name;

// Re-export necessary items
pub use credentials::CredentialStore;
pub use extractors::Principal;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService, DEFAULT_TOKEN_TTL_SECS};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User's email address.
    #[schema(example = "demo@example.com")]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[schema(example = "demo123456")]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name, 1 to 100 characters once trimmed.
    #[schema(example = "Demo User")]
    #[validate(custom = "validate_name")]
    pub name: String,
    #[schema(example = "demo@example.com")]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    /// Must be at least 6 characters long.
    #[schema(example = "demo123456")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Response after successful login or registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

/// Response of `GET /api/auth/me`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
}
