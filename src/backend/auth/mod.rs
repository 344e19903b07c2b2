//! Authentication Module
//!
//! User accounts, sessions and the `/api/auth` endpoints.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User documents and lookups
//! ├── sessions.rs     - JWT token management
//! ├── oauth.rs        - Google ID-token verification
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: username, email, password → user created → JWT returned
//! 2. **Login**: username or email + password → JWT returned
//! 3. **Google**: ID token verified → user found, linked or created → JWT
//! 4. **Reset**: emailed one-hour token → new password
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Reset tokens are stored only as SHA-256 hashes
//! - Tokens expire after 30 days
//! - Invalid credentials return 401 (no information leakage)

pub mod users;
pub mod sessions;
pub mod oauth;
pub mod handlers;

pub use handlers::{forgot_password, get_me, google_login, login, reset_password, signup, update_me};
pub use oauth::{GoogleVerifier, IdentityVerifier, VerifiedIdentity};
