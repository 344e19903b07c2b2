//! Authentication Handlers Module
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and documentation
//! ├── types.rs    - Request and response types, token/password helpers
//! ├── signup.rs   - User registration
//! ├── login.rs    - Username/email + password login
//! ├── google.rs   - Google sign-in
//! ├── password.rs - Forgot/reset password
//! └── me.rs       - Current user
//! ```
//!
//! # Handlers
//!
//! - **`signup`** - POST /api/auth/signup
//! - **`login`** - POST /api/auth/login
//! - **`google_login`** - POST /api/auth/google
//! - **`forgot_password`** - POST /api/auth/forgot-password
//! - **`reset_password`** - POST /api/auth/reset-password
//! - **`get_me`** / **`update_me`** - GET/PATCH /api/auth/me (authenticated)

pub mod types;
pub mod signup;
pub mod login;
pub mod google;
pub mod password;
pub mod me;

pub use types::{AuthResponse, LoginRequest, SignupRequest, UserResponse};

pub use google::google_login;
pub use login::login;
pub use me::{get_me, update_me};
pub use password::{forgot_password, reset_password};
pub use signup::signup;
