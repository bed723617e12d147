//! Authentication and authorization module

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod revocation;

pub use credentials::{CredentialVerifier, PlaintextVerifier};
pub use jwt::{Claims, IssuedToken, JwtService};
pub use middleware::{extract_token, jwt_auth_middleware, require_admin, AuthContext};
pub use revocation::RevocationList;
