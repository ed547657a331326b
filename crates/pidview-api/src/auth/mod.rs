//! Single sign-on: session cookies, the OIDC client and the session gate.

pub mod handlers;
pub mod middleware;
pub mod oidc;
pub mod session;

pub use oidc::{IdentityProvider, OidcProvider, UserProfile};
pub use session::{SessionKeys, SessionUser};
