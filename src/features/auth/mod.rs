//! Bearer token verification against the hosted auth service.
//!
//! Identities and sessions are issued elsewhere; this feature only checks
//! the signature, issuer and audience of incoming access tokens and exposes
//! the caller as an [`model::AuthenticatedUser`] request extension.

mod jwks;
mod validator;

pub mod model;

pub use jwks::JwksClient;
pub use validator::JwtValidator;
