pub mod claims;
pub mod errors;
pub mod issuer;
pub mod verifier;

pub use claims::Claims;
pub use errors::JwtError;
pub use issuer::TokenIssuer;
pub use verifier::TokenVerifier;

use jsonwebtoken::Algorithm;

/// Signing algorithm shared by issuer and verifier.
pub(crate) const ALGORITHM: Algorithm = Algorithm::HS256;
