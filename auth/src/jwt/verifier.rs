use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;
use super::ALGORITHM;

/// Validates presented tokens and yields their subject.
///
/// Signature and structure are checked by `jsonwebtoken`; expiry is checked
/// here against an explicit clock with no leeway.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify `token` against the current time and return its subject.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature, wrong algorithm, or malformed token
    /// * `TokenExpired` - Current time is past the embedded expiry
    pub fn verify(&self, token: &str) -> Result<String, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        self.claims_at(token, now).map(|claims| claims.sub)
    }

    /// Verify `token` at `now` and return the full claims.
    pub fn claims_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?
            .claims;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::jwt::TokenIssuer;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_verify_returns_subject() {
        let issuer = TokenIssuer::new(SECRET);
        let verifier = TokenVerifier::new(SECRET);

        let issued = issuer.issue("alice", Duration::minutes(30)).unwrap();

        assert_eq!(verifier.verify(&issued.token).unwrap(), "alice");
    }

    #[test]
    fn test_expiry_boundary() {
        let issuer = TokenIssuer::new(SECRET);
        let verifier = TokenVerifier::new(SECRET);
        let window = Duration::minutes(30);
        let issued_at = Utc::now();

        let token = issuer.issue_at("alice", window, issued_at).unwrap().token;

        let just_before = issued_at + window - Duration::seconds(1);
        let at_expiry = issued_at + window;
        let just_after = issued_at + window + Duration::seconds(1);

        assert_eq!(verifier.verify_at(&token, just_before).unwrap(), "alice");
        assert_eq!(verifier.verify_at(&token, at_expiry).unwrap(), "alice");
        assert_eq!(
            verifier.verify_at(&token, just_after),
            Err(JwtError::TokenExpired)
        );
    }

    #[test]
    fn test_already_expired_token_with_system_clock() {
        let issuer = TokenIssuer::new(SECRET);
        let verifier = TokenVerifier::new(SECRET);

        let token = issuer
            .issue_at("alice", Duration::minutes(30), Utc::now() - Duration::hours(1))
            .unwrap()
            .token;

        assert_eq!(verifier.verify(&token), Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let issuer = TokenIssuer::new(b"secret1_at_least_32_bytes_long_key!");
        let verifier = TokenVerifier::new(b"secret2_at_least_32_bytes_long_key!");

        let token = issuer.issue("alice", Duration::minutes(30)).unwrap().token;

        assert!(matches!(
            verifier.verify(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_key_wins_over_expiry() {
        let issuer = TokenIssuer::new(b"secret1_at_least_32_bytes_long_key!");
        let verifier = TokenVerifier::new(b"secret2_at_least_32_bytes_long_key!");

        let token = issuer
            .issue_at("alice", Duration::minutes(30), Utc::now() - Duration::days(1))
            .unwrap()
            .token;

        assert!(matches!(
            verifier.verify(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let issuer = TokenIssuer::new(SECRET);
        let verifier = TokenVerifier::new(SECRET);

        let alice = issuer.issue("alice", Duration::minutes(30)).unwrap().token;
        let mallory = issuer.issue("mallory", Duration::minutes(30)).unwrap().token;

        // Splice mallory's payload under alice's signature
        let alice_parts: Vec<&str> = alice.split('.').collect();
        let mallory_parts: Vec<&str> = mallory.split('.').collect();
        let forged = format!(
            "{}.{}.{}",
            alice_parts[0], mallory_parts[1], alice_parts[2]
        );

        assert!(matches!(
            verifier.verify(&forged),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let verifier = TokenVerifier::new(SECRET);

        for token in ["", "invalid.token.here", "abc"] {
            assert!(matches!(
                verifier.verify(token),
                Err(JwtError::InvalidToken(_))
            ));
        }
    }
}
