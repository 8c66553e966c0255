//! HMAC-SHA256 signing of the encoded SSO payload.
//!
//! The signature covers the exact bytes of the `sso` parameter as sent, and is
//! rendered as lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret between this site and the remote SSO endpoint.
///
/// Holds the keyed MAC state rather than the raw string. Never printed:
/// `Debug` is redacted and there is no `Display`.
#[derive(Clone)]
pub struct SsoSecret(HmacSha256);

#[derive(Debug, thiserror::Error)]
pub enum InvalidSecret {
    #[error("sso secret must not be empty")]
    Empty,
    #[error("sso secret cannot key HMAC-SHA256")]
    Key(#[from] hmac::digest::InvalidLength),
}

impl SsoSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, InvalidSecret> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(InvalidSecret::Empty);
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())?;
        Ok(Self(mac))
    }
}

impl std::fmt::Debug for SsoSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SsoSecret(<redacted>)")
    }
}

pub fn sign(payload: &str, secret: &SsoSecret) -> String {
    let mut mac = secret.0.clone();
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of `signature` against our own signature of `payload`.
///
/// Any difference (including length or letter case) is `false`.
pub fn verify(payload: &str, signature: &str, secret: &SsoSecret) -> bool {
    let expected = sign(payload, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SsoSecret {
        SsoSecret::new(s).unwrap()
    }

    #[test]
    fn matches_rfc4231_vector() {
        // RFC 4231, test case 2.
        let sig = sign("what do ya want for nothing?", &secret("Jefe"));
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verifies_own_signature() {
        let key = secret("supersecret");
        let payload = "bm9uY2U9dGVzdGluZw";

        let sig = sign(payload, &key);

        assert_eq!(sig.len(), 64);
        assert!(verify(payload, &sig, &key));
    }

    #[test]
    fn any_flipped_character_fails() {
        let key = secret("supersecret");
        let payload = "bm9uY2U9dGVzdGluZw";
        let sig = sign(payload, &key);

        for i in 0..sig.len() {
            let mut tampered = sig.clone().into_bytes();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(tampered).unwrap();

            assert!(!verify(payload, &tampered, &key), "position {i}");
        }
    }

    #[test]
    fn rejects_length_case_and_secret_mismatch() {
        let key = secret("supersecret");
        let payload = "bm9uY2U9dGVzdGluZw";
        let sig = sign(payload, &key);

        assert!(!verify(payload, &sig[..63], &key));
        assert!(!verify(payload, &format!("{sig}0"), &key));
        assert!(!verify(payload, "", &key));
        assert!(!verify(payload, &sig.to_uppercase(), &key));
        assert!(!verify(payload, &sig, &secret("other")));
        assert!(!verify("bm9uY2U9dGVzdGluZx", &sig, &key));
    }

    #[test]
    fn one_secret_signs_repeatedly_with_the_same_key() {
        let key = secret("supersecret");

        let first = sign("bm9uY2U9YQ", &key);
        let second = sign("bm9uY2U9Yg", &key);

        assert_ne!(first, second);
        assert_eq!(sign("bm9uY2U9YQ", &key), first);
        assert_eq!(sign("bm9uY2U9YQ", &key.clone()), first);
    }

    #[test]
    fn empty_secret_is_rejected_and_debug_is_redacted() {
        assert!(matches!(SsoSecret::new(""), Err(InvalidSecret::Empty)));
        assert_eq!(format!("{:?}", secret("hunter2")), "SsoSecret(<redacted>)");
    }
}
