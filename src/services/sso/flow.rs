//! The two ends of the SSO handshake.
//!
//! Outbound: nonce -> fields -> encode -> sign -> redirect URL.
//! Inbound: signature -> decode -> nonce. Each stage fails with its own error
//! and a later stage never runs on input an earlier stage rejected.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::services::{
    nonce::{NonceError, NonceStore, store::DEFAULT_RETURN_PATH},
    sso::{
        codec,
        error::{SignatureError, SsoError},
        payload::SsoPayload,
        redirect::{SignedPayload, build_redirect},
        signer::{self, SsoSecret},
    },
};

pub fn sign_payload(payload: &SsoPayload, secret: &SsoSecret) -> Result<SignedPayload, SsoError> {
    let sso = codec::encode(payload)?;
    let sig = signer::sign(&sso, secret);
    Ok(SignedPayload { sso, sig })
}

/// Check the signature, then decode. No nonce involved.
///
/// Used for messages whose freshness is not ours to track (e.g. the remote
/// side reading our request), and as the first half of `parse`.
pub fn verify_payload(signed: &SignedPayload, secret: &SsoSecret) -> Result<SsoPayload, SsoError> {
    if !signer::verify(&signed.sso, &signed.sig, secret) {
        return Err(SignatureError.into());
    }
    Ok(codec::decode(&signed.sso)?)
}

pub async fn generate_url(
    secret: &SsoSecret,
    nonces: &dyn NonceStore,
    base_url: &str,
    fields: SsoPayload,
) -> Result<String, SsoError> {
    generate_url_with_return_path(secret, nonces, base_url, DEFAULT_RETURN_PATH, fields).await
}

/// Mint a nonce remembering `return_path`, embed it in `fields`, sign, and build the URL.
pub async fn generate_url_with_return_path(
    secret: &SsoSecret,
    nonces: &dyn NonceStore,
    base_url: &str,
    return_path: &str,
    mut fields: SsoPayload,
) -> Result<String, SsoError> {
    let nonce = nonces.issue(return_path).await?;
    fields.nonce = Some(nonce);

    let signed = sign_payload(&fields, secret)?;
    debug!(
        backend = nonces.backend_name(),
        return_path, "issued sso nonce"
    );

    Ok(build_redirect(base_url, &signed))
}

/// Validate an inbound `sso`/`sig` pair against `secret` and the nonce store.
///
/// The nonce is left live; callers that act on the result should consume it
/// (see `SsoService::complete`).
pub async fn parse(
    sso: &str,
    sig: &str,
    secret: &SsoSecret,
    nonces: &dyn NonceStore,
) -> Result<SsoPayload, SsoError> {
    let signed = SignedPayload {
        sso: sso.to_string(),
        sig: sig.to_string(),
    };
    let (payload, _) = parse_signed(&signed, secret, nonces).await?;
    Ok(payload)
}

async fn parse_signed(
    signed: &SignedPayload,
    secret: &SsoSecret,
    nonces: &dyn NonceStore,
) -> Result<(SsoPayload, String), SsoError> {
    let payload = verify_payload(signed, secret)?;

    let nonce = payload.nonce.as_deref().ok_or(NonceError::Missing)?;
    let return_path = nonces.status(nonce).await?.into_live()?;

    Ok((payload, return_path))
}

/// Result of a completed inbound handshake.
#[derive(Debug, Clone)]
pub struct CompletedLogin {
    pub payload: SsoPayload,
    // Path recorded when the nonce was issued.
    pub return_path: String,
}

/// Host-facing entry point bundling the secret, remote URL and nonce store.
#[derive(Clone)]
pub struct SsoService {
    secret: SsoSecret,
    sso_url: String,
    nonces: Arc<dyn NonceStore>,
}

impl std::fmt::Debug for SsoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoService")
            .field("sso_url", &self.sso_url)
            .field("nonce_backend", &self.nonces.backend_name())
            .finish()
    }
}

impl SsoService {
    pub fn new(secret: SsoSecret, sso_url: impl Into<String>, nonces: Arc<dyn NonceStore>) -> Self {
        Self {
            secret,
            sso_url: sso_url.into(),
            nonces,
        }
    }

    pub fn sso_url(&self) -> &str {
        &self.sso_url
    }

    pub fn nonces(&self) -> &dyn NonceStore {
        self.nonces.as_ref()
    }

    /// Redirect URL to the remote site carrying a fresh nonce.
    pub async fn redirect_url(
        &self,
        return_path: &str,
        fields: SsoPayload,
    ) -> Result<String, SsoError> {
        generate_url_with_return_path(
            &self.secret,
            self.nonces.as_ref(),
            &self.sso_url,
            return_path,
            fields,
        )
        .await
    }

    /// Validate without consuming the nonce.
    pub async fn parse(&self, signed: &SignedPayload) -> Result<SsoPayload, SsoError> {
        parse(&signed.sso, &signed.sig, &self.secret, self.nonces.as_ref()).await
    }

    /// Validate and consume the nonce in one step.
    ///
    /// If another request consumed the same nonce in between, this one fails
    /// with `NonceError::Consumed`.
    pub async fn complete(&self, signed: &SignedPayload) -> Result<CompletedLogin, SsoError> {
        let result = self.complete_inner(signed).await;

        match &result {
            Ok(login) => debug!(
                external_id = login.payload.external_id.as_deref().unwrap_or(""),
                return_path = %login.return_path,
                "sso login completed"
            ),
            Err(e) => warn!(stage = e.stage(), error = %e, "sso login rejected"),
        }

        result
    }

    async fn complete_inner(&self, signed: &SignedPayload) -> Result<CompletedLogin, SsoError> {
        let (payload, return_path) = parse_signed(signed, &self.secret, self.nonces.as_ref()).await?;

        // `parse_signed` guarantees the nonce is present.
        let nonce = payload.nonce.as_deref().ok_or(NonceError::Missing)?;
        if !self.nonces.consume(nonce).await? {
            return Err(NonceError::Consumed.into());
        }

        Ok(CompletedLogin {
            payload,
            return_path,
        })
    }
}
