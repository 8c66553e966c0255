use thiserror::Error;

use crate::services::nonce::NonceError;

/// The payload is not a well-formed SSO message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("payload segment {index} is not a key=value pair")]
    MalformedPair { index: usize },
    #[error("payload repeats field '{0}'")]
    DuplicateField(String),
    #[error("missing '{0}' parameter")]
    MissingParameter(&'static str),
}

/// The payload cannot be put on the wire as built.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("additional field '{0}' collides with a typed or custom field")]
    ReservedField(String),
}

/// The payload was not signed with our secret (tampered or misconfigured).
#[derive(Debug, Error)]
#[error("sso payload signature mismatch")]
pub struct SignatureError;

#[derive(Debug, Error)]
pub enum SsoError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Nonce(#[from] NonceError),
}

impl SsoError {
    /// Which stage of the handshake rejected the message (for logs).
    pub fn stage(&self) -> &'static str {
        match self {
            SsoError::Encode(_) => "encode",
            SsoError::Decode(_) => "decode",
            SsoError::Signature(_) => "signature",
            SsoError::Nonce(_) => "nonce",
        }
    }
}
