pub mod codec;
pub mod error;
pub mod flow;
pub mod payload;
pub mod redirect;
pub mod signer;

pub use error::{DecodeError, EncodeError, SignatureError, SsoError};
pub use flow::{
    CompletedLogin, SsoService, generate_url, generate_url_with_return_path, parse, sign_payload,
    verify_payload,
};
pub use payload::SsoPayload;
pub use redirect::{SignedPayload, build_redirect};
pub use signer::{InvalidSecret, SsoSecret};
