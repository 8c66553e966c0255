/*
 * Responsibility
 * - The two transport strings (`sso`, `sig`) as one value
 * - Redirect URL composition: base URL + `?`/`&` + signed query
 * - Extracting `sso`/`sig` back out of a raw callback query
 */
use url::form_urlencoded;

use crate::services::sso::error::DecodeError;

pub const SSO_PARAM: &str = "sso";
pub const SIG_PARAM: &str = "sig";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    // base64 of the form-encoded field set
    pub sso: String,
    // lowercase hex HMAC-SHA256 of `sso`
    pub sig: String,
}

impl SignedPayload {
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(SSO_PARAM, &self.sso)
            .append_pair(SIG_PARAM, &self.sig)
            .finish()
    }

    /// Pull `sso` and `sig` out of a query string, ignoring any other keys.
    pub fn from_query(query: &str) -> Result<Self, DecodeError> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut sso = None;
        let mut sig = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                SSO_PARAM => sso = Some(value.into_owned()),
                SIG_PARAM => sig = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            sso: sso.ok_or(DecodeError::MissingParameter(SSO_PARAM))?,
            sig: sig.ok_or(DecodeError::MissingParameter(SIG_PARAM))?,
        })
    }
}

/// Append the signed payload to `base_url`.
///
/// Existing query parameters are kept as-is; a fragment stays at the end.
pub fn build_redirect(base_url: &str, signed: &SignedPayload) -> String {
    let (target, fragment) = match base_url.split_once('#') {
        Some((target, fragment)) => (target, Some(fragment)),
        None => (base_url, None),
    };

    let separator = if target.contains('?') { '&' } else { '?' };

    let mut url = format!("{target}{separator}{}", signed.to_query());
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed() -> SignedPayload {
        SignedPayload {
            sso: "bm9uY2U9YWJj".to_string(),
            sig: "00ff".to_string(),
        }
    }

    #[test]
    fn bare_path_gets_question_mark() {
        let url = build_redirect("http://example.com/login", &signed());
        assert_eq!(url, "http://example.com/login?sso=bm9uY2U9YWJj&sig=00ff");
    }

    #[test]
    fn existing_query_gets_ampersand_and_is_preserved() {
        let url = build_redirect("http://example.com/login?action=x", &signed());
        assert_eq!(
            url,
            "http://example.com/login?action=x&sso=bm9uY2U9YWJj&sig=00ff"
        );
        assert_eq!(url.matches('?').count(), 1);
    }

    #[test]
    fn multiple_query_params_and_fragment() {
        let url = build_redirect("https://idp.test/?a=1&a=2#top", &signed());
        assert_eq!(url, "https://idp.test/?a=1&a=2&sso=bm9uY2U9YWJj&sig=00ff#top");
    }

    #[test]
    fn from_query_reads_back_what_to_query_wrote() {
        let url = build_redirect("http://tcdev7.wpengine.com/?action=showlogin", &signed());
        let (_, query) = url.split_once('?').unwrap();

        assert_eq!(SignedPayload::from_query(query).unwrap(), signed());
    }

    #[test]
    fn from_query_decodes_escaped_standard_base64() {
        let parsed = SignedPayload::from_query("?sso=YWJj%2B%2Fw%3D%3D&sig=ab").unwrap();
        assert_eq!(parsed.sso, "YWJj+/w==");
        assert_eq!(parsed.sig, "ab");
    }

    #[test]
    fn from_query_requires_both_parameters() {
        assert!(matches!(
            SignedPayload::from_query("sig=ab"),
            Err(DecodeError::MissingParameter("sso"))
        ));
        assert!(matches!(
            SignedPayload::from_query("sso=abc&action=x"),
            Err(DecodeError::MissingParameter("sig"))
        ));
    }
}
