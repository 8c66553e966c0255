/*
 * Responsibility
 * - SsoPayload <-> transport string (encode/decode)
 * - form-urlencoded key/value pairs wrapped in base64 (URL-safe alphabet)
 * - Structural errors only; authenticity is the signer's job
 */
use std::collections::HashSet;

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use url::form_urlencoded;

use crate::services::sso::{
    error::{DecodeError, EncodeError},
    payload::SsoPayload,
};

// Emits no padding, so the result needs no escaping inside a query parameter.
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// Peers speaking the classic protocol send standard base64 (`+`, `/`, `=`).
const STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn encode(payload: &SsoPayload) -> Result<String, EncodeError> {
    Ok(URL_SAFE.encode(encode_pairs(payload.to_pairs()?)))
}

pub fn decode(encoded: &str) -> Result<SsoPayload, DecodeError> {
    let mut payload = SsoPayload::default();
    for (key, value) in decode_pairs(encoded)? {
        payload.insert_pair(key, value);
    }
    Ok(payload)
}

fn encode_pairs(pairs: Vec<(String, String)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn decode_pairs(encoded: &str) -> Result<Vec<(String, String)>, DecodeError> {
    let raw = URL_SAFE
        .decode(encoded)
        .or_else(|url_safe_err| STANDARD.decode(encoded).map_err(|_| url_safe_err))?;
    let query = String::from_utf8(raw)?;

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for (index, segment) in query.split('&').enumerate() {
        if segment.is_empty() {
            continue;
        }
        if !segment.contains('=') {
            return Err(DecodeError::MalformedPair { index });
        }

        // A segment holds exactly one pair; escaped delimiters stay inside it.
        let Some((key, value)) = form_urlencoded::parse(segment.as_bytes()).next() else {
            return Err(DecodeError::MalformedPair { index });
        };

        if !seen.insert(key.clone()) {
            return Err(DecodeError::DuplicateField(key.into_owned()));
        }
        pairs.push((key.into_owned(), value.into_owned()));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_with(custom: &[(&str, &str)]) -> SsoPayload {
        let mut payload = SsoPayload {
            nonce: Some("testing".into()),
            email: Some("some@email.com".into()),
            username: Some("sam".into()),
            name: Some("sam saffron".into()),
            external_id: Some("100".into()),
            ..Default::default()
        };
        for (k, v) in custom {
            payload.custom_fields.insert(k.to_string(), v.to_string());
        }
        payload
    }

    #[test]
    fn round_trips_dotted_custom_keys() {
        let payload = payload_with(&[("a", "Aa"), ("b.b", "B.b")]);

        let decoded = decode(&encode(&payload).unwrap()).unwrap();

        assert_eq!(decoded, payload);
        assert_eq!(decoded.custom_fields["b.b"], "B.b");
    }

    #[test]
    fn round_trips_delimiters_escapes_and_multibyte() {
        let awkward = [
            "a&b=c",
            "100%",
            "%41 not an escape",
            "plus+sign",
            "semi;colon",
            "dots.in.value",
            "ünïcödé 名前 🚀",
            "line\nbreak",
            "",
        ];

        for value in awkward {
            let mut payload = payload_with(&[(value, value)]);
            payload.name = Some(value.to_string());
            payload
                .additional_fields
                .insert(format!("x-{value}"), value.to_string());

            let decoded = decode(&encode(&payload).unwrap()).unwrap();
            assert_eq!(decoded, payload, "value {value:?}");
        }
    }

    #[test]
    fn encoded_payload_is_query_safe() {
        let payload = payload_with(&[("?", "&/+=")]);
        let encoded = encode(&payload).unwrap();

        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let encoded = URL_SAFE.encode("email=a%40b.c&locale=pt_BR&future.flag=1");

        let decoded = decode(&encoded).unwrap();

        assert_eq!(decoded.email.as_deref(), Some("a@b.c"));
        assert_eq!(decoded.additional_fields["locale"], "pt_BR");
        assert_eq!(decoded.additional_fields["future.flag"], "1");
    }

    #[test]
    fn accepts_standard_alphabet_with_padding() {
        use base64::engine::general_purpose::STANDARD as CLASSIC;

        // Raw "~~~" on a 3-byte boundary encodes as "fn5+"; 22 bytes pad with "==".
        let inner = "nonce=abc&name=~~~&x=1";
        let encoded = CLASSIC.encode(inner);
        assert!(encoded.contains('+') && encoded.ends_with("=="));

        let decoded = decode(&encoded).unwrap();

        assert_eq!(decoded.nonce.as_deref(), Some("abc"));
        assert_eq!(decoded.name.as_deref(), Some("~~~"));
        assert_eq!(decoded.additional_fields["x"], "1");
    }

    #[test]
    fn odd_flag_values_survive_a_round_trip() {
        let wire = "nonce=n&admin=1&moderator=yes&suppress_welcome_message=true";
        let decoded = decode(&URL_SAFE.encode(wire)).unwrap();

        assert_eq!(decoded.admin, None);
        assert_eq!(decoded.moderator, None);
        assert_eq!(decoded.suppress_welcome_message, Some(true));
        assert_eq!(decoded.additional_fields["admin"], "1");
        assert_eq!(decoded.additional_fields["moderator"], "yes");

        let reencoded = encode(&decoded).unwrap();
        assert_eq!(decode(&reencoded).unwrap(), decoded);

        let inner = String::from_utf8(URL_SAFE.decode(&reencoded).unwrap()).unwrap();
        assert!(inner.contains("admin=1") && inner.contains("moderator=yes"));
    }

    #[test]
    fn encode_refuses_shadowing_additional_fields() {
        let mut payload = payload_with(&[]);
        payload
            .additional_fields
            .insert("custom.role".into(), "admin".into());

        assert!(matches!(
            encode(&payload),
            Err(EncodeError::ReservedField(key)) if key == "custom.role"
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(decode("not base64!"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn rejects_non_utf8_blob() {
        let encoded = URL_SAFE.encode([0x6e, 0x3d, 0xff, 0xfe]);
        assert!(matches!(decode(&encoded), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn rejects_segment_without_equals() {
        let encoded = URL_SAFE.encode("nonce=abc&garbage&email=x");
        assert!(matches!(
            decode(&encoded),
            Err(DecodeError::MalformedPair { index: 1 })
        ));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let encoded = URL_SAFE.encode("email=a%40b.c&email=evil%40b.c");
        assert!(matches!(
            decode(&encoded),
            Err(DecodeError::DuplicateField(field)) if field == "email"
        ));
    }

    #[test]
    fn empty_payload_decodes_to_empty_fields() {
        assert_eq!(decode("").unwrap(), SsoPayload::default());
    }
}
