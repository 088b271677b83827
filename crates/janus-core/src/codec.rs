//! Wire codecs for request bodies and structured responses.
//!
//! Decoding picks a decoder from the request `Content-Type`; encoding writes
//! one of the structured [`Format`]s. Both sides go through `serde`, so a body
//! shape or a result value only has to derive `Deserialize`/`Serialize`.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Format};

/// Root element used when a value cannot name its own XML element.
const XML_ROOT: &str = "response";

/// Decodes a raw request body into `T`.
///
/// A missing `Content-Type` is treated as JSON. Form-encoded, XML and YAML
/// bodies are supported; any other media type is rejected with
/// [`Error::UnsupportedMediaType`].
///
/// # Example
///
/// ```
/// use janus_core::codec;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Recipe {
///     name: String,
/// }
///
/// let recipe: Recipe = codec::decode(Some("application/x-www-form-urlencoded"), b"name=Ratatouille").unwrap();
/// assert_eq!(recipe.name, "Ratatouille");
/// ```
pub fn decode<T: DeserializeOwned>(content_type: Option<&str>, raw: &[u8]) -> Result<T, Error> {
    if raw.is_empty() {
        return Err(Error::decode("empty request body"));
    }

    let media_type = match content_type {
        Some(value) => value
            .parse::<mime::Mime>()
            .map_err(|_| Error::UnsupportedMediaType {
                content_type: value.to_string(),
            })?,
        None => mime::APPLICATION_JSON,
    };

    match (media_type.type_(), media_type.subtype()) {
        (mime::APPLICATION, mime::WWW_FORM_URLENCODED) => {
            serde_urlencoded::from_bytes(raw).map_err(|e| Error::decode(e.to_string()))
        }
        _ => match Format::from_media_type(media_type.essence_str()) {
            Some(Format::Json) => {
                serde_json::from_slice(raw).map_err(|e| Error::decode(e.to_string()))
            }
            Some(Format::Xml) => {
                let text = std::str::from_utf8(raw)
                    .map_err(|e| Error::decode(format!("invalid UTF-8: {e}")))?;
                quick_xml::de::from_str(text).map_err(|e| Error::decode(e.to_string()))
            }
            Some(Format::Yaml) => {
                serde_yaml::from_slice(raw).map_err(|e| Error::decode(e.to_string()))
            }
            _ => Err(Error::UnsupportedMediaType {
                content_type: media_type.essence_str().to_string(),
            }),
        },
    }
}

/// Encodes `data` in a structured format.
///
/// [`Format::Html`] has no data encoding and is written as JSON. For
/// [`Format::Text`], a string value is written as-is and any other value as
/// compact JSON.
pub fn encode<T: Serialize + ?Sized>(format: Format, data: &T) -> Result<Bytes, Error> {
    let encoded = match format.structured() {
        Format::Json | Format::Html => serde_json::to_vec(data)
            .map_err(|e| Error::internal_with_source("failed to encode JSON response", e))?,
        Format::Xml => encode_xml(data)?.into_bytes(),
        Format::Yaml => serde_yaml::to_string(data)
            .map_err(|e| Error::internal_with_source("failed to encode YAML response", e))?
            .into_bytes(),
        Format::Text => {
            let value = serde_json::to_value(data)
                .map_err(|e| Error::internal_with_source("failed to encode text response", e))?;
            match value {
                serde_json::Value::String(text) => text.into_bytes(),
                other => other.to_string().into_bytes(),
            }
        }
    };

    Ok(Bytes::from(encoded))
}

fn encode_xml<T: Serialize + ?Sized>(data: &T) -> Result<String, Error> {
    // Structs name their own element; maps, sequences and scalars need a root.
    quick_xml::se::to_string(data)
        .or_else(|_| quick_xml::se::to_string_with_root(XML_ROOT, data))
        .map_err(|e| Error::internal_with_source("failed to encode XML response", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Recipe {
        name: String,
        minutes: u32,
    }

    fn ratatouille() -> Recipe {
        Recipe {
            name: "Ratatouille".to_string(),
            minutes: 90,
        }
    }

    #[test]
    fn test_decode_defaults_to_json() {
        let recipe: Recipe = decode(None, br#"{"name":"Ratatouille","minutes":90}"#).unwrap();
        assert_eq!(recipe, ratatouille());
    }

    #[test]
    fn test_decode_json_with_charset() {
        let recipe: Recipe = decode(
            Some("application/json; charset=utf-8"),
            br#"{"name":"Ratatouille","minutes":90}"#,
        )
        .unwrap();
        assert_eq!(recipe.minutes, 90);
    }

    #[test]
    fn test_decode_yaml() {
        let recipe: Recipe =
            decode(Some("application/x-yaml"), b"name: Ratatouille\nminutes: 90\n").unwrap();
        assert_eq!(recipe, ratatouille());
    }

    #[test]
    fn test_decode_xml() {
        let recipe: Recipe = decode(
            Some("application/xml"),
            b"<Recipe><name>Ratatouille</name><minutes>90</minutes></Recipe>",
        )
        .unwrap();
        assert_eq!(recipe, ratatouille());
    }

    #[test]
    fn test_decode_empty_body() {
        let err = decode::<Recipe>(None, b"").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = decode::<Recipe>(None, br#"{"name": "Ratatouille", oops"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_decode_unsupported_media_type() {
        let err = decode::<Recipe>(Some("image/png"), b"\x89PNG").unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType { .. }));
    }

    #[test]
    fn test_encode_json() {
        let body = encode(Format::Json, &ratatouille()).unwrap();
        assert_eq!(&body[..], br#"{"name":"Ratatouille","minutes":90}"#);
    }

    #[test]
    fn test_encode_html_falls_back_to_json() {
        let body = encode(Format::Html, &ratatouille()).unwrap();
        assert!(body.starts_with(b"{"));
    }

    #[test]
    fn test_encode_xml_struct() {
        let body = encode(Format::Xml, &ratatouille()).unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("<Recipe>"));
        assert!(text.contains("<name>Ratatouille</name>"));
    }

    #[test]
    fn test_encode_yaml() {
        let body = encode(Format::Yaml, &ratatouille()).unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("name: Ratatouille"));
        assert!(text.contains("minutes: 90"));
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(&encode(Format::Text, "hello").unwrap()[..], b"hello");
        assert_eq!(&encode(Format::Text, &42).unwrap()[..], b"42");
    }
}
