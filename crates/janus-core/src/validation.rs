//! The body pipeline: decode, transform, validate.
//!
//! A handler only ever receives a body that went through all three steps.
//! Decoding failures are reported before anything else runs, so a malformed
//! payload is always a [`Error::Decode`] and never a validation error.
//!
//! # Example
//!
//! ```
//! use janus_core::validation::{decode_and_validate, Transform};
//! use janus_core::{Error, TransformError};
//! use serde::Deserialize;
//! use validator::Validate;
//!
//! #[derive(Debug, Deserialize, Validate)]
//! struct CreateRecipe {
//!     #[validate(length(min = 1))]
//!     name: String,
//! }
//!
//! impl Transform for CreateRecipe {
//!     fn transform(mut self) -> Result<Self, TransformError> {
//!         self.name = self.name.trim().to_string();
//!         Ok(self)
//!     }
//! }
//!
//! let body: CreateRecipe = decode_and_validate(None, br#"{"name": " Soup "}"#).unwrap();
//! assert_eq!(body.name, "Soup");
//!
//! let err = decode_and_validate::<CreateRecipe>(None, br#"{"name": "   "}"#).unwrap_err();
//! assert!(matches!(err, Error::Validation { .. }));
//! ```

use serde::de::{value::UnitDeserializer, DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::{codec, Error, TransformError};

/// Normalization applied to a decoded body before validation.
///
/// The default implementation returns the value unchanged.
pub trait Transform: Sized {
    /// Returns the normalized value.
    fn transform(self) -> Result<Self, TransformError> {
        Ok(self)
    }
}

/// A type that can be declared as a request body.
///
/// Implemented for every type that can be deserialized, transformed and
/// validated.
pub trait RequestBody: DeserializeOwned + Transform + Validate + Send + 'static {}

impl<T> RequestBody for T where T: DeserializeOwned + Transform + Validate + Send + 'static {}

/// Runs the transform step, then the validation step.
pub fn transform_and_validate<B: Transform + Validate>(body: B) -> Result<B, Error> {
    let body = body.transform()?;
    body.validate().map_err(|errors| Error::Validation {
        fields: errors.into(),
    })?;
    Ok(body)
}

/// Decodes a raw body according to its content type and runs the pipeline.
///
/// An empty payload is accepted only by shapes that deserialize from
/// nothing, such as [`NoBody`].
pub fn decode_and_validate<B: RequestBody>(content_type: Option<&str>, raw: &[u8]) -> Result<B, Error> {
    let decoded = if raw.is_empty() {
        B::deserialize(UnitDeserializer::<serde::de::value::Error>::new())
            .map_err(|_| Error::decode("empty request body"))?
    } else {
        codec::decode::<B>(content_type, raw)?
    };
    transform_and_validate(decoded)
}

/// Body shape for handlers that do not read a body.
///
/// Any payload, including an empty one, decodes to `NoBody`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoBody;

impl<'de> Deserialize<'de> for NoBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Self)
    }
}

impl Transform for NoBody {}

impl Validate for NoBody {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate, PartialEq)]
    struct Recipe {
        #[validate(length(min = 1))]
        name: String,
        #[validate(range(min = 1, max = 600))]
        minutes: u32,
    }

    impl Transform for Recipe {}

    #[derive(Debug, Deserialize, Validate)]
    struct Tag {
        #[validate(length(min = 1))]
        label: String,
    }

    impl Transform for Tag {
        fn transform(self) -> Result<Self, TransformError> {
            if self.label.contains(char::is_control) {
                return Err(TransformError::new("label contains control characters"));
            }
            Ok(Self {
                label: self.label.to_lowercase(),
            })
        }
    }

    #[test]
    fn test_valid_body() {
        let recipe: Recipe =
            decode_and_validate(None, br#"{"name":"Soup","minutes":20}"#).unwrap();
        assert_eq!(recipe.name, "Soup");
    }

    #[test]
    fn test_empty_name_names_the_field() {
        let err = decode_and_validate::<Recipe>(None, br#"{"name":"","minutes":20}"#).unwrap_err();
        match err {
            Error::Validation { fields } => {
                assert!(fields.get("name").is_some());
                assert!(fields.get("minutes").is_none());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_precedes_validation() {
        // Invalid name and a malformed payload: decoding must fail first.
        let err = decode_and_validate::<Recipe>(None, br#"{"name":"","minutes":"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_wrong_field_type_is_decode_error() {
        let err =
            decode_and_validate::<Recipe>(None, br#"{"name":"Soup","minutes":"ten"}"#).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_transform_runs_before_validation() {
        let tag: Tag = decode_and_validate(None, br#"{"label":"VEGAN"}"#).unwrap();
        assert_eq!(tag.label, "vegan");
    }

    #[test]
    fn test_transform_error() {
        let err = decode_and_validate::<Tag>(None, br#"{"label":"a\u0007b"}"#).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
    }

    #[test]
    fn test_empty_payload_for_required_shape() {
        let err = decode_and_validate::<Recipe>(None, b"").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_no_body_accepts_anything() {
        assert_eq!(decode_and_validate::<NoBody>(None, b"").unwrap(), NoBody);
        assert_eq!(
            decode_and_validate::<NoBody>(None, br#"{"ignored":true}"#).unwrap(),
            NoBody
        );
    }
}
