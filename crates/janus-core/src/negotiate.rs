//! Content negotiation.
//!
//! A handler never decides the wire format of its result. The caller does,
//! through the `Accept` header, and [`Format::negotiate`] turns that header
//! into one of the formats Janus can emit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A response format Janus can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
    /// `application/x-yaml`
    Yaml,
    /// `text/plain`
    Text,
    /// `text/html`, served through the template path.
    Html,
}

impl Format {
    /// Returns the `Content-Type` value written for this format.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Yaml => "application/x-yaml",
            Self::Text => "text/plain; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
        }
    }

    /// Returns `true` for formats produced by serializing data.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        !matches!(self, Self::Html)
    }

    /// Returns the format to use when data must be serialized.
    ///
    /// HTML has no data encoding, so it falls back to JSON.
    #[must_use]
    pub const fn structured(self) -> Self {
        match self {
            Self::Html => Self::Json,
            other => other,
        }
    }

    /// Maps a media type (without parameters) to a format.
    ///
    /// ```
    /// use janus_core::Format;
    ///
    /// assert_eq!(Format::from_media_type("application/json"), Some(Format::Json));
    /// assert_eq!(Format::from_media_type("text/xml"), Some(Format::Xml));
    /// assert_eq!(Format::from_media_type("image/png"), None);
    /// ```
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            "application/x-yaml" | "application/yaml" | "text/yaml" | "text/x-yaml" => {
                Some(Self::Yaml)
            }
            "text/plain" => Some(Self::Text),
            "text/html" | "application/xhtml+xml" => Some(Self::Html),
            _ if essence.ends_with("+json") => Some(Self::Json),
            _ if essence.ends_with("+xml") => Some(Self::Xml),
            _ => None,
        }
    }

    /// Picks the best format for an `Accept` header.
    ///
    /// Entries are ranked by their `q` value, ties keep header order. A
    /// wildcard (`*/*`) or a missing header selects `default`; an entry with
    /// `q=0` is never selected.
    ///
    /// ```
    /// use janus_core::Format;
    ///
    /// let accept = Some("text/html;q=0.9, application/xml");
    /// assert_eq!(Format::negotiate(accept, Format::Json), Format::Xml);
    /// assert_eq!(Format::negotiate(None, Format::Yaml), Format::Yaml);
    /// assert_eq!(Format::negotiate(Some("*/*"), Format::Json), Format::Json);
    /// ```
    #[must_use]
    pub fn negotiate(accept: Option<&str>, default: Self) -> Self {
        let Some(accept) = accept.filter(|value| !value.trim().is_empty()) else {
            return default;
        };

        let mut ranges: Vec<(usize, f32, &str)> = accept
            .split(',')
            .enumerate()
            .filter_map(|(index, entry)| {
                let mut parts = entry.split(';');
                let media_type = parts.next()?.trim();
                let quality = parts
                    .filter_map(|param| param.trim().strip_prefix("q="))
                    .find_map(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (!media_type.is_empty()).then_some((index, quality, media_type))
            })
            .collect();

        ranges.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        for (_, quality, media_type) in ranges {
            if quality <= 0.0 {
                break;
            }
            if media_type == "*/*" || media_type == "application/*" {
                return default;
            }
            if media_type == "text/*" {
                return if matches!(default, Self::Text | Self::Html) {
                    default
                } else {
                    Self::Text
                };
            }
            if let Some(format) = Self::from_media_type(media_type) {
                return format;
            }
        }

        default
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
            Self::Yaml => write!(f, "yaml"),
            Self::Text => write!(f, "text"),
            Self::Html => write!(f, "html"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "text" | "plain" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}
