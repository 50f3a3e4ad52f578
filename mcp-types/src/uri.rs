use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;

/// A validated, normalized MCP resource URI.
///
/// Any `scheme:opaque-or-hierarchical-part` string is accepted. The only
/// canonicalization applied is appending a trailing `/` to an authority-only
/// `http`/`https` URL (`https://example.com` -> `https://example.com/`);
/// every other form, including `file://`, `data:`, `urn:`, and arbitrary
/// custom schemes, is preserved byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct McpUri(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid URI: {0}")]
pub struct UriError(String);

impl McpUri {
    pub fn parse(raw: impl Into<String>) -> std::result::Result<Self, UriError> {
        let raw = raw.into();
        Ok(McpUri(normalize(&raw)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(raw: &str) -> std::result::Result<String, UriError> {
    let colon = raw
        .find(':')
        .ok_or_else(|| UriError(format!("missing ':' scheme separator in {raw:?}")))?;
    let (scheme, rest) = raw.split_at(colon);
    let rest = &rest[1..]; // drop the ':'

    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let scheme_valid =
        starts_alpha && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_valid {
        return Err(UriError(format!("invalid scheme in {raw:?}")));
    }

    let scheme_lower = scheme.to_ascii_lowercase();
    if matches!(scheme_lower.as_str(), "http" | "https") && rest.starts_with("//") {
        let authority_and_path = &rest[2..];
        if !authority_and_path.is_empty() && !authority_and_path.contains('/') {
            return Ok(format!("{raw}/"));
        }
    }

    Ok(raw.to_string())
}

impl fmt::Display for McpUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for McpUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for McpUri {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        McpUri::parse(raw).map_err(D::Error::custom)
    }
}

impl TryFrom<&str> for McpUri {
    type Error = UriError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        McpUri::parse(value)
    }
}

impl TryFrom<String> for McpUri {
    type Error = UriError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        McpUri::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_only_http_urls_gain_a_trailing_slash() {
        let cases = [
            ("https://example.com", "https://example.com/"),
            ("file:///path/to/file.txt", "file:///path/to/file.txt"),
            (
                "data:text/plain;base64,SGVsbG8=",
                "data:text/plain;base64,SGVsbG8=",
            ),
            ("custom-scheme:resource-id", "custom-scheme:resource-id"),
            ("urn:isbn:1234", "urn:isbn:1234"),
            ("https://example.com/", "https://example.com/"),
            ("https://example.com/a", "https://example.com/a"),
        ];
        for (input, expected) in cases {
            let uri = McpUri::parse(input).unwrap();
            assert_eq!(uri.as_str(), expected, "input = {input}");
        }
    }

    #[test]
    fn rejects_strings_without_a_scheme() {
        assert!(McpUri::parse("not-a-uri").is_err());
    }
}
