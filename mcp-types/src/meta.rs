use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde_json::Map;
use serde_json::Value;

use crate::jsonrpc::ProgressToken;

/// The `_meta` object attached to MCP request/notification params and results.
///
/// `progressToken` is the one well-known key the protocol reserves; every
/// other key is opaque application data and is preserved verbatim. An
/// absent or empty `_meta` is represented the same way (`Meta::default()`)
/// and is omitted entirely when serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub progress_token: Option<ProgressToken>,
    pub extra: Map<String, Value>,
}

impl Meta {
    pub fn is_empty(meta: &Meta) -> bool {
        meta.progress_token.is_none() && meta.extra.is_empty()
    }

    pub fn with_progress_token(progress_token: ProgressToken) -> Self {
        Self {
            progress_token: Some(progress_token),
            extra: Map::new(),
        }
    }
}

impl Serialize for Meta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = self.extra.clone();
        if let Some(progress_token) = &self.progress_token {
            let value = serde_json::to_value(progress_token).map_err(S::Error::custom)?;
            map.insert("progressToken".to_string(), value);
        }
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Meta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Map::deserialize(deserializer)?;
        let progress_token = match map.remove("progressToken") {
            Some(value) => Some(serde_json::from_value(value).map_err(D::Error::custom)?),
            None => None,
        };
        Ok(Meta {
            progress_token,
            extra: map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_meta_round_trips_as_empty_object() {
        let meta = Meta::default();
        assert!(Meta::is_empty(&meta));
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, serde_json::json!({}));
        let back: Meta = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn progress_token_and_extra_keys_round_trip() {
        let mut extra = Map::new();
        extra.insert("traceId".to_string(), Value::String("abc".to_string()));
        let meta = Meta {
            progress_token: Some(ProgressToken::String("123".to_string())),
            extra,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "progressToken": "123", "traceId": "abc" })
        );
        let back: Meta = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }
}
