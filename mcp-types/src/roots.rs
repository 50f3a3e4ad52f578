use serde::Deserialize;
use serde::Serialize;

use crate::mcp_notification;
use crate::mcp_request;
use crate::meta::Meta;
use crate::uri::McpUri;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub uri: McpUri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListRootsRequestParams {
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRootsResult {
    pub roots: Vec<Root>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RootsListChangedNotificationParams {
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

mcp_request!(
    ListRootsRequest,
    "roots/list",
    ListRootsRequestParams,
    ListRootsResult
);
mcp_notification!(
    RootsListChangedNotification,
    "notifications/roots/list_changed",
    RootsListChangedNotificationParams
);
