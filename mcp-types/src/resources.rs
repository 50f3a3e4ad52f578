use serde::Deserialize;
use serde::Serialize;

use crate::common::Annotations;
use crate::mcp_notification;
use crate::mcp_request;
use crate::meta::Meta;
use crate::uri::McpUri;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: McpUri,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "mimeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
    #[serde(rename = "size", default, skip_serializing_if = "Option::is_none")]
    pub size_in_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "mimeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceContents {
    Text(TextResourceContents),
    Blob(BlobResourceContents),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResourceContents {
    pub uri: McpUri,
    #[serde(
        rename = "mimeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobResourceContents {
    pub uri: McpUri,
    #[serde(
        rename = "mimeType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mime_type: Option<String>,
    pub blob: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListResourcesRequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResourcesResult {
    pub resources: Vec<Resource>,
    #[serde(
        rename = "nextCursor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ListResourceTemplatesRequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResourceTemplatesResult {
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplate>,
    #[serde(
        rename = "nextCursor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceRequestParams {
    pub uri: McpUri,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequestParams {
    pub uri: McpUri,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribeRequestParams {
    pub uri: McpUri,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUpdatedNotificationParams {
    pub uri: McpUri,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceListChangedNotificationParams {
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

use crate::common::EmptyResult;

mcp_request!(
    ListResourcesRequest,
    "resources/list",
    ListResourcesRequestParams,
    ListResourcesResult
);
mcp_request!(
    ListResourceTemplatesRequest,
    "resources/templates/list",
    ListResourceTemplatesRequestParams,
    ListResourceTemplatesResult
);
mcp_request!(
    ReadResourceRequest,
    "resources/read",
    ReadResourceRequestParams,
    ReadResourceResult
);
mcp_request!(
    SubscribeRequest,
    "resources/subscribe",
    SubscribeRequestParams,
    EmptyResult
);
mcp_request!(
    UnsubscribeRequest,
    "resources/unsubscribe",
    UnsubscribeRequestParams,
    EmptyResult
);
mcp_notification!(
    ResourceUpdatedNotification,
    "notifications/resources/updated",
    ResourceUpdatedNotificationParams
);
mcp_notification!(
    ResourceListChangedNotification,
    "notifications/resources/list_changed",
    ResourceListChangedNotificationParams
);
