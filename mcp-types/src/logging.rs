use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::common::EmptyResult;
use crate::mcp_notification;
use crate::mcp_request;
use crate::meta::Meta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLevelRequestParams {
    pub level: LoggingLevel,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingMessageNotificationParams {
    pub level: LoggingLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub data: Value,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

mcp_request!(
    SetLevelRequest,
    "logging/setLevel",
    SetLevelRequestParams,
    EmptyResult
);
mcp_notification!(
    LoggingMessageNotification,
    "notifications/message",
    LoggingMessageNotificationParams
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_levels_order_by_severity() {
        assert!(LoggingLevel::Debug < LoggingLevel::Emergency);
        assert!(LoggingLevel::Warning < LoggingLevel::Critical);
    }
}
