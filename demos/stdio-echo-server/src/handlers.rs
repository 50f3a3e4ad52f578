//! Trivial domain handlers the coordinator dispatches to. Each one is a
//! plain async function matching the `Fn(ClientId, R::Params) -> Future`
//! shape `MessageCoordinatorBuilder::request_handler` expects — the
//! coordinator itself has no idea what `initialize` or `tools/call` mean,
//! it only knows how to look one of these up by method name.

use mcp_coordinator::ClientId;
use mcp_coordinator::HandlerResult;
use mcp_types::CallToolRequestParams;
use mcp_types::CallToolResult;
use mcp_types::ClientCapabilities;
use mcp_types::EmptyResult;
use mcp_types::Implementation;
use mcp_types::InitializeRequestParams;
use mcp_types::InitializeResult;
use mcp_types::LATEST_PROTOCOL_VERSION;
use mcp_types::ListToolsRequestParams;
use mcp_types::ListToolsResult;
use mcp_types::PingRequestParams;
use mcp_types::ServerCapabilities;
use mcp_types::ServerCapabilitiesTools;
use mcp_types::Tool;

pub async fn ping(_client: ClientId, _params: PingRequestParams) -> HandlerResult<EmptyResult> {
    Ok(EmptyResult::default())
}

pub async fn initialize(
    client: ClientId,
    params: InitializeRequestParams,
) -> HandlerResult<InitializeResult> {
    tracing::info!(
        %client,
        client_name = %params.client_info.name,
        client_protocol_version = %params.protocol_version,
        "initialize"
    );
    Ok(InitializeResult {
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        server_info: Implementation {
            name: "stdio-echo-server".to_string(),
            title: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            user_agent: None,
        },
        instructions: Some("Call tools/call with name \"echo\" to get your text back.".into()),
        metadata: Default::default(),
    })
}

fn echo_tool() -> Tool {
    Tool {
        name: "echo".to_string(),
        title: Some("Echo".to_string()),
        description: Some("Returns the `text` argument back as the tool result.".to_string()),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"],
        }),
        output_schema: None,
        annotations: None,
    }
}

pub async fn list_tools(
    _client: ClientId,
    _params: ListToolsRequestParams,
) -> HandlerResult<ListToolsResult> {
    Ok(ListToolsResult {
        tools: vec![echo_tool()],
        next_cursor: None,
        metadata: Default::default(),
    })
}

pub async fn call_tool(
    _client: ClientId,
    params: CallToolRequestParams,
) -> HandlerResult<CallToolResult> {
    if params.name != "echo" {
        return Ok(CallToolResult::error(format!(
            "unknown tool: {}",
            params.name
        )));
    }
    let text = params
        .arguments
        .as_ref()
        .and_then(|args| args.get("text"))
        .and_then(|value| value.as_str())
        .unwrap_or_default();
    Ok(CallToolResult::text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_tool_returns_the_text_argument() {
        let params = CallToolRequestParams {
            name: "echo".to_string(),
            arguments: Some(serde_json::json!({"text": "hello"})),
            metadata: Default::default(),
        };
        let result = call_tool(ClientId::new("c1"), params).await.unwrap();
        assert_eq!(result.is_error, None);
    }

    #[tokio::test]
    async fn unknown_tool_name_is_a_tool_error_not_a_protocol_error() {
        let params = CallToolRequestParams {
            name: "does-not-exist".to_string(),
            arguments: None,
            metadata: Default::default(),
        };
        let result = call_tool(ClientId::new("c1"), params).await.unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn initialize_echoes_latest_protocol_version() {
        let params = InitializeRequestParams {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "test-client".into(),
                title: None,
                version: "0.0.0".into(),
                user_agent: None,
            },
            metadata: Default::default(),
        };
        let result = initialize(ClientId::new("c1"), params).await.unwrap();
        assert_eq!(result.protocol_version, LATEST_PROTOCOL_VERSION);
    }
}
