//! Wire types for the Model Context Protocol: the JSON-RPC 2.0 envelope,
//! the `_meta`/progress-token carrier, resource URIs, and the typed
//! params/result pairs for every request and notification in the protocol.
//!
//! This crate has no transport or concurrency opinions; see
//! `mcp-coordinator` for the runtime that drives messages of these types
//! across a connection.

mod common;
mod completion;
mod error_code;
mod initialization;
mod jsonrpc;
mod logging;
mod meta;
mod prompts;
mod resources;
mod roots;
mod sampling;
mod tools;
mod traits;
mod unions;
mod uri;

pub use common::Annotations;
pub use common::CancelledNotification;
pub use common::CancelledNotificationParams;
pub use common::ClientCapabilities;
pub use common::ClientCapabilitiesRoots;
pub use common::EmptyResult;
pub use common::Implementation;
pub use common::PingRequest;
pub use common::PingRequestParams;
pub use common::ProgressNotification;
pub use common::ProgressNotificationParams;
pub use common::Role;
pub use common::ServerCapabilities;
pub use common::ServerCapabilitiesPrompts;
pub use common::ServerCapabilitiesResources;
pub use common::ServerCapabilitiesTools;

pub use completion::CompleteRequest;
pub use completion::CompleteRequestContext;
pub use completion::CompleteRequestParams;
pub use completion::CompleteResult;
pub use completion::CompletionArgument;
pub use completion::CompletionReference;
pub use completion::CompletionValues;

pub use error_code::INTERNAL_ERROR_CODE;
pub use error_code::INVALID_PARAMS_ERROR_CODE;
pub use error_code::INVALID_REQUEST_ERROR_CODE;
pub use error_code::METHOD_NOT_FOUND_ERROR_CODE;
pub use error_code::PARSE_ERROR_CODE;
pub use error_code::PROTOCOL_VERSION_MISMATCH_ERROR_CODE;
pub use error_code::REQUEST_CANCELLED_ERROR_CODE;
pub use error_code::is_disconnect_code;

pub use initialization::InitializeRequest;
pub use initialization::InitializeRequestParams;
pub use initialization::InitializeResult;
pub use initialization::InitializedNotification;
pub use initialization::InitializedNotificationParams;
pub use initialization::LATEST_PROTOCOL_VERSION;

pub use jsonrpc::JSONRPC_VERSION;
pub use jsonrpc::JSONRPCError;
pub use jsonrpc::JSONRPCErrorError;
pub use jsonrpc::JSONRPCMessage;
pub use jsonrpc::JSONRPCNotification;
pub use jsonrpc::JSONRPCRequest;
pub use jsonrpc::JSONRPCResponse;
pub use jsonrpc::ProgressToken;
pub use jsonrpc::RequestId;
pub use jsonrpc::Result as McpResult;

pub use logging::LoggingLevel;
pub use logging::LoggingMessageNotification;
pub use logging::LoggingMessageNotificationParams;
pub use logging::SetLevelRequest;
pub use logging::SetLevelRequestParams;

pub use meta::Meta;

pub use prompts::GetPromptRequest;
pub use prompts::GetPromptRequestParams;
pub use prompts::GetPromptResult;
pub use prompts::ListPromptsRequest;
pub use prompts::ListPromptsRequestParams;
pub use prompts::ListPromptsResult;
pub use prompts::Prompt;
pub use prompts::PromptArgument;
pub use prompts::PromptListChangedNotification;
pub use prompts::PromptListChangedNotificationParams;
pub use prompts::PromptMessage;

pub use resources::BlobResourceContents;
pub use resources::ListResourceTemplatesRequest;
pub use resources::ListResourceTemplatesRequestParams;
pub use resources::ListResourceTemplatesResult;
pub use resources::ListResourcesRequest;
pub use resources::ListResourcesRequestParams;
pub use resources::ListResourcesResult;
pub use resources::ReadResourceRequest;
pub use resources::ReadResourceRequestParams;
pub use resources::ReadResourceResult;
pub use resources::Resource;
pub use resources::ResourceContents;
pub use resources::ResourceListChangedNotification;
pub use resources::ResourceListChangedNotificationParams;
pub use resources::ResourceTemplate;
pub use resources::ResourceUpdatedNotification;
pub use resources::ResourceUpdatedNotificationParams;
pub use resources::SubscribeRequest;
pub use resources::SubscribeRequestParams;
pub use resources::TextResourceContents;
pub use resources::UnsubscribeRequest;
pub use resources::UnsubscribeRequestParams;

pub use roots::ListRootsRequest;
pub use roots::ListRootsRequestParams;
pub use roots::ListRootsResult;
pub use roots::Root;
pub use roots::RootsListChangedNotification;
pub use roots::RootsListChangedNotificationParams;

pub use sampling::CreateMessageRequest;
pub use sampling::CreateMessageRequestParams;
pub use sampling::CreateMessageResult;
pub use sampling::ModelHint;
pub use sampling::ModelPreferences;
pub use sampling::SamplingMessage;

pub use tools::AudioContent;
pub use tools::CallToolRequest;
pub use tools::CallToolRequestParams;
pub use tools::CallToolResult;
pub use tools::ContentBlock;
pub use tools::EmbeddedResource;
pub use tools::ImageContent;
pub use tools::ListToolsRequest;
pub use tools::ListToolsRequestParams;
pub use tools::ListToolsResult;
pub use tools::TextContent;
pub use tools::Tool;
pub use tools::ToolAnnotations;
pub use tools::ToolListChangedNotification;
pub use tools::ToolListChangedNotificationParams;

pub use traits::ModelContextProtocolNotification;
pub use traits::ModelContextProtocolRequest;

pub use unions::ClientNotification;
pub use unions::ClientRequest;
pub use unions::ServerNotification;
pub use unions::ServerRequest;
pub use unions::UnionParseError;
pub use unions::parse_method_params;

pub use uri::McpUri;
pub use uri::UriError;
