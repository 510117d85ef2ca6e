//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - execute tools against Buildkite
//!    and serve the prompt catalogue
//! 3. Shutdown - stop at EOF

use std::sync::Arc;

use buildkite_core::BuildkiteProvider;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::handlers::ToolHandler;
use crate::prompts;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    PromptGetParams, PromptsCapability, PromptsListResult, RequestId, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION, SERVER_NAME,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// MCP server for Buildkite.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server backed by `provider`.
    pub fn new(provider: Arc<dyn BuildkiteProvider>) -> Self {
        Self {
            handler: ToolHandler::new(provider),
            initialized: false,
        }
    }

    /// Run the server over stdin/stdout until EOF.
    pub async fn run(&mut self) -> buildkite_core::Result<()> {
        self.run_with(StdioTransport::stdio()).await
    }

    /// Run the server main loop over the given transport.
    pub async fn run_with(&mut self, mut transport: StdioTransport) -> buildkite_core::Result<()> {
        info!(
            tools = self.handler.available_tools().len(),
            "Starting MCP server"
        );

        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&resp) {
                            error!("Failed to write response: {}", e);
                            break;
                        }
                    }
                }
                Ok(None) => {
                    info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    if let Err(e) = transport.write_response(&error_resp) {
                        error!("Failed to write response: {}", e);
                        break;
                    }
                }
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "prompts/list" => self.handle_prompts_list(req.id),
            "prompts/get" => self.handle_prompts_get(req.id, req.params),
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Request cancelled by client"),
            _ => debug!("Ignoring notification: {}", method),
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => info!(
                    "Client: {} v{} (protocol: {})",
                    init_params.client_info.name,
                    init_params.client_info.version,
                    init_params.protocol_version
                ),
                Err(e) => warn!("Failed to parse initialize params: {}", e),
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
                prompts: PromptsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        success(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        success(id, &result)
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(&e.to_string()),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        info!("Calling tool: {}", params.name);

        let result = self.handler.execute(&params.name, params.arguments).await;
        success(id, &result)
    }

    fn handle_prompts_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = PromptsListResult {
            prompts: prompts::available_prompts(),
        };
        success(id, &result)
    }

    fn handle_prompts_get(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: PromptGetParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(&e.to_string()));
            }
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        match prompts::get_prompt(&params.name) {
            Some(result) => success(id, &result),
            None => {
                warn!("Unknown prompt: {}", params.name);
                JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(&format!("unknown prompt: {}", params.name)),
                )
            }
        }
    }
}

fn success<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::FakeProvider;
    use crate::protocol::{JsonRpcNotification, JSONRPC_VERSION};
    use buildkite_core::Pipeline;
    use std::io::{self, Cursor, Write};
    use std::sync::Mutex;

    fn server() -> McpServer {
        McpServer::new(Arc::new(FakeProvider {
            pipelines: vec![Pipeline {
                id: "p1".to_string(),
                slug: "web".to_string(),
                name: "Web".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }))
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let mut server = server();
        let req = request(
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0.0"}
            })),
        );

        let resp = server.handle_request(req).await;

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert_eq!(result["serverInfo"]["name"], "buildkite-mcp-server");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["capabilities"]["prompts"]["listChanged"], false);
        assert!(server.initialized);
    }

    #[test]
    fn test_double_initialize_error() {
        let mut server = server();
        server.initialized = true;

        let resp = server.handle_initialize(RequestId::Number(1), None);

        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_initialize_with_invalid_params() {
        let mut server = server();

        let resp = server.handle_initialize(
            RequestId::Number(1),
            Some(serde_json::json!({"invalid": true})),
        );

        assert!(resp.result.is_some());
        assert!(server.initialized);
    }

    #[test]
    fn test_tools_list() {
        let server = server();
        let resp = server.handle_tools_list(RequestId::Number(1));

        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 24);
        assert!(result.tools.iter().any(|t| t.name == "get_job_logs"));
        assert!(result.tools.iter().any(|t| t.name == "list_cluster_queues"));
    }

    #[tokio::test]
    async fn test_prompts_list() {
        let mut server = server();
        let resp = server.handle_request(request("prompts/list", None)).await;

        let result: PromptsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.prompts.len(), 1);
        assert_eq!(result.prompts[0].name, "user_token_organization_prompt");
    }

    #[tokio::test]
    async fn test_prompts_get_unknown_name() {
        let mut server = server();
        let req = request("prompts/get", Some(serde_json::json!({"name": "nope"})));

        let resp = server.handle_request(req).await;

        let error = resp.error.unwrap();
        assert_eq!(error.code, JsonRpcError::INVALID_PARAMS);
        assert!(error.message.contains("unknown prompt: nope"));
    }

    #[tokio::test]
    async fn test_prompts_get_missing_params() {
        let mut server = server();
        let resp = server.handle_request(request("prompts/get", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = server();
        let resp = server.handle_request(request("ping", None)).await;
        assert_eq!(resp.result, Some(serde_json::json!({})));
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = server();
        let resp = server.handle_request(request("unknown/method", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let mut server = server();
        for method in ["initialized", "notifications/cancelled", "some/other"] {
            let msg = IncomingMessage::Notification(JsonRpcNotification {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method: method.to_string(),
                params: None,
            });
            assert!(server.handle_message(msg).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let mut server = server();
        let req = request(
            "tools/call",
            Some(serde_json::json!({
                "name": "get_pipeline",
                "arguments": {"org": "acme", "pipeline_slug": "web"}
            })),
        );

        let resp = server.handle_request(req).await;
        let result = resp.result.unwrap();

        assert_eq!(result["content"][0]["type"], "text");
        assert!(result["content"][0]["text"].as_str().unwrap().contains("\"slug\":\"web\""));
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_error_is_still_success_response() {
        let mut server = server();
        let req = request(
            "tools/call",
            Some(serde_json::json!({"name": "get_pipeline", "arguments": {}})),
        );

        let resp = server.handle_request(req).await;
        assert!(resp.error.is_none());

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "required argument \"org\" not found"
        );
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let mut server = server();
        let resp = server.handle_request(request("tools/call", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let mut server = server();
        let req = request("tools/call", Some(serde_json::json!("not an object")));
        let resp = server.handle_request(req).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_with_session() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
            r#"{"jsonrpc":"2.0","method":"initialized"}"#,
            "",
            "not json",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"list_pipelines","arguments":{"org":"acme"}}}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"prompts/list"}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"prompts/get","params":{"name":"user_token_organization_prompt"}}"#,
        ]
        .join("\n");

        let output = Arc::new(Mutex::new(Vec::new()));
        let transport = StdioTransport::new(
            Box::new(Cursor::new(input)),
            Box::new(SharedWriter(output.clone())),
        );

        server().run_with(transport).await.unwrap();

        let written = String::from_utf8(output.lock().unwrap().clone()).unwrap();
        let lines: Vec<Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["id"], 1);
        assert!(lines[0]["result"]["capabilities"]["prompts"].is_object());
        assert_eq!(lines[1]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(lines[2]["id"], 2);
        let text = lines[2]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"items\""));
        assert_eq!(lines[3]["id"], 3);
        assert_eq!(
            lines[3]["result"]["prompts"][0]["name"],
            "user_token_organization_prompt"
        );
        assert_eq!(lines[4]["id"], 4);
        assert_eq!(lines[4]["result"]["messages"][0]["role"], "user");
        assert!(lines[4]["result"]["messages"][0]["content"]["text"]
            .as_str()
            .unwrap()
            .starts_with("When asked for detail of a users pipelines"));
    }
}
