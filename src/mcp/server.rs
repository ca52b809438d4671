//! MCP server exposing the nominal calculator as tools.
//!
//! Lifecycle:
//!
//! 1. **Initialisation**: `initialize` request, then the
//!    `notifications/initialized` notification
//! 2. **Operation**: `tools/list`, `tools/call` and `ping`
//! 3. **Shutdown**: stdin closed, SIGINT or SIGTERM
//!
//! Requests are handled one at a time. The only state kept between tool
//! calls is the selected export file.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ExportError;
use crate::export::ExportSession;
use crate::mcp::protocol::{
    parse_message, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION,
    SERVER_NAME,
};
use crate::mcp::transport::StdioTransport;
use crate::nominal::catalog::{Dimension, PACKAGE_MOUNTS, PART_TYPES};
use crate::nominal::report::{format_value, round_value};
use crate::nominal::{
    compute, CalculationRequest, Computation, Inputs, OptionOverrides, Options, ToleranceRange,
};

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: Value,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    fn json(value: &Value) -> Self {
        Self::text(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportArgs {
    #[serde(default)]
    dimensions: IndexMap<Dimension, ToleranceRange>,
    #[serde(default)]
    part_type: String,
    #[serde(default)]
    package_mount: String,
    #[serde(default)]
    options: OptionOverrides,
    ref_des: String,
    #[serde(default)]
    filepath: Option<String>,
}

impl ExportArgs {
    fn into_request(self) -> (CalculationRequest, String) {
        let request = CalculationRequest {
            dimensions: self.dimensions,
            part_type: self.part_type,
            package_mount: self.package_mount,
            options: self.options,
        };
        (request, self.ref_des)
    }
}

/// The MCP server for nominal package dimension calculations.
pub struct McpServer {
    state: ServerState,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Directories summaries may be exported into. Empty allows any path.
    allowed_paths: Vec<PathBuf>,
    /// Options used where a tool call leaves them out.
    defaults: Options,
    session: ExportSession,
}

impl McpServer {
    /// Creates a new MCP server.
    #[must_use]
    pub const fn new(allowed_paths: Vec<PathBuf>, defaults: Options, session: ExportSession) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            protocol_version: None,
            allowed_paths,
            defaults,
            session,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Returns the export session.
    #[must_use]
    pub const fn session(&self) -> &ExportSession {
        &self.session
    }

    /// Validates that a path is within one of the allowed paths.
    ///
    /// Files that do not exist yet are checked through their parent
    /// directory.
    fn validate_path(&self, filepath: &str) -> Result<PathBuf, String> {
        let path = Path::new(filepath);

        if self.allowed_paths.is_empty() {
            return Ok(path.to_path_buf());
        }

        let canonical_path = if path.exists() {
            path.canonicalize()
                .map_err(|e| format!("Failed to resolve path '{}': {e}", path.display()))?
        } else {
            let filename = path.file_name().ok_or_else(|| {
                format!("Invalid path '{}': no filename specified", path.display())
            })?;
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let canonical_parent = parent.canonicalize().map_err(|e| {
                format!(
                    "Parent directory '{}' does not exist or is inaccessible: {e}",
                    parent.display()
                )
            })?;
            canonical_parent.join(filename)
        };

        let allowed = self.allowed_paths.iter().any(|allowed| {
            allowed
                .canonicalize()
                .is_ok_and(|canonical_allowed| canonical_path.starts_with(canonical_allowed))
        });

        if allowed {
            Ok(canonical_path)
        } else {
            Err("Access denied: path is outside the configured allowed directories".to_string())
        }
    }

    /// Runs the MCP server main loop until stdin closes or a shutdown
    /// signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut transport = StdioTransport::new();
        self.run_with_shutdown(&mut transport).await
    }

    #[cfg(unix)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result?).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    #[cfg(windows)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result?).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles one read from the transport.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        transport: &mut StdioTransport,
        line: Option<String>,
    ) -> std::io::Result<bool> {
        let Some(line) = line else {
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if let Some(reply) = self.handle_line(&line) {
            transport.write_message(&reply).await?;
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles a single line of input and returns the serialised reply.
    ///
    /// Notifications and blank lines produce no reply.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }

        let reply = match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => match self.handle_request(&req) {
                Ok(response) => serde_json::to_string(&response),
                Err(error) => serde_json::to_string(&error),
            },
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                return None;
            }
            Err(error) => serde_json::to_string(&error),
        };

        match reply {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise reply");
                None
            }
        }
    }

    fn handle_request(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        tracing::debug!(id = %req.id, method = %req.method, "Request received");
        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            tracing::info!("Client initialised");
            self.state = ServerState::Running;
        }
    }

    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = parse_params(req, "initialize")?;
        tracing::debug!(client_version = %params.protocol_version, "Initialize requested");

        self.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        let result = json!({ "tools": Self::get_tool_definitions() });
        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    fn handle_tools_call(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = parse_params(req, "tool call")?;

        let result = match params.name.as_str() {
            "list_dimensions" => self.call_list_dimensions(),
            "calculate_nominals" => self.call_calculate_nominals(params.arguments),
            "export_summary" => self.call_export_summary(params.arguments),
            _ => ToolCallResult::error(format!("Unknown tool: {}", params.name)),
        };

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn get_tool_definitions() -> Vec<ToolDefinition> {
        let dimension_labels: Vec<&str> = Dimension::ALL.iter().map(|d| d.label()).collect();
        let calculation_properties = json!({
            "dimensions": {
                "type": "object",
                "description": "Tolerance ranges keyed by dimension label. Each value has optional \
                                'min' and 'max' (string or number). A missing side copies the other.",
                "propertyNames": { "enum": dimension_labels },
                "additionalProperties": {
                    "type": "object",
                    "properties": {
                        "min": { "type": ["string", "number", "null"] },
                        "max": { "type": ["string", "number", "null"] }
                    }
                }
            },
            "part_type": {
                "type": "string",
                "description": "Part type code (e.g. QFN, SOIC), reported as given"
            },
            "package_mount": {
                "type": "string",
                "description": "Package mount style: SMT or TH, reported as given"
            },
            "options": {
                "type": "object",
                "description": "Calculation options. Omitted keys use the server defaults.",
                "properties": {
                    "unit": { "type": "string", "enum": ["mm", "inches"] },
                    "include_standoff_in_thickness": { "type": "boolean" },
                    "lead_height_ratio": { "type": "string", "enum": ["1/2", "2/3"] },
                    "include_die_calculation": { "type": "boolean" },
                    "part_type_mode": { "type": "string", "enum": ["Standard", "Diode", "Flag"] },
                    "bga_mode": { "type": "boolean" },
                    "flag_length": { "type": "string", "description": "Flag length in mm (Flag mode)" },
                    "flag_width": { "type": "string", "description": "Flag width in mm (Flag mode)" }
                }
            }
        });

        let mut export_properties = calculation_properties.clone();
        if let Some(props) = export_properties.as_object_mut() {
            props.insert(
                "ref_des".to_string(),
                json!({
                    "type": "string",
                    "description": "Reference designator written above the summary"
                }),
            );
            props.insert(
                "filepath".to_string(),
                json!({
                    "type": "string",
                    "description": "Optional: select a new export file. Later exports reuse it."
                }),
            );
        }

        vec![
            ToolDefinition {
                name: "list_dimensions".to_string(),
                description: "List the package dimensions accepted by calculate_nominals, in \
                              report order, together with the part type codes, mount styles \
                              and option values."
                    .to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            ToolDefinition {
                name: "calculate_nominals".to_string(),
                description: "Compute nominal package dimensions from min/max tolerance ranges \
                              and derive BGA overmold/laminate thickness, standoff-adjusted lead \
                              height, die size and lead shoulder width. Values are returned in \
                              millimetres with 3 decimals. Fields whose text is not a number \
                              are reported in 'errors' and do not stop the calculation."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": calculation_properties
                }),
            },
            ToolDefinition {
                name: "export_summary".to_string(),
                description: "Compute the summary and append it, preceded by the reference \
                              designator, to the selected text file. If the file is no longer \
                              available, select a new one with 'filepath'."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": export_properties,
                    "required": ["ref_des"]
                }),
            },
        ]
    }

    fn call_list_dimensions(&self) -> ToolCallResult {
        let dimensions: Vec<&str> = Dimension::ALL.iter().map(|d| d.label()).collect();
        ToolCallResult::json(&json!({
            "dimensions": dimensions,
            "part_types": PART_TYPES,
            "package_mounts": PACKAGE_MOUNTS,
            "units": ["mm", "inches"],
            "lead_height_ratios": ["1/2", "2/3"],
            "part_type_modes": ["Standard", "Diode", "Flag"],
            "defaults": self.defaults,
        }))
    }

    fn call_calculate_nominals(&self, arguments: Value) -> ToolCallResult {
        let args: CalculationRequest = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(e),
        };

        let (inputs, options) = self.prepare(args);
        let computation = compute(&inputs, &options);
        ToolCallResult::json(&computation_json(&inputs, &computation))
    }

    fn call_export_summary(&mut self, arguments: Value) -> ToolCallResult {
        let args: ExportArgs = match parse_arguments(arguments) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(e),
        };

        if let Some(filepath) = args.filepath.as_deref() {
            match self.validate_path(filepath) {
                Ok(path) => self.session.select(path),
                Err(e) => return ToolCallResult::error(e),
            }
        }

        let (request, ref_des) = args.into_request();
        let (inputs, options) = self.prepare(request);
        let computation = compute(&inputs, &options);

        match self.session.export(&ref_des, &computation.report) {
            Ok(()) => {
                let target = self
                    .session
                    .target()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                ToolCallResult::json(&json!({
                    "status": "exported",
                    "filepath": target,
                    "ref_des": ref_des.trim(),
                    "report": computation.report.to_text(),
                }))
            }
            Err(e @ ExportError::TargetUnavailable { .. }) => ToolCallResult::error(format!(
                "{e}. Please call export_summary again with a new 'filepath'."
            )),
            Err(ExportError::NoTarget) => ToolCallResult::error(
                "No export file selected. Provide 'filepath' to choose one.",
            ),
            Err(e) => ToolCallResult::error(error_chain(&e)),
        }
    }

    /// Splits tool arguments into engine inputs and resolved options.
    fn prepare(&self, request: CalculationRequest) -> (Inputs, Options) {
        request.warn_unknown_codes();
        request.into_parts(self.defaults.clone())
    }
}

/// Builds the JSON payload returned by `calculate_nominals`.
fn computation_json(inputs: &Inputs, computation: &Computation) -> Value {
    let nominals: IndexMap<&str, f64> = computation
        .nominals
        .iter()
        .map(|(d, v)| (d.label(), round_value(*v)))
        .collect();

    let display: IndexMap<&str, String> = Dimension::ALL
        .iter()
        .filter(|d| inputs.dimensions.contains_key(*d))
        .map(|d| (d.label(), computation.display(*d)))
        .collect();

    let errors: IndexMap<&str, String> = computation
        .errors
        .iter()
        .map(|(d, e)| (d.label(), e.to_string()))
        .collect();

    let derived: Vec<Value> = computation
        .derived
        .iter()
        .map(|d| {
            json!({
                "label": d.label,
                "value": round_value(d.value),
                "formatted": format_value(d.value),
                "unit": crate::nominal::DerivedValue::UNIT,
            })
        })
        .collect();

    json!({
        "report": computation.report.to_text(),
        "nominals": nominals,
        "display": display,
        "errors": errors,
        "derived": derived,
    })
}

fn parse_params<T: for<'de> Deserialize<'de>>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    let params = req.params.clone().ok_or_else(|| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params"))
    })?;
    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
    })
}

fn parse_arguments<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, String> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {e}"))
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
