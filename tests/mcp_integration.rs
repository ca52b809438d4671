//! Integration tests for MCP protocol handling.
//!
//! These tests drive the server one line at a time, as the stdio loop
//! does, and check the JSON-RPC replies and tool results.

use std::path::PathBuf;

use package_nominal::export::ExportSession;
use package_nominal::mcp::protocol::{parse_message, IncomingMessage, RequestId};
use package_nominal::mcp::server::{McpServer, ServerState};
use package_nominal::nominal::Options;
use serde_json::{json, Value};

fn send(server: &mut McpServer, message: &Value) -> Value {
    let reply = server
        .handle_line(&message.to_string())
        .expect("Expected a reply");
    serde_json::from_str(&reply).unwrap()
}

fn initialised(allowed_paths: Vec<PathBuf>, session: ExportSession) -> McpServer {
    let mut server = McpServer::new(allowed_paths, Options::default(), session);
    let reply = send(
        &mut server,
        &json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0.0" }
            }
        }),
    );
    assert_eq!(reply["result"]["serverInfo"]["name"], "package-nominal");

    let none = server.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
    assert!(none.is_none());
    assert_eq!(server.state(), ServerState::Running);
    server
}

fn call_tool(server: &mut McpServer, id: i64, name: &str, arguments: Value) -> (bool, String) {
    let reply = send(
        server,
        &json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }),
    );
    let result = &reply["result"];
    let is_error = result["isError"].as_bool().unwrap_or(false);
    let text = result["content"][0]["text"].as_str().unwrap().to_string();
    (is_error, text)
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {}
        }
    }"#;

    let result = parse_message(json);
    assert!(result.is_ok());

    if let IncomingMessage::Request(req) = result.unwrap() {
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, RequestId::Number(1));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_string_id() {
    let json = r#"{"jsonrpc": "2.0", "id": "abc-123", "method": "tools/list"}"#;

    if let IncomingMessage::Request(req) = parse_message(json).unwrap() {
        assert_eq!(req.id, RequestId::String("abc-123".to_string()));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_notification() {
    let json = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;
    assert!(matches!(
        parse_message(json).unwrap(),
        IncomingMessage::Notification(_)
    ));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_malformed_line_gets_parse_error() {
    let mut server = McpServer::new(vec![], Options::default(), ExportSession::default());
    let reply: Value = serde_json::from_str(&server.handle_line("{oops").unwrap()).unwrap();
    assert_eq!(reply["error"]["code"], -32700);
    assert!(reply.get("id").is_none());
}

#[test]
fn test_blank_line_ignored() {
    let mut server = McpServer::new(vec![], Options::default(), ExportSession::default());
    assert!(server.handle_line("   ").is_none());
}

#[test]
fn test_second_initialize_rejected() {
    let mut server = initialised(vec![], ExportSession::default());
    let reply = send(
        &mut server,
        &json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "initialize",
            "params": { "protocolVersion": "2024-11-05" }
        }),
    );
    assert_eq!(reply["error"]["code"], -32600);
}

#[test]
fn test_unknown_method() {
    let mut server = initialised(vec![], ExportSession::default());
    let reply = send(
        &mut server,
        &json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/list" }),
    );
    assert_eq!(reply["error"]["code"], -32601);
    assert_eq!(reply["id"], 3);
}

#[test]
fn test_ping() {
    let mut server = initialised(vec![], ExportSession::default());
    let reply = send(&mut server, &json!({ "jsonrpc": "2.0", "id": "p", "method": "ping" }));
    assert_eq!(reply["id"], "p");
    assert_eq!(reply["result"], json!({}));
}

#[test]
fn test_tools_list() {
    let mut server = initialised(vec![], ExportSession::default());
    let reply = send(
        &mut server,
        &json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    );

    let names: Vec<&str> = reply["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["list_dimensions", "calculate_nominals", "export_summary"]);
}

// =============================================================================
// Tool Tests
// =============================================================================

#[test]
fn test_list_dimensions() {
    let mut server = initialised(vec![], ExportSession::default());
    let (is_error, text) = call_tool(&mut server, 4, "list_dimensions", json!({}));
    assert!(!is_error);

    let listing: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(listing["dimensions"].as_array().unwrap().len(), 23);
    assert_eq!(listing["dimensions"][0], "Overall Width");
    assert_eq!(listing["package_mounts"], json!(["SMT", "TH"]));
    assert_eq!(listing["defaults"]["unit"], "mm");
}

#[test]
fn test_calculate_nominals() {
    let mut server = initialised(vec![], ExportSession::default());
    let (is_error, text) = call_tool(
        &mut server,
        5,
        "calculate_nominals",
        json!({
            "dimensions": {
                "Package Thickness": { "min": "0.9", "max": "1.1" },
                "Lead Standoff": { "min": 0.15, "max": 0.25 },
                "Package Width": { "min": "x", "max": "2" }
            },
            "part_type": "SON",
            "package_mount": "SMT",
            "options": { "bga_mode": true }
        }),
    );
    assert!(!is_error);

    let result: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(result["display"]["Package Thickness"], "1.000");
    assert_eq!(result["display"]["Package Width"], "0.000");
    assert_eq!(result["errors"]["Package Width"], "invalid number");
    assert_eq!(result["nominals"]["Lead Standoff"], 0.2);
    assert_eq!(result["derived"][0]["label"], "BGA Overmold Thickness");
    assert_eq!(result["derived"][0]["formatted"], "0.670");

    let report = result["report"].as_str().unwrap();
    assert!(report.starts_with("Summary:\nPackage Thickness: 1.000 mm\n"));
    assert!(report.contains("Adjusted Lead Height: 0.700 mm\n"));
}

#[test]
fn test_calculate_rejects_bad_option() {
    let mut server = initialised(vec![], ExportSession::default());
    let (is_error, text) = call_tool(
        &mut server,
        6,
        "calculate_nominals",
        json!({ "options": { "lead_height_ratio": "3/4" } }),
    );
    assert!(is_error);
    assert!(text.contains("Invalid arguments"));
}

#[test]
fn test_unknown_tool() {
    let mut server = initialised(vec![], ExportSession::default());
    let (is_error, text) = call_tool(&mut server, 7, "draw_footprint", json!({}));
    assert!(is_error);
    assert!(text.contains("Unknown tool"));
}

#[test]
fn test_export_reuses_selected_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("summary.txt");
    let mut server = initialised(vec![dir.path().to_path_buf()], ExportSession::default());

    let (is_error, _) = call_tool(
        &mut server,
        8,
        "export_summary",
        json!({
            "ref_des": "U1",
            "filepath": target.to_string_lossy(),
            "dimensions": { "Package Width": { "min": "4" } }
        }),
    );
    assert!(!is_error);

    let (is_error, _) = call_tool(
        &mut server,
        9,
        "export_summary",
        json!({ "ref_des": "U2", "dimensions": { "Package Width": { "min": "5" } } }),
    );
    assert!(!is_error);

    let contents = std::fs::read_to_string(&target).unwrap();
    assert!(contents.starts_with("U1\nSummary:\nPackage Width: 4.000 mm\n"));
    assert!(contents.contains("\nU2\nSummary:\nPackage Width: 5.000 mm\n"));
}

#[test]
fn test_export_to_vanished_file_asks_for_new_one() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("gone").join("summary.txt");
    let session = ExportSession::new(Some(gone));
    let mut server = initialised(vec![], session);

    let (is_error, text) = call_tool(&mut server, 10, "export_summary", json!({ "ref_des": "U1" }));
    assert!(is_error);
    assert!(text.contains("new 'filepath'"));
    assert!(server.session().target().is_none());
}
