//! Tally MCP Server
//!
//! MCP server over stdio, one JSON-RPC 2.0 message per line.
//!
//! Tools:
//! - convert: Convert a value between two units of a family
//! - list_units / find_unit / export_units: Browse the registry
//! - create_unit / update_unit / delete_unit: Edit units
//! - rebase_family: Promote a unit to base and rescale its family
//! - usage_count / attach_unit / detach_units: External references
//!
//! Resources:
//! - tally://families/{family} - Units of one family

mod config;
mod protocol;
mod tools;

use std::io::{self, BufRead, Write};
use serde_json::{json, Value as JsonValue};
use tally_core::Family;
use tally_units::report::{self, Locale};
use tally_units::Registry;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use config::Config;
use protocol::{McpError, McpRequest, McpResponse};
use tools::Tally;

const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "tally";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const FAMILY_URI_PREFIX: &str = "tally://families/";

fn main() {
    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env();
    let registry = Registry::in_memory();
    if config.seed {
        match tally_units::seed(&registry) {
            Ok(created) => info!(created, "catalog loaded"),
            Err(e) => error!(error = %e, "failed to load catalog"),
        }
    }

    info!(version = SERVER_VERSION, protocol = PROTOCOL_VERSION, locale = %config.locale, "Tally MCP server started");
    let tally = Tally::new(registry, config);

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("client disconnected (EOF)");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let request: McpRequest = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "unparsable request");
                        let response = McpResponse::from_result(None, Err(McpError::parse_error(e)));
                        if write_response(&response).is_err() {
                            break;
                        }
                        continue;
                    }
                };

                debug!(method = %request.method, "processing");
                let response = handle_request(&tally, &request);

                // Notifications (no id) get no response
                if request.id.is_none() {
                    continue;
                }

                if let Err(e) = write_response(&response) {
                    error!(error = %e, "failed to write response");
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        }
    }

    info!("server shutting down");
}

fn write_response(response: &McpResponse) -> io::Result<()> {
    let response_json = serde_json::to_string(response)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", response_json)?;
    stdout.flush()
}

fn handle_request(tally: &Tally, request: &McpRequest) -> McpResponse {
    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(&request.params),
        "initialized" | "notifications/initialized" => Ok(json!({})),
        "ping" => Ok(json!({})),

        // Tools
        "tools/list" => Ok(tools::tool_definitions()),
        "tools/call" => handle_tool_call(tally, &request.params),

        // Resources
        "resources/list" => handle_resources_list(tally),
        "resources/read" => handle_resources_read(tally, &request.params),

        _ => Err(McpError::method_not_found(&request.method)),
    };

    McpResponse::from_result(request.id.clone(), result)
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params.as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Echo the client's protocol version
    let client_protocol = params.as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    info!(client = client_info, protocol = client_protocol, "client connected");

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Unit registry and exact ratio conversion"
        },
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false }
        },
        "instructions": "Tally converts values between units of the same family (weight, length, currency, ...). Use 'list_units' to see codes, then 'convert' with those codes."
    }))
}

fn handle_tool_call(tally: &Tally, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let params = params.as_ref()
        .ok_or_else(|| McpError::invalid_params("Missing params"))?;

    let name = params.get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    tools::call(tally, name, args)
}

fn handle_resources_list(tally: &Tally) -> Result<JsonValue, McpError> {
    let resources: Vec<JsonValue> = Family::ALL.iter()
        .map(|family| (family, tally.registry.units_of(*family).len()))
        .filter(|(_, count)| *count > 0)
        .map(|(family, count)| json!({
            "uri": format!("{}{}", FAMILY_URI_PREFIX, family),
            "name": family.as_str(),
            "description": format!("{} {} unit(s)", count, family),
            "mimeType": "text/markdown"
        }))
        .collect();

    Ok(json!({ "resources": resources }))
}

fn handle_resources_read(tally: &Tally, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let uri = params.as_ref()
        .and_then(|p| p.get("uri"))
        .and_then(|u| u.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing uri parameter"))?;

    let family = uri.strip_prefix(FAMILY_URI_PREFIX)
        .and_then(Family::parse)
        .ok_or_else(|| McpError::invalid_params(
            format!("Invalid URI: {}. Expected {}{{family}}", uri, FAMILY_URI_PREFIX)
        ))?;

    let locale = Locale::new(&tally.config.locale, &tally.config.fallback_locale);
    let listing = report::list_by_family(&tally.registry.units_of(family), &locale);

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "text/markdown",
            "text": report::render_listing(&listing)
        }]
    }))
}
