//! Tool implementations
//!
//! Bad arguments are protocol errors (-32602). Registry errors are tool
//! results with `isError: true` and a structured `error` report, so the
//! client can tell "unit 7 not found" from "used in 3 places".

use serde_json::{json, Value as JsonValue};
use tally_core::{Family, Number, RegistryError, UnitId};
use tally_units::report::{self, ExportFormat, Locale, MAX_PRECISION};
use tally_units::{NewUnit, Registry, Translation, Unit, UnitPatch};
use tracing::debug;
use crate::config::Config;
use crate::protocol::McpError;

/// Registry plus the settings tools read
pub struct Tally {
    pub registry: Registry,
    pub config: Config,
}

impl Tally {
    pub fn new(registry: Registry, config: Config) -> Self {
        Tally { registry, config }
    }

    fn locale<'a>(&'a self, args: &'a JsonValue) -> Locale<'a> {
        let requested = args.get("locale")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.config.locale);
        Locale::new(requested, &self.config.fallback_locale)
    }
}

pub fn call(tally: &Tally, name: &str, args: JsonValue) -> Result<JsonValue, McpError> {
    debug!(tool = name, "tool call");
    match name {
        "convert" => tool_convert(tally, &args),
        "list_units" => tool_list_units(tally, &args),
        "find_unit" => tool_find_unit(tally, &args),
        "export_units" => tool_export_units(tally, &args),
        "create_unit" => tool_create_unit(tally, &args),
        "update_unit" => tool_update_unit(tally, &args),
        "delete_unit" => tool_delete_unit(tally, &args),
        "rebase_family" => tool_rebase_family(tally, &args),
        "usage_count" => tool_usage_count(tally, &args),
        "attach_unit" => tool_attach_unit(tally, &args),
        "detach_units" => tool_detach_units(tally, &args),
        _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
    }
}

// ============ results ============

fn text_result(text: String, data: JsonValue) -> JsonValue {
    json!({
        "content": [{ "type": "text", "text": text }],
        "data": data,
        "isError": false
    })
}

fn error_result(err: &RegistryError) -> JsonValue {
    let report = err.report();
    json!({
        "content": [{ "type": "text", "text": report.to_string() }],
        "error": report,
        "isError": true
    })
}

/// Fold registry failures into an error tool result
fn respond(outcome: Result<(String, JsonValue), RegistryError>) -> Result<JsonValue, McpError> {
    Ok(match outcome {
        Ok((text, data)) => text_result(text, data),
        Err(e) => error_result(&e),
    })
}

fn unit_json(unit: &Unit) -> JsonValue {
    serde_json::to_value(unit).unwrap_or(JsonValue::Null)
}

// ============ argument helpers ============

fn arg_str<'a>(args: &'a JsonValue, name: &str) -> Result<&'a str, McpError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params(format!("Missing {} argument", name)))
}

/// Accepts JSON numbers and strings ("0.001", "1/3")
fn number_from(value: &JsonValue, name: &str) -> Result<Number, McpError> {
    let raw = match value {
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        _ => return Err(McpError::invalid_params(format!("Argument {} must be a number", name))),
    };
    Number::from_str(&raw).map_err(|e| McpError::invalid_params(format!("Argument {}: {}", name, e)))
}

fn arg_number(args: &JsonValue, name: &str) -> Result<Number, McpError> {
    let value = args.get(name)
        .ok_or_else(|| McpError::invalid_params(format!("Missing {} argument", name)))?;
    number_from(value, name)
}

fn opt_number(args: &JsonValue, name: &str) -> Result<Option<Number>, McpError> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => number_from(value, name).map(Some),
    }
}

fn arg_id(args: &JsonValue, name: &str) -> Result<UnitId, McpError> {
    args.get(name)
        .and_then(|v| v.as_u64())
        .map(UnitId)
        .ok_or_else(|| McpError::invalid_params(format!("Argument {} must be a unit id", name)))
}

fn parse_family(tag: &str) -> Result<Family, McpError> {
    Family::parse(tag).ok_or_else(|| McpError {
        code: crate::protocol::INVALID_PARAMS,
        message: format!("Unknown family: {}", tag),
        data: Some(json!({ "available": Family::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>() })),
    })
}

fn opt_translations(args: &JsonValue) -> Result<Option<Vec<Translation>>, McpError> {
    match args.get("translations") {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| McpError::invalid_params(format!("Argument translations: {}", e))),
    }
}

// ============ tools ============

fn tool_convert(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let amount = arg_number(args, "value")?;
    let from = arg_str(args, "from")?;
    let to = arg_str(args, "to")?;
    let precision = match args.get("precision") {
        None | Some(JsonValue::Null) => tally.config.precision,
        Some(value) => value.as_u64()
            .filter(|p| *p <= MAX_PRECISION as u64)
            .map(|p| p as u32)
            .ok_or_else(|| McpError::invalid_params(
                format!("Argument precision must be an integer from 0 to {}", MAX_PRECISION)
            ))?,
    };
    let locale = tally.locale(args);

    respond(tally.registry.convert_codes(from, to, &amount).map(|(from, to, result)| {
        let sentence = report::conversion_sentence(&amount, &from, &to, &result, precision, &locale);
        let data = json!({
            "value": amount,
            "from": from.id,
            "to": to.id,
            "result": result,
            "rounded": result.to_decimal(precision),
        });
        (sentence, data)
    }))
}

fn tool_list_units(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let units = match args.get("family").and_then(|v| v.as_str()) {
        Some(tag) => tally.registry.units_of(parse_family(tag)?),
        None => tally.registry.units(),
    };

    let listing = report::list_by_family(&units, &tally.locale(args));
    let data = serde_json::to_value(&listing).unwrap_or(JsonValue::Null);
    Ok(text_result(report::render_listing(&listing), data))
}

fn tool_find_unit(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let code = arg_str(args, "code")?;
    let locale = tally.locale(args);
    respond(tally.registry.find_by_code(code).map(|unit| {
        let text = format!("#{} {} ({}): {}", unit.id, unit.name(locale.requested, locale.fallback), unit.family, unit.value);
        (text, unit_json(&unit))
    }))
}

fn tool_export_units(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let format_tag = args.get("format").and_then(|v| v.as_str()).unwrap_or("json");
    let format = ExportFormat::parse(format_tag)
        .ok_or_else(|| McpError::invalid_params(format!("Unknown export format: {}", format_tag)))?;

    let units = tally.registry.units();
    respond(report::export(&units, format).map(|text| {
        let data = json!({ "format": format_tag.to_lowercase(), "units": units.len() });
        (text, data)
    }))
}

fn tool_create_unit(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let family = parse_family(arg_str(args, "family")?)?;
    let value = arg_number(args, "value")?;
    let status = args.get("status").and_then(|v| v.as_bool()).unwrap_or(true);

    let mut draft = NewUnit::new(family, value).with_status(status);
    if let Some(translations) = opt_translations(args)? {
        draft.translations = translations;
    }

    respond(tally.registry.create(draft).map(|unit| {
        (format!("Created unit #{} in {}", unit.id, unit.family), unit_json(&unit))
    }))
}

fn tool_update_unit(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let id = arg_id(args, "id")?;
    let patch = UnitPatch {
        value: opt_number(args, "value")?,
        status: args.get("status").and_then(|v| v.as_bool()),
        translations: opt_translations(args)?,
    };

    respond(tally.registry.update(id, patch).map(|unit| {
        (format!("Updated unit #{}", unit.id), unit_json(&unit))
    }))
}

fn tool_delete_unit(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let id = arg_id(args, "id")?;
    respond(tally.registry.delete(id).map(|()| {
        (format!("Deleted unit #{}", id), json!({ "id": id }))
    }))
}

fn tool_rebase_family(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let family = parse_family(arg_str(args, "family")?)?;
    let id = arg_id(args, "id")?;
    let locale = tally.locale(args);

    respond(tally.registry.rebase(family, id).map(|units| {
        let listing = report::list_by_family(&units, &locale);
        let data = json!({ "family": family, "base": id, "units": units.iter().map(unit_json).collect::<Vec<_>>() });
        (report::render_listing(&listing), data)
    }))
}

fn tool_usage_count(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let id = arg_id(args, "id")?;
    respond(tally.registry.get(id).map(|unit| {
        let count = tally.registry.usage_count(unit.id);
        (format!("Unit #{} is used in {} place(s)", id, count), json!({ "id": id, "count": count }))
    }))
}

fn tool_attach_unit(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let entity_type = arg_str(args, "entity_type")?;
    let entity_id = arg_str(args, "entity_id")?;
    let unit_id = arg_id(args, "unit_id")?;
    let value = arg_number(args, "value")?;

    respond(tally.registry.attach(entity_type, entity_id, unit_id, value).map(|reference| {
        let text = format!("Attached unit #{} to {} {}", unit_id, entity_type, entity_id);
        (text, serde_json::to_value(&reference).unwrap_or(JsonValue::Null))
    }))
}

fn tool_detach_units(tally: &Tally, args: &JsonValue) -> Result<JsonValue, McpError> {
    let entity_type = arg_str(args, "entity_type")?;
    let entity_id = arg_str(args, "entity_id")?;

    respond(tally.registry.detach_all(entity_type, entity_id).map(|removed| {
        let text = format!("Removed {} unit reference(s) from {} {}", removed, entity_type, entity_id);
        (text, json!({ "removed": removed }))
    }))
}

/// Tool descriptions for `tools/list`
pub fn tool_definitions() -> JsonValue {
    let id = json!({ "type": "integer", "description": "Unit id" });
    let number = json!({
        "type": ["number", "string"],
        "description": "Decimal or fraction, e.g. 1.5 or \"1/3\""
    });
    let family = json!({
        "type": "string",
        "enum": Family::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>()
    });
    let locale = json!({ "type": "string", "description": "Locale for unit names" });
    let translations = json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "locale": { "type": "string" },
                "name": { "type": "string" },
                "code": { "type": "string" },
                "placement": { "type": "string", "enum": ["left", "right"] },
                "description": { "type": "string" }
            },
            "required": ["locale", "name", "code"]
        }
    });

    json!({
        "tools": [
            {
                "name": "convert",
                "description": "Convert a value between two units of the same family, looked up by code.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "value": number,
                        "from": { "type": "string", "description": "Source unit code (e.g. \"kg\")" },
                        "to": { "type": "string", "description": "Target unit code (e.g. \"lb\")" },
                        "precision": { "type": "integer", "minimum": 0, "maximum": MAX_PRECISION, "description": "Decimal places (default: 4)" },
                        "locale": locale
                    },
                    "required": ["value", "from", "to"]
                }
            },
            {
                "name": "list_units",
                "description": "List units grouped by family.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "family": family, "locale": locale }
                }
            },
            {
                "name": "find_unit",
                "description": "Find a unit by its code.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "code": { "type": "string" }, "locale": locale },
                    "required": ["code"]
                }
            },
            {
                "name": "export_units",
                "description": "Export every unit with translations and timestamps.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "format": { "type": "string", "enum": ["json", "csv"], "default": "json" } }
                }
            },
            {
                "name": "create_unit",
                "description": "Create a unit. The first unit of a family must have value 1 and becomes its base.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "family": family,
                        "value": number,
                        "status": { "type": "boolean", "default": true },
                        "translations": translations
                    },
                    "required": ["family", "value"]
                }
            },
            {
                "name": "update_unit",
                "description": "Update value, status or translations of a unit. The base unit's value cannot change.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "id": id,
                        "value": number,
                        "status": { "type": "boolean" },
                        "translations": translations
                    },
                    "required": ["id"]
                }
            },
            {
                "name": "delete_unit",
                "description": "Delete an unreferenced unit.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "id": id },
                    "required": ["id"]
                }
            },
            {
                "name": "rebase_family",
                "description": "Make a unit the base of its family and rescale every sibling.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "family": family, "id": id, "locale": locale },
                    "required": ["family", "id"]
                }
            },
            {
                "name": "usage_count",
                "description": "Count external references to a unit.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "id": id },
                    "required": ["id"]
                }
            },
            {
                "name": "attach_unit",
                "description": "Attach a unit and a value (in that unit) to an external entity.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "entity_type": { "type": "string" },
                        "entity_id": { "type": "string" },
                        "unit_id": id,
                        "value": number
                    },
                    "required": ["entity_type", "entity_id", "unit_id", "value"]
                }
            },
            {
                "name": "detach_units",
                "description": "Remove every unit reference held by an external entity.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "entity_type": { "type": "string" },
                        "entity_id": { "type": "string" }
                    },
                    "required": ["entity_type", "entity_id"]
                }
            }
        ]
    })
}
