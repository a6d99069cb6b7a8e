//! Fixed instruction and reply schema sent with every extraction request.

use leadscan_core::LeadFields;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

pub const EXTRACTION_INSTRUCTION: &str = "Extract information from these images of a visiting card \
or inquiry form. The images may be different sides or pages of the same card or form: merge the \
information from all of them into a single record. If a field is not present in any image, leave \
it as an empty string. Be accurate and professional.";

/// JSON schema of the reply: an object of ten string fields, four of them
/// required.
pub static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let properties: Map<String, Value> = LeadFields::FIELD_NAMES
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "string" })))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": LeadFields::REQUIRED_FIELDS,
    })
});

/// Rewrite `type` values to the upper-case enum names Gemini expects.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match (k.as_str(), v) {
                        ("type", Value::String(t)) => Value::String(t.to_uppercase()),
                        _ => to_gemini_schema(v),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}
