//! Schema descriptions for capability inputs and outputs.
//!
//! Each capability declares a static `InputSchema` (checked before the prompt is
//! rendered) and a static `OutputSchema` (sent to the model as the response schema
//! and re-checked against whatever comes back).

use serde_json::{json, Map, Value};

use crate::pipeline::data_uri::DataUri;

/// Lowest and highest score any capability may return.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

// ────────────────────────────────────────────────────────────────────────────
// Input side
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text. `min_chars` counts Unicode scalar values of the raw string.
    Text { min_chars: usize },
    Integer { min: i64, max: i64 },
    /// A base64 data URI whose MIME type starts with one of the prefixes.
    DataUri { mime_prefixes: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Overrides the generated message when the field fails its constraint.
    pub message: Option<&'static str>,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text { min_chars: 1 },
            required: true,
            message: None,
        }
    }

    pub const fn optional_text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text { min_chars: 0 },
            required: false,
            message: None,
        }
    }

    pub const fn min_chars(mut self, min_chars: usize) -> Self {
        self.kind = FieldKind::Text { min_chars };
        self
    }

    pub const fn integer(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: FieldKind::Integer { min, max },
            required: true,
            message: None,
        }
    }

    pub const fn data_uri(name: &'static str, mime_prefixes: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::DataUri { mime_prefixes },
            required: true,
            message: None,
        }
    }

    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    fn fail(&self, generated: String) -> String {
        self.message.map(str::to_string).unwrap_or(generated)
    }

    fn check(&self, value: Option<&Value>) -> Result<(), String> {
        let value = match value {
            None | Some(Value::Null) if self.required => {
                return Err(self.fail(format!("{} is required", self.name)))
            }
            None | Some(Value::Null) => return Ok(()),
            Some(v) => v,
        };

        match self.kind {
            FieldKind::Text { min_chars } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("{} must be a string", self.name))?;
                if self.required && text.trim().is_empty() {
                    return Err(self.fail(format!("{} cannot be empty", self.name)));
                }
                if text.chars().count() < min_chars {
                    return Err(self.fail(format!(
                        "{} must be at least {} characters",
                        self.name, min_chars
                    )));
                }
            }
            FieldKind::Integer { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| format!("{} must be an integer", self.name))?;
                if n < min || n > max {
                    return Err(self.fail(format!(
                        "{} must be between {} and {}",
                        self.name, min, max
                    )));
                }
            }
            FieldKind::DataUri { mime_prefixes } => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| format!("{} must be a string", self.name))?;
                let uri = DataUri::parse(raw)
                    .map_err(|e| self.fail(format!("{} is not a valid data URI: {e}", self.name)))?;
                if !mime_prefixes.iter().any(|p| uri.mime_type().starts_with(p)) {
                    return Err(self.fail(format!(
                        "{} has unsupported type '{}' (expected {})",
                        self.name,
                        uri.mime_type(),
                        mime_prefixes.join(", ")
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Declared shape of a capability's input.
#[derive(Debug)]
pub struct InputSchema {
    pub fields: &'static [FieldSpec],
}

impl InputSchema {
    /// Checks every field, reporting the first violation.
    pub fn validate(&self, input: &Value) -> Result<(), String> {
        let object = input
            .as_object()
            .ok_or_else(|| "input must be an object".to_string())?;
        for field in self.fields {
            field.check(object.get(field.name))?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output side
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum OutputKind {
    /// Non-empty text.
    Text,
    /// Number in [SCORE_MIN, SCORE_MAX], normalized to an integer.
    Score,
    TextList { min_items: usize },
    ObjectList {
        fields: &'static [OutputField],
        min_items: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct OutputField {
    pub name: &'static str,
    pub kind: OutputKind,
    pub description: &'static str,
}

/// Declared shape of a capability's output.
#[derive(Debug)]
pub struct OutputSchema {
    pub fields: &'static [OutputField],
}

impl OutputSchema {
    /// Renders the schema in the OpenAPI subset the Gemini API accepts as `responseSchema`.
    pub fn response_schema(&self) -> Value {
        object_schema(self.fields)
    }

    /// Checks a model reply in place. Scores are rounded to integers; anything else
    /// that does not fit the declared shape is rejected.
    pub fn validate(&self, output: &mut Value) -> Result<(), String> {
        validate_object(self.fields, output, "")
    }
}

fn object_schema(fields: &[OutputField]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        properties.insert(field.name.to_string(), field_schema(field));
    }
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": names,
        "propertyOrdering": names,
    })
}

fn field_schema(field: &OutputField) -> Value {
    match field.kind {
        OutputKind::Text => json!({"type": "STRING", "description": field.description}),
        OutputKind::Score => json!({
            "type": "INTEGER",
            "description": field.description,
            "minimum": SCORE_MIN,
            "maximum": SCORE_MAX,
        }),
        OutputKind::TextList { min_items } => json!({
            "type": "ARRAY",
            "description": field.description,
            "minItems": min_items,
            "items": {"type": "STRING"},
        }),
        OutputKind::ObjectList { fields, min_items } => json!({
            "type": "ARRAY",
            "description": field.description,
            "minItems": min_items,
            "items": object_schema(fields),
        }),
    }
}

fn validate_object(fields: &[OutputField], value: &mut Value, path: &str) -> Result<(), String> {
    let object = value
        .as_object_mut()
        .ok_or_else(|| format!("{} must be an object", display_path(path)))?;

    for field in fields {
        let field_path = if path.is_empty() {
            field.name.to_string()
        } else {
            format!("{path}.{}", field.name)
        };
        let slot = object
            .get_mut(field.name)
            .ok_or_else(|| format!("missing field '{field_path}'"))?;

        match field.kind {
            OutputKind::Text => {
                let text = slot
                    .as_str()
                    .ok_or_else(|| format!("'{field_path}' must be a string"))?;
                if text.trim().is_empty() {
                    return Err(format!("'{field_path}' is empty"));
                }
            }
            OutputKind::Score => {
                let score = slot
                    .as_f64()
                    .ok_or_else(|| format!("'{field_path}' must be a number"))?;
                if !score.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&score) {
                    return Err(format!(
                        "'{field_path}' = {score} is outside [{SCORE_MIN}, {SCORE_MAX}]"
                    ));
                }
                *slot = json!(score.round() as u64);
            }
            OutputKind::TextList { min_items } => {
                let items = slot
                    .as_array()
                    .ok_or_else(|| format!("'{field_path}' must be an array"))?;
                if items.len() < min_items {
                    return Err(format!(
                        "'{field_path}' has {} items, expected at least {min_items}",
                        items.len()
                    ));
                }
                for (i, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(s) if !s.trim().is_empty() => {}
                        _ => return Err(format!("'{field_path}[{i}]' must be non-empty text")),
                    }
                }
            }
            OutputKind::ObjectList {
                fields: item_fields,
                min_items,
            } => {
                let items = slot
                    .as_array_mut()
                    .ok_or_else(|| format!("'{field_path}' must be an array"))?;
                if items.len() < min_items {
                    return Err(format!(
                        "'{field_path}' has {} items, expected at least {min_items}",
                        items.len()
                    ));
                }
                for (i, item) in items.iter_mut().enumerate() {
                    validate_object(item_fields, item, &format!("{field_path}[{i}]"))?;
                }
            }
        }
    }
    Ok(())
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "response"
    } else {
        path
    }
}
