//! Product wire format and input validation
//!
//! Output is total: every stored [`Product`] has exactly one JSON form.
//! Input goes through one explicit validator per writable field and the
//! outcome is collected into [`ValidationErrors`], keyed by field name.
//! Read-only fields (`id`, `created_at`, `updated_at`) and unknown keys in
//! the request body are ignored.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::{
    NewProduct, Price, Product, ProductChanges, StockStatus, PRICE_MAX_DIGITS, PRICE_SCALE,
};

/// Key used for errors that are not tied to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const NAME_MAX_CHARS: usize = 255;
pub const CATEGORY_MAX_CHARS: usize = 255;
pub const SKU_MAX_CHARS: usize = 100;

const REQUIRED: &str = "This field is required.";
const NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_A_NUMBER: &str = "A valid number is required.";
const NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

/// Message attached to `sku` when another product already uses the value
pub const SKU_TAKEN: &str = "product with this sku already exists.";

/// Field name to list of messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single message on one field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Why a request body could not be turned into product input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Body is not JSON at all
    Malformed(String),
    /// Body is JSON but fails field validation
    Invalid(ValidationErrors),
}

impl From<ValidationErrors> for InputError {
    fn from(errors: ValidationErrors) -> Self {
        InputError::Invalid(errors)
    }
}

/// Whether an update must carry every writable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// PUT: all writable fields required
    Full,
    /// PATCH: only supplied fields validated
    Partial,
}

/// Wire representation of a product
pub fn serialize(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "category": product.category,
        "price": product.price.to_string(),
        "stock_status": product.stock_status.as_str(),
        "sku": product.sku,
        "description": product.description,
        "created_at": product.created_at,
        "updated_at": product.updated_at,
    })
}

/// Wire representation of a list of products
pub fn serialize_many(products: &[Product]) -> Vec<Value> {
    products.iter().map(serialize).collect()
}

/// Parse a raw request body into a JSON object
///
/// An empty body is treated as `{}` so that missing fields are reported
/// individually.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, InputError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| InputError::Malformed(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(ValidationErrors::single(NON_FIELD_ERRORS, "No data provided").into()),
        other => Err(ValidationErrors::single(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(&other)
            ),
        )
        .into()),
    }
}

/// Validate a creation payload
pub fn deserialize_new(data: &Map<String, Value>) -> Result<NewProduct, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = required(data, "name", &mut errors, |v| text(v, NAME_MAX_CHARS));
    let category = required(data, "category", &mut errors, |v| text(v, CATEGORY_MAX_CHARS));
    let price = required(data, "price", &mut errors, price);
    let stock_status = required(data, "stock_status", &mut errors, stock_status);
    let sku = required(data, "sku", &mut errors, |v| text(v, SKU_MAX_CHARS));
    let description = required(data, "description", &mut errors, unbounded_text);

    match (name, category, price, stock_status, sku, description) {
        (Some(name), Some(category), Some(price), Some(stock_status), Some(sku), Some(description))
            if errors.is_empty() =>
        {
            Ok(NewProduct {
                name,
                category,
                price,
                stock_status,
                sku,
                description,
            })
        }
        _ => Err(errors),
    }
}

/// Validate an update payload
pub fn deserialize_changes(
    data: &Map<String, Value>,
    mode: UpdateMode,
) -> Result<ProductChanges, ValidationErrors> {
    if mode == UpdateMode::Full {
        return deserialize_new(data).map(ProductChanges::from);
    }

    let mut errors = ValidationErrors::new();
    let changes = ProductChanges {
        name: optional(data, "name", &mut errors, |v| text(v, NAME_MAX_CHARS)),
        category: optional(data, "category", &mut errors, |v| text(v, CATEGORY_MAX_CHARS)),
        price: optional(data, "price", &mut errors, price),
        stock_status: optional(data, "stock_status", &mut errors, stock_status),
        sku: optional(data, "sku", &mut errors, |v| text(v, SKU_MAX_CHARS)),
        description: optional(data, "description", &mut errors, unbounded_text),
    };

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}

fn required<T>(
    data: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
    validate: impl Fn(&Value) -> Result<T, String>,
) -> Option<T> {
    match data.get(field) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(value) => record(field, validate(value), errors),
    }
}

fn optional<T>(
    data: &Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
    validate: impl Fn(&Value) -> Result<T, String>,
) -> Option<T> {
    data.get(field)
        .and_then(|value| record(field, validate(value), errors))
}

fn record<T>(field: &str, result: Result<T, String>, errors: &mut ValidationErrors) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

fn unbounded_text(value: &Value) -> Result<String, String> {
    text(value, usize::MAX)
}

/// Trimmed, non-blank string of at most `max_chars` characters
///
/// Numbers are accepted in their textual form.
fn text(value: &Value, max_chars: usize) -> Result<String, String> {
    let raw = match value {
        Value::Null => return Err(NULL.to_string()),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            return Err(NOT_A_STRING.to_string())
        }
    };
    if raw.is_empty() {
        return Err(BLANK.to_string());
    }
    if raw.chars().count() > max_chars {
        return Err(format!(
            "Ensure this field has no more than {max_chars} characters."
        ));
    }
    Ok(raw)
}

fn stock_status(value: &Value) -> Result<StockStatus, String> {
    match value {
        Value::Null => Err(NULL.to_string()),
        Value::String(s) => StockStatus::from_str(s),
        other => StockStatus::from_str(&other.to_string()),
    }
}

fn price(value: &Value) -> Result<Price, String> {
    let raw = match value {
        Value::Null => return Err(NULL.to_string()),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(NOT_A_NUMBER.to_string()),
    };
    let amount = Decimal::from_str(&raw).map_err(|_| NOT_A_NUMBER.to_string())?;
    check_precision(amount)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(NEGATIVE.to_string());
    }
    Price::new(amount).ok_or_else(|| NOT_A_NUMBER.to_string())
}

/// Digit limits for a `NUMERIC(10, 2)` column
///
/// Trailing fractional zeros do not count toward either limit.
fn check_precision(amount: Decimal) -> Result<(), String> {
    let normalized = amount.normalize();
    let digits = normalized.mantissa().unsigned_abs().to_string().len() as u32;
    let scale = normalized.scale();
    let (total, whole, places) = if scale == 0 {
        (digits, digits, 0)
    } else if digits > scale {
        (digits, digits - scale, scale)
    } else {
        (scale, 0, scale)
    };

    if total > PRICE_MAX_DIGITS {
        return Err(format!(
            "Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."
        ));
    }
    if places > PRICE_SCALE {
        return Err(format!(
            "Ensure that there are no more than {PRICE_SCALE} decimal places."
        ));
    }
    let max_whole = PRICE_MAX_DIGITS - PRICE_SCALE;
    if whole > max_whole {
        return Err(format!(
            "Ensure that there are no more than {max_whole} digits before the decimal point."
        ));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
