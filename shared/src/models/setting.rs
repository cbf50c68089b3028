//! Setting Model (typed key-value configuration)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known setting keys
pub const SETTING_THEME: &str = "theme";
pub const SETTING_DEFAULT_CURRENCY: &str = "default_currency";

/// Declared type of a setting value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum SettingType {
    String,
    Integer,
    Boolean,
    Json,
}

/// Typed setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    String(String),
    Json(Value),
}

impl SettingValue {
    pub fn value_type(&self) -> SettingType {
        match self {
            SettingValue::String(_) => SettingType::String,
            SettingValue::Integer(_) => SettingType::Integer,
            SettingValue::Boolean(_) => SettingType::Boolean,
            SettingValue::Json(_) => SettingType::Json,
        }
    }

    /// Decode the stored TEXT column
    pub fn from_raw(ty: SettingType, raw: &str) -> Option<Self> {
        match ty {
            SettingType::String => Some(SettingValue::String(raw.to_string())),
            SettingType::Integer => raw.trim().parse().ok().map(SettingValue::Integer),
            SettingType::Boolean => match raw.trim() {
                "true" | "1" => Some(SettingValue::Boolean(true)),
                "false" | "0" => Some(SettingValue::Boolean(false)),
                _ => None,
            },
            SettingType::Json => serde_json::from_str(raw).ok().map(SettingValue::Json),
        }
    }

    /// Type-check an incoming JSON value against the declared type
    pub fn from_json(ty: SettingType, value: Value) -> Option<Self> {
        match (ty, value) {
            (SettingType::String, Value::String(s)) => Some(SettingValue::String(s)),
            (SettingType::Integer, Value::Number(n)) => n.as_i64().map(SettingValue::Integer),
            (SettingType::Boolean, Value::Bool(b)) => Some(SettingValue::Boolean(b)),
            (SettingType::Json, v) => Some(SettingValue::Json(v)),
            _ => None,
        }
    }

    /// Encode for the TEXT column
    pub fn to_raw(&self) -> String {
        match self {
            SettingValue::String(s) => s.clone(),
            SettingValue::Integer(i) => i.to_string(),
            SettingValue::Boolean(b) => b.to_string(),
            SettingValue::Json(v) => v.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Setting row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SettingRow {
    pub key: String,
    pub value: String,
    pub value_type: SettingType,
    pub description: Option<String>,
    pub updated_at: i64,
}

/// Setting with decoded value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: SettingValue,
    pub value_type: SettingType,
    pub description: Option<String>,
    pub updated_at: i64,
}

/// Update setting payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub value: Value,
}
