// Row and payload types
// Rows are read as text whatever the column types are; numeric columns are
// rendered back as JSON numbers. Payloads coerce scalars to the bound type.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `users` table, also the `create_user` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub registration_date: Option<String>,
    /// Opaque serialized cart, never parsed
    #[serde(default, deserialize_with = "lenient::text")]
    pub cart: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub portfolio: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub investment_settings: Option<String>,
}

/// `update_user` payload; only these four columns change
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cart: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub portfolio: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub investment_settings: Option<String>,
}

/// Row of the `products` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Product {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(serialize_with = "render::number")]
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    #[serde(serialize_with = "render::number")]
    pub stock: Option<String>,
    pub colors: Option<String>,
}

/// `create_product` / `update_product` payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductFields {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub colors: Option<String>,
}

/// Row of the `funds` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Fund {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(serialize_with = "render::number")]
    pub price: Option<String>,
}

/// `create_fund` / `update_fund` payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FundFields {
    #[serde(default, deserialize_with = "lenient::text")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub price: Option<f64>,
}

/// Row of the `transactions` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Transaction {
    #[serde(serialize_with = "render::number")]
    pub id: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    #[serde(serialize_with = "render::number")]
    pub amount: Option<String>,
    pub date: Option<String>,
}

/// `add_transaction` payload; the id is assigned by storage
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewTransaction {
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
}

/// Scalar coercion for payload fields.
///
/// Any JSON value is accepted: numbers and booleans become text, numeric
/// strings become numbers, and values with no sensible reading bind as NULL.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Bool(b) => Some(if b { "1" } else { "0" }.to_string()),
            Value::Number(n) => Some(n.to_string()),
            // Arrays and objects are stored as their JSON text
            nested => Some(nested.to_string()),
        })
    }

    pub fn float<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_float(&s),
            Value::Bool(b) => Some(f64::from(u8::from(b))),
            _ => None,
        })
    }

    pub fn integer<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| parse_float(&s).and_then(truncate)),
            Value::Bool(b) => Some(i64::from(b)),
            _ => None,
        })
    }

    fn parse_float(s: &str) -> Option<f64> {
        s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn truncate(v: f64) -> Option<i64> {
        let t = v.trunc();
        (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
    }
}

/// Output rendering for columns read as text
mod render {
    use serde::Serializer;

    /// Integers and decimals go out as JSON numbers, anything else as the stored text
    #[allow(clippy::ref_option)]
    pub fn number<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        let Some(text) = value.as_deref() else {
            return s.serialize_none();
        };
        let trimmed = text.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return s.serialize_i64(int);
        }
        match trimmed.parse::<f64>() {
            Ok(float) if float.is_finite() => s.serialize_f64(float),
            _ => s.serialize_str(text),
        }
    }
}
