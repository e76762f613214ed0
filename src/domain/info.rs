//! Security metadata and its normalized display table.
//!
//! Provider metadata is a flat field → scalar mapping whose meaningful fields
//! depend on the quote type. [`info_table`] maps it into a fixed, ordered set
//! of human-readable rows per quote type, substituting placeholders for absent
//! fields.

use crate::domain::quote_type::QuoteType;
use crate::domain::table::Table;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityInfo {
    fields: Map<String, Value>,
}

impl SecurityInfo {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw `quoteType` tag, or "" when absent.
    pub fn quote_type_tag(&self) -> &str {
        self.get_str("quoteType").unwrap_or("")
    }

    pub fn quote_type(&self) -> Option<QuoteType> {
        self.quote_type_tag().parse().ok()
    }

    pub fn short_name(&self) -> Option<&str> {
        self.get_str("shortName")
    }

    pub fn currency(&self) -> Option<&str> {
        self.get_str("currency")
    }
}

impl From<Map<String, Value>> for SecurityInfo {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Text(String),
    Number(f64),
}

impl DisplayValue {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(DisplayValue::Number)
                .unwrap_or_else(|| DisplayValue::Text(n.to_string())),
            other => DisplayValue::Text(stringify(other)),
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Scalar rendered as text, with integers kept integral.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Ordered label → value rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayTable {
    rows: Vec<(&'static str, DisplayValue)>,
}

impl DisplayTable {
    pub fn rows(&self) -> &[(&'static str, DisplayValue)] {
        &self.rows
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.rows.iter().map(|(label, _)| *label).collect()
    }

    pub fn get(&self, label: &str) -> Option<&DisplayValue> {
        self.rows
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Transposed view: one row per field.
    pub fn to_table(&self) -> Table {
        Table::new(
            vec!["Field".to_string(), "Value".to_string()],
            self.rows
                .iter()
                .map(|(label, value)| vec![label.to_string(), value.to_string()])
                .collect(),
        )
    }

    fn push(&mut self, label: &'static str, value: DisplayValue) {
        self.rows.push((label, value));
    }

    /// Raw value, or `default` text when absent.
    fn raw_or(&mut self, info: &SecurityInfo, label: &'static str, key: &str, default: &str) {
        let value = info
            .get(key)
            .map(DisplayValue::from_value)
            .unwrap_or_else(|| DisplayValue::Text(default.to_string()));
        self.push(label, value);
    }

    /// Stringified value, or `default` text when absent.
    fn text_or(&mut self, info: &SecurityInfo, label: &'static str, key: &str, default: &str) {
        let text = info
            .get(key)
            .map(stringify)
            .unwrap_or_else(|| default.to_string());
        self.push(label, DisplayValue::Text(text));
    }

    /// Numeric price, or 0 when absent.
    fn price(&mut self, info: &SecurityInfo, key: &str) {
        let value = info
            .get(key)
            .map(DisplayValue::from_value)
            .unwrap_or(DisplayValue::Number(0.0));
        self.push("Price", value);
    }
}

/// Normalizes provider metadata into the display rows for its quote type.
///
/// Futures, mutual funds, currencies and unrecognized tags yield an empty table.
pub fn info_table(info: &SecurityInfo) -> DisplayTable {
    let mut table = DisplayTable::default();
    let Some(quote_type) = info.quote_type() else {
        return table;
    };

    match quote_type {
        QuoteType::Equity => {
            table.push("Quote Type", DisplayValue::Text(quote_type.to_string()));
            table.raw_or(info, "Name", "shortName", "");
            table.raw_or(info, "Country", "country", "");
            table.raw_or(info, "Market Exchange", "exchange", "");
            table.raw_or(info, "Sector", "sector", "");
            table.raw_or(info, "Industry", "industry", "");
            table.text_or(info, "Market Capitalization", "marketCap", "");
            table.raw_or(info, "Quote currency", "currency", "?");
            table.text_or(info, "Beta", "beta", "?");
            table.price(info, "currentPrice");
        }
        QuoteType::Etf => {
            table.push("Quote Type", DisplayValue::Text(quote_type.to_string()));
            table.raw_or(info, "Market Exchange", "exchange", "");
            table.raw_or(info, "Fund Family", "fundFamily", "");
            table.raw_or(info, "Category", "category", "");
            table.raw_or(info, "Total Assets", "totalAssets", "");
            table.raw_or(info, "Quote currency", "currency", "?");
            table.text_or(info, "Beta", "beta3Year", "?");
            table.price(info, "navPrice");
        }
        QuoteType::Index => {
            table.push("Quote Type", DisplayValue::Text(quote_type.to_string()));
            table.raw_or(info, "Market", "market", "");
            table.price(info, "previousClose");
        }
        QuoteType::Future | QuoteType::MutualFund | QuoteType::Currency => {}
    }

    table
}
