//! Decoded shape of a KMA open-data response.
//!
//! Every endpoint wraps its payload as
//! `{"response": {"header": {...}, "body": {"items": {"item": [...]}}}}`.
//! `item` is a list, except when the provider has exactly one record to
//! return and sends the bare object instead.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One provider record: field name to text value, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set `name`, keeping its original position if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, value_text(v))).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Numbers keep their JSON spelling (`"nx": 62` becomes `"62"`), null is empty.
fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(value_text)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseRoot {
    response: ApiEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    pub header: Header,
    #[serde(default)]
    pub body: Option<Body>,
}

impl ApiEnvelope {
    /// Decode a raw response body, unwrapping the outer `response` object.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<ResponseRoot>(raw).map(|root| root.response)
    }

    /// `totalCount` reported by the provider, if any.
    pub fn total_count(&self) -> Option<u64> {
        self.body.as_ref().and_then(|b| b.total_count)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(deserialize_with = "text")]
    pub result_code: String,
    #[serde(deserialize_with = "text")]
    pub result_msg: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub items: Option<ItemsField>,
    #[serde(default)]
    pub page_no: Option<u64>,
    #[serde(default)]
    pub num_of_rows: Option<u64>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// KMA sends `"items": ""` when a page has no rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemsField {
    Items {
        #[serde(default)]
        item: Option<OneOrMany<Record>>,
    },
    Blank(String),
}

impl ItemsField {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            ItemsField::Items { item: Some(item) } => item.into_vec(),
            ItemsField::Items { item: None } | ItemsField::Blank(_) => Vec::new(),
        }
    }
}
