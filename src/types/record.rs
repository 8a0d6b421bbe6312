use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single cell value as supplied by the record source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl FieldValue {
    /// Text shown in a report cell. Integral numbers print without a fraction.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Empty => String::new(),
        }
    }

    /// The literal text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, Into::into)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Empty => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(Self::Empty),
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| de::Error::custom("number out of range")),
            serde_json::Value::Bool(b) => Ok(Self::Text(b.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string, number or null field value, found {other}"
            ))),
        }
    }
}

/// A displayable cell: the value plus the human-readable column label.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReportField {
    pub value: FieldValue,
    pub description: String,
}

impl ReportField {
    pub fn new(value: impl Into<FieldValue>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
        }
    }
}

/// Wire form of a field before the key is known.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Described {
        #[serde(default)]
        value: FieldValue,
        description: String,
    },
    Bare(FieldValue),
}

/// One entity instance as an ordered mapping from field key to [`ReportField`].
///
/// Field order is significant: PDF columns follow it, and the column set
/// of a whole report is taken from the first record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportRecord {
    fields: Vec<(String, ReportField)>,
}

impl ReportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, field: ReportField) {
        let key = key.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = field;
        } else {
            self.fields.push((key, field));
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>, description: &str) -> Self {
        self.insert(key, ReportField::new(value, description));
        self
    }

    pub fn get(&self, key: &str) -> Option<&ReportField> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    /// The value stored under `key`, or [`FieldValue::Empty`] when absent.
    pub fn value(&self, key: &str) -> &FieldValue {
        const EMPTY: &FieldValue = &FieldValue::Empty;
        self.get(key).map_or(EMPTY, |f| &f.value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ReportField)> {
        self.fields.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ReportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, field) in &self.fields {
            map.serialize_entry(key, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ReportRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = ReportRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field keys to values or {value, description} objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut record = ReportRecord::new();
                while let Some((key, raw)) = access.next_entry::<String, RawField>()? {
                    let field = match raw {
                        RawField::Described { value, description } => {
                            ReportField { value, description }
                        }
                        RawField::Bare(value) => ReportField {
                            value,
                            description: key.clone(),
                        },
                    };
                    record.insert(key, field);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
