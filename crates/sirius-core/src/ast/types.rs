//! Value and data type definitions shared by the AST, executor and storage layers.

use std::collections::BTreeSet;
use std::fmt;

/// A runtime value: the tagged sum every column cell and every literal reduces to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL. Never equal to anything, including another null.
    Null,
    /// A 64-bit signed integer.
    Integer(i64),
    /// A double-precision float.
    Double(f64),
    /// A UTF-8 string.
    String(String),
    /// A boolean.
    Boolean(bool),
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical textual encoding used as an index key and for `IN`-subquery
    /// membership sets. Strings use their raw bytes; everything else uses a
    /// stable textual form. Null is never encoded (callers must check
    /// [`Value::is_null`] first).
    #[must_use]
    pub fn canonical_key(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Double(d) => Some(format_double_shortest(*d)),
            Self::Boolean(b) => Some(if *b { "true" } else { "false" }.to_string()),
        }
    }

    /// Compares two values for SQL equality, with int/double promotion.
    /// Null is never equal to anything, including itself.
    #[must_use]
    pub fn sql_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Integer(a), Self::Double(b)) | (Self::Double(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            _ => false,
        }
    }

    /// Orders two values for `<`, `>`, `<=`, `>=`; returns `None` when the
    /// comparison is undefined (null involved, or incompatible types).
    #[must_use]
    pub fn sql_partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Double(b)) => (*a as f64).partial_cmp(b),
            (Self::Double(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Shortest round-trip decimal rendering of a double, used for canonical keys.
fn format_double_shortest(d: f64) -> String {
    let mut s = format!("{d}");
    if !s.contains('.') && !s.contains('e') && !s.contains("inf") && !s.contains("NaN") {
        s.push_str(".0");
    }
    s
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::String(s) => serializer.serialize_str(s),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Reconstructs a [`Value`] from its bare on-disk encoding. Only used to
/// read back what [`Value`]'s own `Serialize` impl wrote, so every JSON
/// scalar kind maps onto exactly one variant.
impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("null, a number, a string or a boolean")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::Boolean(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::Integer(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::Integer(v as i64))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Value::Double(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::String(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::String(v))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// The declared type of a column or literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int,
    /// Double-precision float.
    Double,
    /// Variable-length string, optionally bounded by a column's `max_length`.
    Varchar,
    /// Boolean.
    Boolean,
    /// Calendar date, stored as an integer day count.
    Date,
    /// Point in time, stored as an integer epoch value.
    Timestamp,
    /// Unparseable or unrecognized type name; always a semantic error at execute time.
    Unknown,
}

impl DataType {
    /// Parses a type name (case-insensitive). Anything unrecognized maps to
    /// [`DataType::Unknown`] rather than failing — the parser records the
    /// type name it saw and the executor is the one that rejects it.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" => Self::Int,
            "DOUBLE" | "FLOAT" | "REAL" => Self::Double,
            "VARCHAR" | "STRING" | "TEXT" => Self::Varchar,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "DATE" => Self::Date,
            "TIMESTAMP" | "DATETIME" => Self::Timestamp,
            _ => Self::Unknown,
        }
    }

    /// Returns the canonical spelling for result headers and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Double => "DOUBLE",
            Self::Varchar => "VARCHAR",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns the type-appropriate "zero" default used when a NOT NULL
    /// column is added to a table that already has rows.
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self {
            Self::Int | Self::Date | Self::Timestamp => Value::Integer(0),
            Self::Double => Value::Double(0.0),
            Self::Varchar => Value::String(String::new()),
            Self::Boolean => Value::Boolean(false),
            Self::Unknown => Value::Null,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column definition, as it appears in `CREATE TABLE` and `ADD COLUMN`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared data type.
    pub data_type: DataType,
    /// Whether the column rejects null values.
    pub not_null: bool,
    /// Whether this column is the table's primary key.
    pub primary_key: bool,
    /// Maximum string length, meaningful only for `Varchar`.
    pub max_length: Option<u32>,
}

impl ColumnDef {
    /// Creates a new column definition with no constraints.
    #[must_use]
    pub const fn new(name: String, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            not_null: false,
            primary_key: false,
            max_length: None,
        }
    }
}

/// Per-table configuration. Defaults match the engine's baseline behavior.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableOptions {
    /// Data types permitted for columns of this table; empty means "all allowed".
    pub allowed_types: BTreeSet<DataType>,
    /// Maximum identifier length for column names, 1..=64.
    pub max_column_name_length: u32,
    /// Extra characters allowed in identifiers beyond letters/digits/underscore.
    pub additional_name_chars: BTreeSet<char>,
    /// Maximum string length for VARCHAR values, 1..=2^40.
    pub max_string_length: u64,
    /// Advisory garbage-collection interval in days, 1..=365.
    pub gc_frequency_days: u16,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            allowed_types: BTreeSet::new(),
            max_column_name_length: 16,
            additional_name_chars: BTreeSet::new(),
            max_string_length: 65536,
            gc_frequency_days: 7,
        }
    }
}

impl TableOptions {
    /// Validates option ranges. Mirrors the executor's "reject the whole
    /// statement on the first bad option" propagation policy.
    #[must_use]
    pub fn validate(&self) -> bool {
        (1..=64).contains(&self.max_column_name_length)
            && self.max_string_length >= 1
            && self.max_string_length <= (1u64 << 40)
            && (1..=365).contains(&self.gc_frequency_days)
    }
}
