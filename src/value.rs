//! Language values, declared wire types and bound wire values.
//!
//! A [`Value`] is what calling code hands to a builder. A [`WireType`] is the
//! declared database column type a codec may be selected by. A [`WireValue`]
//! is the concrete, executor-bindable parameter a codec produces.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::enums::{EnumDescriptor, SqlEnum};

/// A language-level value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    BigInt(i64),
    /// Double precision float
    Double(f64),
    /// Arbitrary precision decimal
    Decimal(Decimal),
    /// String
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Timestamp without zone
    Timestamp(NaiveDateTime),
    /// Timestamp in UTC
    TimestampTz(DateTime<Utc>),
    /// UUID value
    Uuid(Uuid),
    /// JSON document
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
    /// Enum member
    Enum(EnumValue),
}

impl Value {
    /// The language type of this value, `None` for NULL.
    pub fn value_type(&self) -> Option<ValueType> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Double(_) => ValueType::Double,
            Value::Decimal(_) => ValueType::Decimal,
            Value::Text(_) => ValueType::Text,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::TimestampTz(_) => ValueType::TimestampTz,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Json(_) => ValueType::Json,
            Value::Array(_) => ValueType::Array,
            Value::Enum(e) => ValueType::Enum(e.ty),
        };
        Some(ty)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap an enum member.
    pub fn from_enum<E: SqlEnum>(member: E) -> Self {
        let ordinal = E::members()
            .iter()
            .position(|m| *m == member)
            .unwrap_or_default();
        Value::Enum(EnumValue {
            ty: EnumType::of::<E>(),
            ordinal,
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::BigInt(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "'{}'", d),
            Value::Time(t) => write!(f, "'{}'", t),
            Value::Timestamp(t) => write!(f, "'{}'", t),
            Value::TimestampTz(t) => write!(f, "'{}'", t.to_rfc3339()),
            Value::Uuid(u) => write!(f, "'{}'", u),
            Value::Json(j) => write!(f, "'{}'", j),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Enum(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::BigInt(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Timestamp(t)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::TimestampTz(t)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        Value::Json(j)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Identity of an enum class, compared by `TypeId` only.
#[derive(Clone, Copy)]
pub struct EnumType {
    id: TypeId,
    name: &'static str,
    describe: fn() -> EnumDescriptor,
}

impl EnumType {
    pub fn of<E: SqlEnum>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            describe: EnumDescriptor::of::<E>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the member table. Callers cache the result.
    pub fn describe(&self) -> EnumDescriptor {
        (self.describe)()
    }
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EnumType {}

impl Hash for EnumType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumType({})", self.name)
    }
}

/// An enum member carried as a value: its class plus member ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ty: EnumType,
    pub ordinal: usize,
}

impl EnumValue {
    /// Recover the typed member, `None` when the class differs.
    pub fn to_member<E: SqlEnum>(&self) -> Option<E> {
        if self.ty.id != TypeId::of::<E>() {
            return None;
        }
        E::members().get(self.ordinal).copied()
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty.describe().members.get(self.ordinal) {
            Some(member) => write!(f, "{}", member.name),
            None => write!(f, "{}#{}", self.ty.name, self.ordinal),
        }
    }
}

/// The language type axis of the codec registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    BigInt,
    Double,
    Decimal,
    Text,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Array,
    Enum(EnumType),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Enum(e) => write!(f, "enum {}", e.name()),
            other => write!(f, "{:?}", other),
        }
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(ValueType::Bool),
            "int" | "i32" | "integer" => Ok(ValueType::Int),
            "bigint" | "i64" | "long" => Ok(ValueType::BigInt),
            "double" | "f64" | "float" => Ok(ValueType::Double),
            "decimal" | "numeric" => Ok(ValueType::Decimal),
            "text" | "string" => Ok(ValueType::Text),
            "bytes" | "binary" => Ok(ValueType::Bytes),
            "date" => Ok(ValueType::Date),
            "time" => Ok(ValueType::Time),
            "timestamp" | "datetime" => Ok(ValueType::Timestamp),
            "timestamptz" => Ok(ValueType::TimestampTz),
            "uuid" => Ok(ValueType::Uuid),
            "json" => Ok(ValueType::Json),
            "array" => Ok(ValueType::Array),
            _ => Err(format!("unknown value type '{}'", s)),
        }
    }
}

/// Declared database column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    Clob,
    Binary,
    VarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Array,
    Other,
}

impl WireType {
    /// The wire type a column gets when none is declared.
    pub fn default_for(ty: &ValueType) -> WireType {
        match ty {
            ValueType::Bool => WireType::Boolean,
            ValueType::Int => WireType::Integer,
            ValueType::BigInt => WireType::BigInt,
            ValueType::Double => WireType::Double,
            ValueType::Decimal => WireType::Decimal,
            ValueType::Text => WireType::VarChar,
            ValueType::Bytes => WireType::VarBinary,
            ValueType::Date => WireType::Date,
            ValueType::Time => WireType::Time,
            ValueType::Timestamp => WireType::Timestamp,
            ValueType::TimestampTz => WireType::TimestampTz,
            ValueType::Uuid => WireType::Uuid,
            ValueType::Json => WireType::Json,
            ValueType::Array => WireType::Array,
            ValueType::Enum(_) => WireType::VarChar,
        }
    }

    /// The language type a column of this wire type decodes to by default.
    pub fn natural_value_type(&self) -> ValueType {
        match self {
            WireType::Bit | WireType::Boolean => ValueType::Bool,
            WireType::TinyInt | WireType::SmallInt | WireType::Integer => ValueType::Int,
            WireType::BigInt => ValueType::BigInt,
            WireType::Real | WireType::Float | WireType::Double => ValueType::Double,
            WireType::Numeric | WireType::Decimal => ValueType::Decimal,
            WireType::Binary | WireType::VarBinary | WireType::Blob => ValueType::Bytes,
            WireType::Date => ValueType::Date,
            WireType::Time => ValueType::Time,
            WireType::Timestamp => ValueType::Timestamp,
            WireType::TimestampTz => ValueType::TimestampTz,
            WireType::Uuid => ValueType::Uuid,
            WireType::Json => ValueType::Json,
            WireType::Array => ValueType::Array,
            _ => ValueType::Text,
        }
    }

    /// Character-class wire types.
    pub const CHARS: &'static [WireType] = &[
        WireType::Char,
        WireType::VarChar,
        WireType::LongVarChar,
        WireType::NChar,
        WireType::NVarChar,
        WireType::Clob,
    ];

    /// Numeric-class wire types.
    pub const NUMBERS: &'static [WireType] = &[
        WireType::TinyInt,
        WireType::SmallInt,
        WireType::Integer,
        WireType::BigInt,
        WireType::Real,
        WireType::Float,
        WireType::Double,
        WireType::Numeric,
        WireType::Decimal,
    ];

    pub fn is_char(&self) -> bool {
        Self::CHARS.contains(self)
    }

    pub fn is_number(&self) -> bool {
        Self::NUMBERS.contains(self)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Bit => "BIT",
            WireType::Boolean => "BOOLEAN",
            WireType::TinyInt => "TINYINT",
            WireType::SmallInt => "SMALLINT",
            WireType::Integer => "INTEGER",
            WireType::BigInt => "BIGINT",
            WireType::Real => "REAL",
            WireType::Float => "FLOAT",
            WireType::Double => "DOUBLE",
            WireType::Numeric => "NUMERIC",
            WireType::Decimal => "DECIMAL",
            WireType::Char => "CHAR",
            WireType::VarChar => "VARCHAR",
            WireType::LongVarChar => "LONGVARCHAR",
            WireType::NChar => "NCHAR",
            WireType::NVarChar => "NVARCHAR",
            WireType::Clob => "CLOB",
            WireType::Binary => "BINARY",
            WireType::VarBinary => "VARBINARY",
            WireType::Blob => "BLOB",
            WireType::Date => "DATE",
            WireType::Time => "TIME",
            WireType::Timestamp => "TIMESTAMP",
            WireType::TimestampTz => "TIMESTAMP_WITH_TIMEZONE",
            WireType::Uuid => "UUID",
            WireType::Json => "JSON",
            WireType::Array => "ARRAY",
            WireType::Other => "OTHER",
        };
        f.write_str(name)
    }
}

impl FromStr for WireType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_uppercase().as_str() {
            "BIT" => WireType::Bit,
            "BOOLEAN" | "BOOL" => WireType::Boolean,
            "TINYINT" => WireType::TinyInt,
            "SMALLINT" | "INT2" => WireType::SmallInt,
            "INTEGER" | "INT" | "INT4" => WireType::Integer,
            "BIGINT" | "INT8" => WireType::BigInt,
            "REAL" | "FLOAT4" => WireType::Real,
            "FLOAT" => WireType::Float,
            "DOUBLE" | "FLOAT8" => WireType::Double,
            "NUMERIC" => WireType::Numeric,
            "DECIMAL" => WireType::Decimal,
            "CHAR" => WireType::Char,
            "VARCHAR" | "TEXT" => WireType::VarChar,
            "LONGVARCHAR" => WireType::LongVarChar,
            "NCHAR" => WireType::NChar,
            "NVARCHAR" => WireType::NVarChar,
            "CLOB" => WireType::Clob,
            "BINARY" => WireType::Binary,
            "VARBINARY" | "BYTEA" => WireType::VarBinary,
            "BLOB" => WireType::Blob,
            "DATE" => WireType::Date,
            "TIME" => WireType::Time,
            "TIMESTAMP" | "DATETIME" => WireType::Timestamp,
            "TIMESTAMP_WITH_TIMEZONE" | "TIMESTAMPTZ" => WireType::TimestampTz,
            "UUID" => WireType::Uuid,
            "JSON" | "JSONB" => WireType::Json,
            "ARRAY" => WireType::Array,
            "OTHER" => WireType::Other,
            _ => return Err(format!("unknown wire type '{}'", s)),
        };
        Ok(ty)
    }
}

/// A concrete parameter handed to the statement executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl WireValue {
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// Short name of the variant, used in codec errors.
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "bool",
            WireValue::Int(_) => "int",
            WireValue::Float(_) => "float",
            WireValue::Text(_) => "text",
            WireValue::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Null => write!(f, "NULL"),
            WireValue::Bool(b) => write!(f, "{}", b),
            WireValue::Int(n) => write!(f, "{}", n),
            WireValue::Float(n) => write!(f, "{}", n),
            WireValue::Text(s) => write!(f, "'{}'", s),
            WireValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}
