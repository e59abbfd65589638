//! Type codec registry.
//!
//! A codec converts between a language [`Value`] and an executor-bindable
//! [`WireValue`]. The registry resolves a codec for a value type plus an
//! optional declared [`WireType`] in this order:
//!
//! 1. exact `(value type, wire type)` pair
//! 2. value type alone
//! 3. enum classes, through a lazily built per-class codec
//! 4. the best-effort fallback codec
//!
//! Registries are plain values. Build one per configuration (or per test)
//! and share it behind an `Arc`; lookups never block each other.

pub mod enums;
pub mod handlers;

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::value::{EnumType, Value, ValueType, WireType, WireValue};
use enums::EnumCodec;
use handlers::*;

pub use enums::{EnumCapability, EnumDescriptor, EnumMember, SqlEnum};

/// Error type for value conversion failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Wire value of the wrong shape for the requested type
    #[error("Expected {expected} wire value, got {got}")]
    UnexpectedWireValue {
        expected: &'static str,
        got: &'static str,
    },
    /// Wire data that cannot be parsed
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Value the codec does not handle
    #[error("Codec '{codec}' cannot handle {value_type}")]
    UnsupportedValue {
        codec: &'static str,
        value_type: String,
    },
}

impl CodecError {
    pub(crate) fn unexpected(expected: &'static str, got: &WireValue) -> Self {
        Self::UnexpectedWireValue {
            expected,
            got: got.kind(),
        }
    }

    pub(crate) fn unsupported(codec: &'static str, value: &Value) -> Self {
        Self::UnsupportedValue {
            codec,
            value_type: value
                .value_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "NULL".to_string()),
        }
    }
}

/// Bidirectional converter between a language value and its wire form.
pub trait Codec: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Encode a non-null value. `wire` is the declared column type, if any.
    fn encode(&self, value: &Value, wire: Option<WireType>) -> Result<WireValue, CodecError>;

    /// Decode a non-null wire value into `target`.
    ///
    /// `Ok(None)` means the wire value matched nothing this codec knows.
    fn decode(&self, wire: &WireValue, target: &ValueType) -> Result<Option<Value>, CodecError>;

    /// Whether `encode(decode(w)) == w` holds for every `w` this codec
    /// produces without a declared wire type.
    fn symmetric(&self) -> bool {
        true
    }
}

/// Concurrent registry of codecs, keyed independently per axis.
#[derive(Debug)]
pub struct CodecRegistry {
    by_type: DashMap<ValueType, Arc<dyn Codec>>,
    by_wire: DashMap<WireType, Arc<dyn Codec>>,
    by_pair: DashMap<(ValueType, WireType), Arc<dyn Codec>>,
    enums: DashMap<TypeId, Arc<EnumCodec>>,
    fallback: Arc<dyn Codec>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// An isolated registry with only the fallback codec.
    pub fn empty() -> Self {
        Self {
            by_type: DashMap::new(),
            by_wire: DashMap::new(),
            by_pair: DashMap::new(),
            enums: DashMap::new(),
            fallback: Arc::new(DynamicCodec),
        }
    }

    /// An isolated registry preloaded with the built-in codecs.
    pub fn new() -> Self {
        let registry = Self::empty();

        let boolean: Arc<dyn Codec> = Arc::new(BoolCodec);
        let integer: Arc<dyn Codec> = Arc::new(IntegerCodec);
        let double: Arc<dyn Codec> = Arc::new(DoubleCodec);
        let decimal: Arc<dyn Codec> = Arc::new(DecimalCodec);
        let text: Arc<dyn Codec> = Arc::new(TextCodec);
        let bytes: Arc<dyn Codec> = Arc::new(BytesCodec);
        let date: Arc<dyn Codec> = Arc::new(DateCodec);
        let time: Arc<dyn Codec> = Arc::new(TimeCodec);
        let timestamp: Arc<dyn Codec> = Arc::new(TimestampCodec);
        let timestamptz: Arc<dyn Codec> = Arc::new(TimestampTzCodec);
        let uuid: Arc<dyn Codec> = Arc::new(UuidCodec);
        let json: Arc<dyn Codec> = Arc::new(JsonCodec);
        let array: Arc<dyn Codec> = Arc::new(ArrayCodec);

        registry.register_type(ValueType::Bool, boolean.clone());
        registry.register_type(ValueType::Int, integer.clone());
        registry.register_type(ValueType::BigInt, integer.clone());
        registry.register_type(ValueType::Double, double.clone());
        registry.register_type(ValueType::Decimal, decimal.clone());
        registry.register_type(ValueType::Text, text.clone());
        registry.register_type(ValueType::Bytes, bytes.clone());
        registry.register_type(ValueType::Date, date.clone());
        registry.register_type(ValueType::Time, time.clone());
        registry.register_type(ValueType::Timestamp, timestamp.clone());
        registry.register_type(ValueType::TimestampTz, timestamptz.clone());
        registry.register_type(ValueType::Uuid, uuid.clone());
        registry.register_type(ValueType::Json, json.clone());
        registry.register_type(ValueType::Array, array.clone());

        registry.register_wire(WireType::Bit, boolean.clone());
        registry.register_wire(WireType::Boolean, boolean.clone());
        for wire in [
            WireType::TinyInt,
            WireType::SmallInt,
            WireType::Integer,
            WireType::BigInt,
        ] {
            registry.register_wire(wire, integer.clone());
        }
        for wire in [WireType::Real, WireType::Float, WireType::Double] {
            registry.register_wire(wire, double.clone());
        }
        registry.register_wire(WireType::Numeric, decimal.clone());
        registry.register_wire(WireType::Decimal, decimal.clone());
        for wire in WireType::CHARS {
            registry.register_wire(*wire, text.clone());
        }
        for wire in [WireType::Binary, WireType::VarBinary, WireType::Blob] {
            registry.register_wire(wire, bytes.clone());
        }
        registry.register_wire(WireType::Date, date);
        registry.register_wire(WireType::Time, time);
        registry.register_wire(WireType::Timestamp, timestamp);
        registry.register_wire(WireType::TimestampTz, timestamptz);
        registry.register_wire(WireType::Uuid, uuid.clone());
        registry.register_wire(WireType::Json, json);
        registry.register_wire(WireType::Array, array);

        // Booleans stored in numeric columns, numbers stored as text.
        registry.register_cross_number(ValueType::Bool, Arc::new(BoolAsNumberCodec));
        registry.register_cross_chars(ValueType::Bool, Arc::new(BoolAsTextCodec));
        registry.register_cross_chars(ValueType::Int, Arc::new(NumberAsTextCodec));
        registry.register_cross_chars(ValueType::BigInt, Arc::new(NumberAsTextCodec));
        registry.register_cross_chars(ValueType::Decimal, decimal);
        for wire in [WireType::Binary, WireType::VarBinary] {
            registry.register_pair(ValueType::Uuid, wire, Arc::new(UuidBytesCodec));
        }

        registry
    }

    /// Register a codec for a language type.
    pub fn register_type(&self, ty: ValueType, codec: Arc<dyn Codec>) {
        tracing::debug!("register codec '{}' for {}", codec.name(), ty);
        self.by_type.insert(ty, codec);
    }

    /// Register a codec for a wire type.
    pub fn register_wire(&self, wire: WireType, codec: Arc<dyn Codec>) {
        self.by_wire.insert(wire, codec);
    }

    /// Register a codec for a specific `(language type, wire type)` pair.
    pub fn register_pair(&self, ty: ValueType, wire: WireType, codec: Arc<dyn Codec>) {
        self.by_pair.insert((ty, wire), codec);
    }

    /// Register `codec` for `ty` paired with every character wire type.
    pub fn register_cross_chars(&self, ty: ValueType, codec: Arc<dyn Codec>) {
        for wire in WireType::CHARS {
            self.register_pair(ty, *wire, codec.clone());
        }
    }

    /// Register `codec` for `ty` paired with every numeric wire type.
    pub fn register_cross_number(&self, ty: ValueType, codec: Arc<dyn Codec>) {
        for wire in WireType::NUMBERS {
            self.register_pair(ty, *wire, codec.clone());
        }
    }

    pub fn has_codec(&self, ty: &ValueType) -> bool {
        self.by_type.contains_key(ty)
    }

    pub fn has_pair(&self, ty: &ValueType, wire: WireType) -> bool {
        self.by_pair.contains_key(&(*ty, wire))
    }

    /// Resolve a codec for a language type and optional declared wire type.
    pub fn lookup(&self, ty: &ValueType, wire: Option<WireType>) -> Arc<dyn Codec> {
        if let Some(wire) = wire {
            if let Some(codec) = self.by_pair.get(&(*ty, wire)) {
                return codec.value().clone();
            }
        }
        if let Some(codec) = self.by_type.get(ty) {
            return codec.value().clone();
        }
        if let ValueType::Enum(enum_type) = ty {
            return self.enum_codec(*enum_type);
        }
        tracing::trace!("no codec for {}, using fallback", ty);
        self.fallback.clone()
    }

    /// Resolve a codec from the wire type alone.
    pub fn lookup_by_wire(&self, wire: WireType) -> Arc<dyn Codec> {
        match self.by_wire.get(&wire) {
            Some(codec) => codec.value().clone(),
            None => self.fallback.clone(),
        }
    }

    /// The per-class enum codec, created on first use.
    pub fn enum_codec(&self, enum_type: EnumType) -> Arc<dyn Codec> {
        if let Some(codec) = self.enums.get(&enum_type.id()) {
            return codec.value().clone();
        }
        self.enums
            .entry(enum_type.id())
            .or_insert_with(|| {
                let codec = EnumCodec::new(enum_type);
                tracing::debug!(
                    "created enum codec for {} ({:?})",
                    enum_type.name(),
                    codec.capability()
                );
                Arc::new(codec)
            })
            .value()
            .clone()
    }

    /// Encode a value, mapping NULL straight through.
    pub fn encode(&self, value: &Value, wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value.value_type() {
            None => Ok(WireValue::Null),
            Some(ty) => self.lookup(&ty, wire).encode(value, wire),
        }
    }

    /// Decode a wire value into `target`. NULL decodes to `Value::Null`.
    pub fn decode(
        &self,
        wire: &WireValue,
        target: &ValueType,
        declared: Option<WireType>,
    ) -> Result<Option<Value>, CodecError> {
        if wire.is_null() {
            return Ok(Some(Value::Null));
        }
        self.lookup(target, declared).decode(wire, target)
    }

    /// Decode a result column whose language type is unknown.
    pub fn decode_column(&self, wire: &WireValue, declared: WireType) -> Result<Option<Value>, CodecError> {
        if wire.is_null() {
            return Ok(Some(Value::Null));
        }
        let target = declared.natural_value_type();
        self.lookup_by_wire(declared).decode(wire, &target)
    }

    /// Decode straight into a typed enum member.
    pub fn decode_enum<E: SqlEnum>(&self, wire: &WireValue) -> Result<Option<E>, CodecError> {
        let ty = ValueType::Enum(EnumType::of::<E>());
        match self.decode(wire, &ty, None)? {
            Some(Value::Enum(member)) => Ok(member.to_member::<E>()),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_lookup_prefers_pair() {
        let registry = CodecRegistry::new();
        let codec = registry.lookup(&ValueType::Bool, Some(WireType::Integer));
        assert_eq!(codec.name(), "bool_as_number");
        let codec = registry.lookup(&ValueType::Bool, Some(WireType::Boolean));
        assert_eq!(codec.name(), "bool");
        let codec = registry.lookup(&ValueType::Bool, None);
        assert_eq!(codec.name(), "bool");
    }

    #[test]
    fn test_lookup_falls_back() {
        let registry = CodecRegistry::empty();
        assert_eq!(registry.lookup(&ValueType::Text, None).name(), "dynamic");
        assert_eq!(
            registry.encode(&Value::from("x"), None),
            Ok(WireValue::Text("x".into()))
        );
    }

    #[test]
    fn test_encode_with_declared_wire() {
        let registry = CodecRegistry::new();
        assert_eq!(
            registry.encode(&Value::Bool(true), Some(WireType::TinyInt)),
            Ok(WireValue::Int(1))
        );
        assert_eq!(
            registry.encode(&Value::Int(7), Some(WireType::VarChar)),
            Ok(WireValue::Text("7".into()))
        );
        assert_eq!(registry.encode(&Value::Null, None), Ok(WireValue::Null));
    }

    #[test]
    fn test_registration_replaces() {
        let registry = CodecRegistry::new();
        registry.register_type(ValueType::Text, Arc::new(DynamicCodec));
        assert_eq!(registry.lookup(&ValueType::Text, None).name(), "dynamic");
        // A separate registry is unaffected.
        assert_eq!(CodecRegistry::new().lookup(&ValueType::Text, None).name(), "text");
    }

    #[test]
    fn test_decode_column_by_wire() {
        let registry = CodecRegistry::new();
        let value = registry
            .decode_column(&WireValue::Text("2024-03-01".into()), WireType::Date)
            .unwrap();
        assert_eq!(
            value,
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(
            registry.decode_column(&WireValue::Null, WireType::Date),
            Ok(Some(Value::Null))
        );
    }
}
