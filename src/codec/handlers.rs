//! Built-in codecs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Codec, CodecError};
use crate::value::{Value, ValueType, WireType, WireValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMP_T_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn text_of<'a>(wire: &'a WireValue, expected: &'static str) -> Result<&'a str, CodecError> {
    match wire {
        WireValue::Text(s) => Ok(s.as_str()),
        other => Err(CodecError::unexpected(expected, other)),
    }
}

fn integer_value(n: i64, target: &ValueType) -> Result<Value, CodecError> {
    match target {
        ValueType::Int => i32::try_from(n)
            .map(Value::Int)
            .map_err(|_| CodecError::InvalidData(format!("{} overflows i32", n))),
        _ => Ok(Value::BigInt(n)),
    }
}

fn parse_bool(s: &str) -> Result<bool, CodecError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "y" | "yes" => Ok(true),
        "false" | "f" | "0" | "n" | "no" => Ok(false),
        _ => Err(CodecError::InvalidData(format!("Invalid bool: '{}'", s))),
    }
}

fn decode_bool(wire: &WireValue) -> Result<bool, CodecError> {
    match wire {
        WireValue::Bool(b) => Ok(*b),
        WireValue::Int(n) => Ok(*n != 0),
        WireValue::Float(f) => Ok(*f != 0.0),
        WireValue::Text(s) => parse_bool(s),
        other => Err(CodecError::unexpected("bool", other)),
    }
}

fn decode_i64(wire: &WireValue) -> Result<i64, CodecError> {
    match wire {
        WireValue::Int(n) => Ok(*n),
        WireValue::Bool(b) => Ok(i64::from(*b)),
        WireValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        WireValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| CodecError::InvalidData(format!("Invalid integer: {}", e))),
        other => Err(CodecError::unexpected("int", other)),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, CodecError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, TIMESTAMP_T_FORMAT))
        .map_err(|e| CodecError::InvalidData(format!("Invalid timestamp '{}': {}", s, e)))
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, CodecError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| CodecError::InvalidData(format!("Timestamp out of range: {}", ms)))
}

fn parse_uuid(wire: &WireValue) -> Result<Uuid, CodecError> {
    match wire {
        WireValue::Text(s) => {
            Uuid::parse_str(s).map_err(|e| CodecError::InvalidData(format!("Invalid uuid: {}", e)))
        }
        WireValue::Bytes(b) => {
            Uuid::from_slice(b).map_err(|e| CodecError::InvalidData(format!("Invalid uuid: {}", e)))
        }
        other => Err(CodecError::unexpected("uuid", other)),
    }
}

/// JSON form of a value, used for array payloads.
pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::BigInt(n) => Json::from(*n),
        Value::Double(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Decimal(d) => Json::String(d.to_string()),
        Value::Text(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::Array(b.iter().map(|x| Json::from(*x)).collect()),
        Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
        Value::Time(t) => Json::String(t.format(TIME_FORMAT).to_string()),
        Value::Timestamp(t) => Json::String(t.format(TIMESTAMP_FORMAT).to_string()),
        Value::TimestampTz(t) => Json::String(t.to_rfc3339()),
        Value::Uuid(u) => Json::String(u.to_string()),
        Value::Json(j) => j.clone(),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Enum(e) => Json::String(e.to_string()),
    }
}

fn json_to_value(json: serde_json::Value) -> Value {
    use serde_json::Value as Json;
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::BigInt(i),
            None => Value::Double(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::Text(s),
        Json::Array(items) => Value::Array(items.into_iter().map(json_to_value).collect()),
        obj @ Json::Object(_) => Value::Json(obj),
    }
}

#[derive(Debug)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Bool(b) => Ok(WireValue::Bool(*b)),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        decode_bool(wire).map(|b| Some(Value::Bool(b)))
    }
}

/// Booleans stored in numeric columns as 1/0.
#[derive(Debug)]
pub struct BoolAsNumberCodec;

impl Codec for BoolAsNumberCodec {
    fn name(&self) -> &'static str {
        "bool_as_number"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Bool(b) => Ok(WireValue::Int(i64::from(*b))),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        decode_bool(wire).map(|b| Some(Value::Bool(b)))
    }
}

/// Booleans stored in character columns as `true`/`false`.
#[derive(Debug)]
pub struct BoolAsTextCodec;

impl Codec for BoolAsTextCodec {
    fn name(&self) -> &'static str {
        "bool_as_text"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Bool(b) => Ok(WireValue::Text(b.to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        decode_bool(wire).map(|b| Some(Value::Bool(b)))
    }
}

/// Handles both `Int` and `BigInt`.
#[derive(Debug)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Int(n) => Ok(WireValue::Int(i64::from(*n))),
            Value::BigInt(n) => Ok(WireValue::Int(*n)),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, target: &ValueType) -> Result<Option<Value>, CodecError> {
        integer_value(decode_i64(wire)?, target).map(Some)
    }
}

/// Integers stored in character columns.
#[derive(Debug)]
pub struct NumberAsTextCodec;

impl Codec for NumberAsTextCodec {
    fn name(&self) -> &'static str {
        "number_as_text"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Int(n) => Ok(WireValue::Text(n.to_string())),
            Value::BigInt(n) => Ok(WireValue::Text(n.to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, target: &ValueType) -> Result<Option<Value>, CodecError> {
        integer_value(decode_i64(wire)?, target).map(Some)
    }
}

#[derive(Debug)]
pub struct DoubleCodec;

impl Codec for DoubleCodec {
    fn name(&self) -> &'static str {
        "double"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Double(f) => Ok(WireValue::Float(*f)),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let f = match wire {
            WireValue::Float(f) => *f,
            WireValue::Int(n) => *n as f64,
            WireValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| CodecError::InvalidData(format!("Invalid float: {}", e)))?,
            other => return Err(CodecError::unexpected("float", other)),
        };
        Ok(Some(Value::Double(f)))
    }
}

/// Decimals travel as text to keep their scale.
#[derive(Debug)]
pub struct DecimalCodec;

impl Codec for DecimalCodec {
    fn name(&self) -> &'static str {
        "decimal"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Decimal(d) => Ok(WireValue::Text(d.to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let d = match wire {
            WireValue::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|e| CodecError::InvalidData(format!("Invalid decimal: {}", e)))?,
            WireValue::Int(n) => Decimal::from(*n),
            WireValue::Float(f) => Decimal::try_from(*f)
                .map_err(|e| CodecError::InvalidData(format!("Invalid decimal: {}", e)))?,
            other => return Err(CodecError::unexpected("decimal", other)),
        };
        Ok(Some(Value::Decimal(d)))
    }
}

#[derive(Debug)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Text(s) => Ok(WireValue::Text(s.clone())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let s = match wire {
            WireValue::Text(s) => s.clone(),
            WireValue::Int(n) => n.to_string(),
            WireValue::Float(f) => f.to_string(),
            WireValue::Bool(b) => b.to_string(),
            WireValue::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| CodecError::InvalidData(format!("Invalid UTF-8: {}", e)))?,
            WireValue::Null => return Ok(Some(Value::Null)),
        };
        Ok(Some(Value::Text(s)))
    }
}

#[derive(Debug)]
pub struct BytesCodec;

impl Codec for BytesCodec {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Bytes(b) => Ok(WireValue::Bytes(b.clone())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        match wire {
            WireValue::Bytes(b) => Ok(Some(Value::Bytes(b.clone()))),
            WireValue::Text(s) => Ok(Some(Value::Bytes(s.as_bytes().to_vec()))),
            other => Err(CodecError::unexpected("bytes", other)),
        }
    }
}

/// Dates as ISO-8601 text.
#[derive(Debug)]
pub struct DateCodec;

impl Codec for DateCodec {
    fn name(&self) -> &'static str {
        "date"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Date(d) => Ok(WireValue::Text(d.format(DATE_FORMAT).to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let date = match wire {
            WireValue::Int(ms) => from_millis(*ms)?.date_naive(),
            other => {
                let s = text_of(other, "date")?;
                // Accept full timestamps by reading the date prefix.
                let head = s.get(..10).unwrap_or(s);
                NaiveDate::parse_from_str(head, DATE_FORMAT)
                    .map_err(|e| CodecError::InvalidData(format!("Invalid date '{}': {}", s, e)))?
            }
        };
        Ok(Some(Value::Date(date)))
    }
}

#[derive(Debug)]
pub struct TimeCodec;

impl Codec for TimeCodec {
    fn name(&self) -> &'static str {
        "time"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Time(t) => Ok(WireValue::Text(t.format(TIME_FORMAT).to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let s = text_of(wire, "time")?;
        NaiveTime::parse_from_str(s, TIME_FORMAT)
            .map(|t| Some(Value::Time(t)))
            .map_err(|e| CodecError::InvalidData(format!("Invalid time '{}': {}", s, e)))
    }
}

#[derive(Debug)]
pub struct TimestampCodec;

impl Codec for TimestampCodec {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Timestamp(t) => Ok(WireValue::Text(t.format(TIMESTAMP_FORMAT).to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let ts = match wire {
            WireValue::Int(ms) => from_millis(*ms)?.naive_utc(),
            other => parse_timestamp(text_of(other, "timestamp")?)?,
        };
        Ok(Some(Value::Timestamp(ts)))
    }
}

#[derive(Debug)]
pub struct TimestampTzCodec;

impl Codec for TimestampTzCodec {
    fn name(&self) -> &'static str {
        "timestamptz"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::TimestampTz(t) => Ok(WireValue::Text(t.to_rfc3339())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let ts = match wire {
            WireValue::Int(ms) => from_millis(*ms)?,
            other => {
                let s = text_of(other, "timestamptz")?;
                match DateTime::parse_from_rfc3339(s) {
                    Ok(t) => t.with_timezone(&Utc),
                    // Zone-less text is taken as UTC.
                    Err(_) => parse_timestamp(s)?.and_utc(),
                }
            }
        };
        Ok(Some(Value::TimestampTz(ts)))
    }
}

/// UUIDs as hyphenated text, or raw bytes for binary columns.
#[derive(Debug)]
pub struct UuidCodec;

impl Codec for UuidCodec {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn encode(&self, value: &Value, wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match (value, wire) {
            (Value::Uuid(u), Some(WireType::Binary | WireType::VarBinary)) => {
                Ok(WireValue::Bytes(u.as_bytes().to_vec()))
            }
            (Value::Uuid(u), _) => Ok(WireValue::Text(u.to_string())),
            (other, _) => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        parse_uuid(wire).map(|u| Some(Value::Uuid(u)))
    }
}

#[derive(Debug)]
pub struct UuidBytesCodec;

impl Codec for UuidBytesCodec {
    fn name(&self) -> &'static str {
        "uuid_bytes"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Uuid(u) => Ok(WireValue::Bytes(u.as_bytes().to_vec())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        parse_uuid(wire).map(|u| Some(Value::Uuid(u)))
    }
}

#[derive(Debug)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Json(j) => Ok(WireValue::Text(j.to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let s = text_of(wire, "json")?;
        serde_json::from_str(s)
            .map(|j| Some(Value::Json(j)))
            .map_err(|e| CodecError::InvalidData(format!("Invalid json: {}", e)))
    }
}

/// Arrays travel as JSON array text.
#[derive(Debug)]
pub struct ArrayCodec;

impl Codec for ArrayCodec {
    fn name(&self) -> &'static str {
        "array"
    }

    fn encode(&self, value: &Value, _wire: Option<WireType>) -> Result<WireValue, CodecError> {
        match value {
            Value::Array(_) => Ok(WireValue::Text(value_to_json(value).to_string())),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let s = text_of(wire, "array")?;
        match serde_json::from_str(s) {
            Ok(json @ serde_json::Value::Array(_)) => Ok(Some(json_to_value(json))),
            Ok(_) => Err(CodecError::InvalidData(format!("Not an array: {}", s))),
            Err(e) => Err(CodecError::InvalidData(format!("Invalid array: {}", e))),
        }
    }
}

/// Best-effort codec used when nothing else is registered.
///
/// Encoding picks the natural wire form of the value at call time. Decoding
/// honours the requested type for the simple scalar cases and otherwise
/// returns the wire value's natural language form. Those coercions change
/// the wire shape, so the codec is not symmetric.
#[derive(Debug)]
pub struct DynamicCodec;

impl Codec for DynamicCodec {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn symmetric(&self) -> bool {
        false
    }

    fn encode(&self, value: &Value, wire: Option<WireType>) -> Result<WireValue, CodecError> {
        let encoded = match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => match wire {
                Some(w) if w.is_number() => WireValue::Int(i64::from(*b)),
                _ => WireValue::Bool(*b),
            },
            Value::Int(n) => WireValue::Int(i64::from(*n)),
            Value::BigInt(n) => WireValue::Int(*n),
            Value::Double(f) => WireValue::Float(*f),
            Value::Bytes(b) => WireValue::Bytes(b.clone()),
            Value::Text(s) => WireValue::Text(s.clone()),
            Value::Json(j) => WireValue::Text(j.to_string()),
            Value::Enum(e) => WireValue::Text(e.to_string()),
            other => match value_to_json(other) {
                serde_json::Value::String(s) => WireValue::Text(s),
                json => WireValue::Text(json.to_string()),
            },
        };
        Ok(encoded)
    }

    fn decode(&self, wire: &WireValue, target: &ValueType) -> Result<Option<Value>, CodecError> {
        let value = match (target, wire) {
            (_, WireValue::Null) => Value::Null,
            (ValueType::Bool, w) => Value::Bool(decode_bool(w)?),
            (ValueType::Int | ValueType::BigInt, w) => integer_value(decode_i64(w)?, target)?,
            (ValueType::Text, WireValue::Int(n)) => Value::Text(n.to_string()),
            (_, WireValue::Bool(b)) => Value::Bool(*b),
            (_, WireValue::Int(n)) => Value::BigInt(*n),
            (_, WireValue::Float(f)) => Value::Double(*f),
            (_, WireValue::Text(s)) => Value::Text(s.clone()),
            (_, WireValue::Bytes(b)) => Value::Bytes(b.clone()),
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// encode(decode(w)) == w for a codec's own output.
    fn assert_round_trip(codec: &dyn Codec, target: ValueType, wire: WireValue) {
        assert!(codec.symmetric(), "{} is not symmetric", codec.name());
        let decoded = codec.decode(&wire, &target).unwrap().unwrap();
        assert_eq!(codec.encode(&decoded, None).unwrap(), wire, "{}", codec.name());
    }

    #[test]
    fn test_symmetric_round_trips() {
        assert_round_trip(&BoolCodec, ValueType::Bool, WireValue::Bool(true));
        assert_round_trip(&BoolAsNumberCodec, ValueType::Bool, WireValue::Int(0));
        assert_round_trip(&IntegerCodec, ValueType::Int, WireValue::Int(-12));
        assert_round_trip(&IntegerCodec, ValueType::BigInt, WireValue::Int(1 << 40));
        assert_round_trip(&NumberAsTextCodec, ValueType::Int, WireValue::Text("42".into()));
        assert_round_trip(&DoubleCodec, ValueType::Double, WireValue::Float(2.5));
        assert_round_trip(&DecimalCodec, ValueType::Decimal, WireValue::Text("10.50".into()));
        assert_round_trip(&TextCodec, ValueType::Text, WireValue::Text("hi".into()));
        assert_round_trip(&BytesCodec, ValueType::Bytes, WireValue::Bytes(vec![1, 2, 3]));
        assert_round_trip(&DateCodec, ValueType::Date, WireValue::Text("2024-02-29".into()));
        assert_round_trip(&TimeCodec, ValueType::Time, WireValue::Text("13:45:00".into()));
        assert_round_trip(
            &TimestampCodec,
            ValueType::Timestamp,
            WireValue::Text("2024-01-02 03:04:05.250".into()),
        );
        assert_round_trip(
            &TimestampTzCodec,
            ValueType::TimestampTz,
            WireValue::Text("2024-01-02T03:04:05+00:00".into()),
        );
        assert_round_trip(
            &UuidCodec,
            ValueType::Uuid,
            WireValue::Text("67e55044-10b1-426f-9247-bb680e5fe0c8".into()),
        );
        assert_round_trip(&JsonCodec, ValueType::Json, WireValue::Text(r#"{"a":1}"#.into()));
        assert_round_trip(&ArrayCodec, ValueType::Array, WireValue::Text(r#"[1,"x"]"#.into()));
    }

    #[test]
    fn test_dynamic_codec_is_not_symmetric() {
        assert!(!DynamicCodec.symmetric());
        let wire = WireValue::Int(5);
        let decoded = DynamicCodec.decode(&wire, &ValueType::Text).unwrap().unwrap();
        assert_eq!(decoded, Value::Text("5".into()));
        assert_eq!(
            DynamicCodec.encode(&decoded, None).unwrap(),
            WireValue::Text("5".into())
        );
        let decoded = DynamicCodec.decode(&WireValue::Int(1), &ValueType::Bool).unwrap().unwrap();
        assert_ne!(DynamicCodec.encode(&decoded, None).unwrap(), WireValue::Int(1));
    }

    #[test]
    fn test_integer_overflow() {
        let err = IntegerCodec
            .decode(&WireValue::Int(i64::MAX), &ValueType::Int)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidData(_)));
    }

    #[test]
    fn test_wrong_value_for_codec() {
        let err = DateCodec.encode(&Value::Int(1), None).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedValue { codec: "date", .. }));
    }

    #[test]
    fn test_uuid_binary_column() {
        let u = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let wire = UuidCodec
            .encode(&Value::Uuid(u), Some(WireType::Binary))
            .unwrap();
        assert_eq!(wire, WireValue::Bytes(u.as_bytes().to_vec()));
        assert_eq!(
            UuidCodec.decode(&wire, &ValueType::Uuid).unwrap(),
            Some(Value::Uuid(u))
        );
    }

    #[test]
    fn test_timestamptz_from_millis() {
        let decoded = TimestampTzCodec
            .decode(&WireValue::Int(0), &ValueType::TimestampTz)
            .unwrap();
        assert_eq!(
            decoded,
            Some(Value::TimestampTz(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_bool_text_forms() {
        assert_eq!(
            BoolCodec.decode(&WireValue::Text("Y".into()), &ValueType::Bool),
            Ok(Some(Value::Bool(true)))
        );
        assert!(BoolCodec.decode(&WireValue::Text("maybe".into()), &ValueType::Bool).is_err());
    }
}
