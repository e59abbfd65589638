//! Per-class enum codecs.
//!
//! An enum opts in by implementing [`SqlEnum`]. Which wire form it uses is
//! decided once per class, from a fixed priority list:
//!
//! 1. string code, when every member has [`SqlEnum::code`]
//! 2. integer code, when every member has [`SqlEnum::int_code`]
//! 3. member name
//!
//! Decoding a wire value that matches no member yields `Ok(None)`.

use super::{Codec, CodecError};
use crate::value::{EnumType, EnumValue, Value, ValueType, WireType, WireValue};

/// An enum that can be stored in a column.
pub trait SqlEnum: Copy + PartialEq + Send + Sync + 'static {
    /// All members in declaration order.
    fn members() -> &'static [Self];

    /// Member name.
    fn name(&self) -> &'static str;

    /// Custom string code.
    fn code(&self) -> Option<&'static str> {
        None
    }

    /// Custom integer code.
    fn int_code(&self) -> Option<i64> {
        None
    }
}

/// How an enum class is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCapability {
    StringCode,
    IntCode,
    Name,
}

impl EnumCapability {
    const PRIORITY: [EnumCapability; 3] = [
        EnumCapability::StringCode,
        EnumCapability::IntCode,
        EnumCapability::Name,
    ];

    fn supported_by(&self, members: &[EnumMember]) -> bool {
        match self {
            EnumCapability::StringCode => {
                !members.is_empty() && members.iter().all(|m| m.code.is_some())
            }
            EnumCapability::IntCode => {
                !members.is_empty() && members.iter().all(|m| m.int_code.is_some())
            }
            EnumCapability::Name => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: &'static str,
    pub code: Option<&'static str>,
    pub int_code: Option<i64>,
}

/// Member table of an enum class with its resolved capability.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    pub members: Vec<EnumMember>,
    pub capability: EnumCapability,
}

impl EnumDescriptor {
    pub fn of<E: SqlEnum>() -> Self {
        let members: Vec<EnumMember> = E::members()
            .iter()
            .map(|m| EnumMember {
                name: m.name(),
                code: m.code(),
                int_code: m.int_code(),
            })
            .collect();
        let capability = EnumCapability::PRIORITY
            .into_iter()
            .find(|c| c.supported_by(&members))
            .unwrap_or(EnumCapability::Name);
        Self {
            members,
            capability,
        }
    }

    fn position_by_name(&self, s: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.name == s)
            .or_else(|| self.members.iter().position(|m| m.name.eq_ignore_ascii_case(s)))
    }

    fn position_by_code(&self, s: &str) -> Option<usize> {
        self.members.iter().position(|m| m.code == Some(s))
    }

    fn position_by_int(&self, n: i64) -> Option<usize> {
        self.members.iter().position(|m| m.int_code == Some(n))
    }
}

/// Codec for one enum class.
#[derive(Debug)]
pub struct EnumCodec {
    ty: EnumType,
    descriptor: EnumDescriptor,
}

impl EnumCodec {
    pub fn new(ty: EnumType) -> Self {
        Self {
            descriptor: ty.describe(),
            ty,
        }
    }

    pub fn capability(&self) -> EnumCapability {
        self.descriptor.capability
    }

    fn member(&self, value: &Value) -> Result<&EnumMember, CodecError> {
        match value {
            Value::Enum(e) if e.ty == self.ty => self
                .descriptor
                .members
                .get(e.ordinal)
                .ok_or_else(|| CodecError::InvalidData(format!("No member #{} in {}", e.ordinal, self.ty.name()))),
            other => Err(CodecError::unsupported(self.name(), other)),
        }
    }
}

impl Codec for EnumCodec {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn encode(&self, value: &Value, wire: Option<WireType>) -> Result<WireValue, CodecError> {
        let member = self.member(value)?;
        let encoded = match (self.descriptor.capability, member.code, member.int_code) {
            (EnumCapability::StringCode, Some(code), _) => WireValue::Text(code.to_string()),
            (EnumCapability::IntCode, _, Some(n)) => match wire {
                Some(w) if w.is_char() => WireValue::Text(n.to_string()),
                _ => WireValue::Int(n),
            },
            _ => WireValue::Text(member.name.to_string()),
        };
        Ok(encoded)
    }

    fn decode(&self, wire: &WireValue, _target: &ValueType) -> Result<Option<Value>, CodecError> {
        let d = &self.descriptor;
        let ordinal = match (d.capability, wire) {
            (EnumCapability::StringCode, WireValue::Text(s)) => d.position_by_code(s),
            (EnumCapability::StringCode, WireValue::Int(n)) => d.position_by_code(&n.to_string()),
            (EnumCapability::IntCode, WireValue::Int(n)) => d.position_by_int(*n),
            (EnumCapability::IntCode, WireValue::Text(s)) => {
                s.trim().parse().ok().and_then(|n| d.position_by_int(n))
            }
            (EnumCapability::Name, WireValue::Text(s)) => d.position_by_name(s),
            _ => None,
        };
        Ok(ordinal.map(|ordinal| {
            Value::Enum(EnumValue {
                ty: self.ty,
                ordinal,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Simple {
        A,
        B,
    }

    impl SqlEnum for Simple {
        fn members() -> &'static [Self] {
            &[Simple::A, Simple::B]
        }

        fn name(&self) -> &'static str {
            match self {
                Simple::A => "a",
                Simple::B => "b",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Status {
        Active,
        Inactive,
        Deleted,
    }

    impl SqlEnum for Status {
        fn members() -> &'static [Self] {
            &[Status::Active, Status::Inactive, Status::Deleted]
        }

        fn name(&self) -> &'static str {
            match self {
                Status::Active => "Active",
                Status::Inactive => "Inactive",
                Status::Deleted => "Deleted",
            }
        }

        fn code(&self) -> Option<&'static str> {
            Some(match self {
                Status::Active => "ACT",
                Status::Inactive => "INA",
                Status::Deleted => "DEL",
            })
        }

        fn int_code(&self) -> Option<i64> {
            Some(*self as i64)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl SqlEnum for Level {
        fn members() -> &'static [Self] {
            &[Level::Low, Level::High]
        }

        fn name(&self) -> &'static str {
            match self {
                Level::Low => "Low",
                Level::High => "High",
            }
        }

        fn int_code(&self) -> Option<i64> {
            Some(match self {
                Level::Low => 10,
                Level::High => 20,
            })
        }
    }

    #[test]
    fn test_capability_priority() {
        assert_eq!(EnumDescriptor::of::<Status>().capability, EnumCapability::StringCode);
        assert_eq!(EnumDescriptor::of::<Level>().capability, EnumCapability::IntCode);
        assert_eq!(EnumDescriptor::of::<Simple>().capability, EnumCapability::Name);
    }

    #[test]
    fn test_string_code_round_trip() {
        let registry = CodecRegistry::new();
        for member in Status::members() {
            let wire = registry.encode(&Value::from_enum(*member), None).unwrap();
            assert_eq!(registry.decode_enum::<Status>(&wire).unwrap(), Some(*member));
        }
        assert_eq!(
            registry.encode(&Value::from_enum(Status::Deleted), None),
            Ok(WireValue::Text("DEL".into()))
        );
    }

    #[test]
    fn test_unknown_code_is_no_match() {
        let registry = CodecRegistry::new();
        assert_eq!(
            registry.decode_enum::<Status>(&WireValue::Text("NOPE".into())),
            Ok(None)
        );
        assert_eq!(registry.decode_enum::<Level>(&WireValue::Int(99)), Ok(None));
        assert_eq!(registry.decode_enum::<Simple>(&WireValue::Bool(true)), Ok(None));
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let registry = CodecRegistry::new();
        assert_eq!(
            registry.decode_enum::<Simple>(&WireValue::Text("A".into())),
            Ok(Some(Simple::A))
        );
        assert_eq!(
            registry.decode_enum::<Simple>(&WireValue::Text("b".into())),
            Ok(Some(Simple::B))
        );
    }

    #[test]
    fn test_int_code() {
        let registry = CodecRegistry::new();
        assert_eq!(
            registry.encode(&Value::from_enum(Level::High), None),
            Ok(WireValue::Int(20))
        );
        assert_eq!(
            registry.encode(&Value::from_enum(Level::High), Some(WireType::VarChar)),
            Ok(WireValue::Text("20".into()))
        );
        assert_eq!(
            registry.decode_enum::<Level>(&WireValue::Text("10".into())),
            Ok(Some(Level::Low))
        );
    }

    #[test]
    fn test_codec_cached_per_class() {
        let registry = CodecRegistry::new();
        let a = registry.enum_codec(EnumType::of::<Status>());
        let b = registry.enum_codec(EnumType::of::<Status>());
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_wrong_class_rejected() {
        let codec = EnumCodec::new(EnumType::of::<Simple>());
        assert!(codec.encode(&Value::from_enum(Level::Low), None).is_err());
    }
}
