use std::sync::Arc;

use dbweave::codec::handlers::BoolAsNumberCodec;
use dbweave::mapping::MappingSource;
use dbweave::prelude::*;
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Active,
    Suspended,
    Closed,
}

impl SqlEnum for Status {
    fn members() -> &'static [Self] {
        &[Status::Active, Status::Suspended, Status::Closed]
    }

    fn name(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Suspended => "Suspended",
            Status::Closed => "Closed",
        }
    }

    fn code(&self) -> Option<&'static str> {
        Some(match self {
            Status::Active => "A",
            Status::Suspended => "S",
            Status::Closed => "C",
        })
    }
}

const USERS: &str = r#"
[[table]]
name = "users"
entity = "User"

[[table.column]]
name = "id"
type = "bigint"
primary = true

[[table.column]]
name = "user_name"
property = "name"

[[table.column]]
name = "active"
wire = "CHAR"

[[table.column]]
name = "uid"
where_value_template = "CAST(? AS uuid)"
"#;

fn users_template(kind: DialectKind) -> LambdaTemplate {
    let mut mappings = MappingRegistry::new();
    mappings
        .load_source(MappingSource::from_toml(USERS).unwrap())
        .unwrap();
    LambdaTemplate::new(kind.strategy()).with_mappings(Arc::new(mappings))
}

#[test]
fn test_registries_are_isolated() {
    let custom = CodecRegistry::new();
    custom.register_type(ValueType::Bool, Arc::new(BoolAsNumberCodec));

    let stock = LambdaTemplate::new(DialectKind::MySql.strategy())
        .select("t")
        .eq("flag", true)
        .build()
        .unwrap();
    let numeric = LambdaTemplate::new(DialectKind::MySql.strategy())
        .with_registry(Arc::new(custom))
        .select("t")
        .eq("flag", true)
        .build()
        .unwrap();

    assert_eq!(stock.args(), &[WireValue::Bool(true)]);
    assert_eq!(numeric.args(), &[WireValue::Int(1)]);
    assert_eq!(
        CodecRegistry::new().encode(&Value::Bool(true), None),
        Ok(WireValue::Bool(true))
    );
}

#[test]
fn test_enum_round_trip() {
    let registry = CodecRegistry::new();
    for member in Status::members() {
        let wire = registry.encode(&Value::from_enum(*member), None).unwrap();
        assert_eq!(registry.decode_enum::<Status>(&wire), Ok(Some(*member)));
    }
    assert_eq!(
        registry.decode_enum::<Status>(&WireValue::Text("Z".into())),
        Ok(None)
    );
}

#[test]
fn test_enum_value_in_condition() {
    let stmt = LambdaTemplate::new(DialectKind::Postgres.strategy())
        .select("accounts")
        .eq("status", Value::from_enum(Status::Suspended))
        .build()
        .unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM accounts WHERE status = $1");
    assert_eq!(stmt.args(), &[WireValue::Text("S".into())]);
}

#[test]
fn test_mapped_select_uses_columns_and_wire_types() {
    let stmt = users_template(DialectKind::Postgres)
        .select("users")
        .eq("name", "bob")
        .eq("active", true)
        .eq("uid", "5b1e")
        .build()
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT * FROM users WHERE user_name = $1 AND active = $2 AND uid = CAST($3 AS uuid)"
    );
    assert_eq!(
        stmt.args(),
        &[
            WireValue::Text("bob".into()),
            WireValue::Text("true".into()),
            WireValue::Text("5b1e".into()),
        ]
    );
}

#[test]
fn test_mapped_update() {
    let stmt = users_template(DialectKind::MySql)
        .update("users")
        .update_to("name", "ann")
        .eq("id", 3)
        .build()
        .unwrap();
    assert_eq!(stmt.sql(), "UPDATE users SET user_name = ? WHERE id = ?");
}

#[test]
fn test_strict_mapping_rejects_unknown_property() {
    let err = users_template(DialectKind::Postgres)
        .select("users")
        .eq("nickname", "x")
        .build()
        .unwrap_err();
    assert!(matches!(err, WeaveError::UnknownProperty { .. }));

    // Unregistered tables fall back to free mappings.
    assert!(users_template(DialectKind::Postgres)
        .select("other")
        .eq("nickname", "x")
        .build()
        .is_ok());
}

#[test]
fn test_duplicate_column_rejected_at_registration() {
    let doc = r#"
[[table]]
name = "t"
[[table.column]]
name = "a"
property = "first"
[[table.column]]
name = "A"
property = "second"
"#;
    let mut mappings = MappingRegistry::new();
    let err = mappings
        .load_source(MappingSource::from_toml(doc).unwrap())
        .unwrap_err();
    assert!(matches!(err, WeaveError::AmbiguousMapping(_)));
}

#[test]
fn test_builder_mapping_matches_toml() {
    let built = TableMapping::builder("users")
        .column(ColumnMapping::new("id", "id").primary())
        .column(ColumnMapping::new("user_name", "name"))
        .build()
        .unwrap();
    let stmt = LambdaTemplate::new(DialectKind::Sqlite.strategy())
        .insert_mapping(Arc::new(built))
        .apply_map(vec![Row::new().with("id", 1).with("name", "ann")])
        .on_duplicate(DuplicateKeyStrategy::Ignore)
        .build()
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT OR IGNORE INTO users (id, user_name) VALUES (?, ?)"
    );
}
