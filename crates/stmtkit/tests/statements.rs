//! End-to-end statement assembly through the `Statements` façade.

use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use stmtkit::{
    Argument, BuilderConfig, BuiltStatement, ColumnDescriptor, DesiredColumns, Dialect,
    OperationKind, ParameterOrder, Placeholder, Record, Restriction, RestrictionKinds, RuleSet,
    SchemaRegistry, SelectSpec, ShapeSchema, SortSpec, StatementKind, Statements, Tracked,
    UserContext, ValueRule, WriteOptions,
};

fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_shape(
            ShapeSchema::new("Customer")
                .column(ColumnDescriptor::new("Id").primary_key().identity().db_type("int"))
                .column(ColumnDescriptor::new("Name").db_type("nvarchar"))
                .column(ColumnDescriptor::new("Email").db_type("nvarchar"))
                .column(ColumnDescriptor::new("IsDeleted").db_type("bit")),
        )
        .with_shape(
            ShapeSchema::new("Product")
                .column(ColumnDescriptor::new("Code").primary_key())
                .column(ColumnDescriptor::new("Name"))
                .column(ColumnDescriptor::new("Price")),
        )
        .with_shape(
            ShapeSchema::new("Note")
                .column(ColumnDescriptor::new("Id").primary_key().identity())
                .column(ColumnDescriptor::new("Body"))
                .column(ColumnDescriptor::new("UpdatedBy")),
        )
}

fn statements(config: BuilderConfig) -> Statements {
    Statements::new(Arc::new(registry()), config)
}

fn soft_deleting(config: BuilderConfig) -> Statements {
    statements(config).with_rules(Arc::new(RuleSet::new().soft_delete("IsDeleted", true)))
}

fn positional() -> BuilderConfig {
    BuilderConfig::new()
        .dialect(Dialect::new().placeholder(Placeholder::positional("?")))
        .parameter_order(ParameterOrder::KeysLast)
}

fn values(stmt: &BuiltStatement) -> Vec<Value> {
    stmt.parameters.iter().map(|p| p.value.clone()).collect()
}

fn names(stmt: &BuiltStatement) -> Vec<&str> {
    stmt.parameters.iter().map(|p| p.name.as_str()).collect()
}

#[derive(Serialize, Record)]
#[orm(rename_all = "PascalCase")]
struct CustomerRow {
    #[orm(key)]
    id: i64,
    name: String,
    email: Option<String>,
}

// ==================== INSERT ====================

#[test]
fn insert_customer() {
    let args = json!({"Name": "Ann", "Email": "a@x.com"});
    let stmt = statements(BuilderConfig::new())
        .insert("Customer", Argument::from_json(&args).unwrap(), &UserContext::anonymous())
        .unwrap();

    assert_eq!(stmt.kind, StatementKind::Insert);
    assert_eq!(stmt.shape, "Customer");
    assert_eq!(stmt.sql, "INSERT INTO Customer (Name, Email) VALUES (@Name, @Email)");
    assert_eq!(values(&stmt), vec![json!("Ann"), json!("a@x.com")]);

    let keys = stmt.key_parameters.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].column, "Id");
}

#[test]
fn insert_with_quoted_identifiers() {
    let config = BuilderConfig::new().dialect(
        Dialect::new()
            .quote("\"", "\"")
            .placeholder(Placeholder::named(":")),
    );
    let args = json!({"Name": "Ann"});
    let stmt = statements(config)
        .insert("Customer", Argument::from_json(&args).unwrap(), &UserContext::anonymous())
        .unwrap();
    assert_eq!(stmt.sql, r#"INSERT INTO "Customer" ("Name") VALUES (:Name)"#);
}

#[test]
fn insert_applies_audit_rule_over_user_value() {
    let rules = RuleSet::new().rule(ValueRule::audit_user(
        "UpdatedBy",
        &[OperationKind::Insert, OperationKind::Update],
    ));
    let args = json!({"Body": "hi", "UpdatedBy": "spoofed"});
    let stmt = statements(BuilderConfig::new())
        .with_rules(Arc::new(rules))
        .insert("Note", Argument::from_json(&args).unwrap(), &UserContext::user("u-1"))
        .unwrap();

    assert_eq!(stmt.sql, "INSERT INTO Note (Body, UpdatedBy) VALUES (@Body, @UpdatedBy)");
    assert_eq!(values(&stmt), vec![json!("hi"), json!("u-1")]);
}

// ==================== UPDATE ====================

#[test]
fn update_by_key_keeps_keys_last() {
    let args = json!({"Code": "A1", "Name": "Bolt", "Price": 3});
    let stmt = statements(positional())
        .update_by_key(
            "Product",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new(),
            &UserContext::anonymous(),
        )
        .unwrap();

    assert_eq!(stmt.kind, StatementKind::Update);
    assert_eq!(stmt.sql, "UPDATE Product SET Name = ?, Price = ? WHERE Code = ?");
    assert_eq!(values(&stmt), vec![json!("Bolt"), json!(3), json!("A1")]);
}

#[test]
fn update_changed_only() {
    let row = Tracked::new(CustomerRow {
        id: 42,
        name: "Ann".into(),
        email: Some("new@x.com".into()),
    })
    .changed("email");

    let stmt = statements(BuilderConfig::new())
        .update_by_key(
            "Customer",
            Argument::object(&row),
            WriteOptions::new().changed_only(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "UPDATE Customer SET Email = @Email WHERE Id = @Id_2");
    assert_eq!(names(&stmt), vec!["Email", "Id_2"]);
}

#[test]
fn update_by_key_positional_natural_binds_set_values_first() {
    let config = BuilderConfig::new().dialect(Dialect::new().placeholder(Placeholder::positional("?")));
    let args = json!({"Id": 7, "Name": "Ann"});
    let stmt = statements(config)
        .update_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "UPDATE Customer SET Name = ? WHERE Id = ?");
    assert_eq!(values(&stmt), vec![json!("Ann"), json!(7)]);
}

#[test]
fn update_changed_only_needs_tracking() {
    let args = json!({"Id": 1, "Name": "Ann"});
    let err = statements(BuilderConfig::new())
        .update_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new().changed_only(),
            &UserContext::anonymous(),
        )
        .unwrap_err();
    assert!(err.is_capability());
}

#[test]
fn update_without_values_is_refused() {
    let args = json!({"Id": 1});
    let err = statements(BuilderConfig::new())
        .update_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new(),
            &UserContext::anonymous(),
        )
        .unwrap_err();
    assert!(err.is_mapping());
}

#[test]
fn update_by_filter_separates_slots() {
    let values_arg = json!({"Name": "New"});
    let filter = json!({"Name": "Old"});
    let stmt = statements(BuilderConfig::new())
        .update_by_filter(
            "Customer",
            Argument::from_json(&values_arg).unwrap(),
            Argument::from_json(&filter).unwrap(),
            &UserContext::anonymous(),
        )
        .unwrap();

    assert_eq!(stmt.sql, "UPDATE Customer SET Name = @Name WHERE Name = @Name_2");
    assert_eq!(names(&stmt), vec!["Name", "Name_2"]);
    assert_eq!(values(&stmt), vec![json!("New"), json!("Old")]);
}

#[test]
fn update_by_filter_requires_a_predicate() {
    let values_arg = json!({"Name": "New"});
    let filter = json!({"Email": null});
    let err = statements(BuilderConfig::new().ignore_null_filter_properties())
        .update_by_filter(
            "Customer",
            Argument::from_json(&values_arg).unwrap(),
            Argument::from_json(&filter).unwrap(),
            &UserContext::anonymous(),
        )
        .unwrap_err();
    assert!(err.is_precondition());
}

// ==================== DELETE ====================

#[test]
fn hard_delete_by_key() {
    let args = json!({"Id": 42});
    let stmt = statements(BuilderConfig::new())
        .delete_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.kind, StatementKind::Delete);
    assert_eq!(stmt.sql, "DELETE FROM Customer WHERE Id = @Id");
    assert_eq!(values(&stmt), vec![json!(42)]);
}

#[test]
fn soft_delete_by_key() {
    let args = json!({"Id": 42, "Name": "ignored"});
    let stmt = soft_deleting(positional())
        .delete_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.kind, StatementKind::Update);
    assert_eq!(stmt.sql, "UPDATE Customer SET IsDeleted = ? WHERE Id = ?");
    assert_eq!(values(&stmt), vec![json!(true), json!(42)]);
}

#[test]
fn soft_delete_rule_needs_the_column() {
    let args = json!({"Code": "A1"});
    let stmt = soft_deleting(BuilderConfig::new())
        .delete_by_key(
            "Product",
            Argument::from_json(&args).unwrap(),
            WriteOptions::new(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "DELETE FROM Product WHERE Code = @Code");
}

#[test]
fn soft_delete_by_filter_orders_set_then_where() {
    let filter = json!({"Name": "Ann"});
    let stmt = soft_deleting(positional())
        .delete_by_filter(
            "Customer",
            Argument::from_json(&filter).unwrap(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "UPDATE Customer SET IsDeleted = ? WHERE Name = ?");
    assert_eq!(values(&stmt), vec![json!(true), json!("Ann")]);
}

#[test]
fn hard_delete_by_filter() {
    let filter = json!({"Name": "Ann", "Email": null});
    let stmt = statements(BuilderConfig::new())
        .delete_by_filter(
            "Customer",
            Argument::from_json(&filter).unwrap(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "DELETE FROM Customer WHERE Name = @Name AND Email IS NULL");
    assert_eq!(values(&stmt), vec![json!("Ann")]);

    let nulls = json!({"Email": null});
    let err = statements(BuilderConfig::new().ignore_null_filter_properties())
        .delete_by_filter(
            "Customer",
            Argument::from_json(&nulls).unwrap(),
            &UserContext::anonymous(),
        )
        .unwrap_err();
    assert!(err.is_precondition());
}

// ==================== SELECT ====================

#[test]
fn select_by_key_hides_deleted_rows() {
    let args = json!({"Id": 42});
    let statements = soft_deleting(BuilderConfig::new());
    let stmt = statements
        .select_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            &SelectSpec::new(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.kind, StatementKind::Select);
    assert_eq!(
        stmt.sql,
        "SELECT Id, Name, Email, IsDeleted FROM Customer WHERE Id = @Id AND IsDeleted <> @IsDeleted_2"
    );
    assert_eq!(names(&stmt), vec!["Id", "IsDeleted_2"]);
    assert_eq!(values(&stmt), vec![json!(42), json!(true)]);

    let stmt = statements
        .select_by_key(
            "Customer",
            Argument::from_json(&args).unwrap(),
            &SelectSpec::new().include_deleted(),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Id, Name, Email, IsDeleted FROM Customer WHERE Id = @Id");
}

#[test]
fn select_by_filter_with_columns_and_order() {
    let stmt = statements(BuilderConfig::new())
        .select_by_filter(
            "Customer",
            None,
            &SelectSpec::new()
                .columns(DesiredColumns::names(["Name"]))
                .order_by(SortSpec::parse("Name DESC").unwrap()),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Name FROM Customer ORDER BY Name DESC");
    assert!(stmt.parameters.is_empty());
}

#[test]
fn select_by_filter_positional_with_soft_delete() {
    let filter = json!({"Name": "Ann"});
    let stmt = soft_deleting(positional())
        .select_by_filter(
            "Customer",
            Some(Argument::from_json(&filter).unwrap()),
            &SelectSpec::new().columns(DesiredColumns::Auto),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Id FROM Customer WHERE Name = ? AND IsDeleted <> ?");
    assert_eq!(values(&stmt), vec![json!("Ann"), json!(true)]);
}

#[test]
fn select_by_filter_binds_in_placeholder_order() {
    let natural = BuilderConfig::new().dialect(Dialect::new().placeholder(Placeholder::positional("?")));
    let filter = json!({"Email": "a@x.com", "Name": "Ann"});
    let stmt = statements(natural)
        .select_by_filter(
            "Customer",
            Some(Argument::from_json(&filter).unwrap()),
            &SelectSpec::new().columns(DesiredColumns::Auto),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Id FROM Customer WHERE Name = ? AND Email = ?");
    assert_eq!(values(&stmt), vec![json!("Ann"), json!("a@x.com")]);

    let filter = json!({"Id": 7, "Name": "Ann"});
    let stmt = statements(positional())
        .select_by_filter(
            "Customer",
            Some(Argument::from_json(&filter).unwrap()),
            &SelectSpec::new().columns(DesiredColumns::Auto),
            &UserContext::anonymous(),
        )
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Id FROM Customer WHERE Name = ? AND Id = ?");
    assert_eq!(values(&stmt), vec![json!("Ann"), json!(7)]);
}

#[test]
fn insert_natural_key_positional_keys_last() {
    let args = json!({"Code": "A1", "Name": "Bolt", "Price": 3});
    let stmt = statements(positional())
        .insert("Product", Argument::from_json(&args).unwrap(), &UserContext::anonymous())
        .unwrap();
    assert_eq!(stmt.sql, "INSERT INTO Product (Name, Price, Code) VALUES (?, ?, ?)");
    assert_eq!(values(&stmt), vec![json!("Bolt"), json!(3), json!("A1")]);
}

#[test]
fn select_respects_read_restrictions() {
    let rules = RuleSet::new().restriction(
        Restriction::new("Email", RestrictionKinds::READ)
            .on_shape("Customer")
            .except_role("support"),
    );
    let statements = statements(BuilderConfig::new()).with_rules(Arc::new(rules));
    let spec = SelectSpec::new().columns(DesiredColumns::names(["Name", "Email"]));

    let stmt = statements
        .select_by_filter("Customer", None, &spec, &UserContext::user("u-1"))
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Name FROM Customer");

    let stmt = statements
        .select_by_filter(
            "Customer",
            None,
            &spec,
            &UserContext::user("u-2").with_role("support"),
        )
        .unwrap();
    assert_eq!(stmt.sql, "SELECT Name, Email FROM Customer");

    let only_email = SelectSpec::new().columns(DesiredColumns::names(["Email"]));
    let err = statements
        .select_by_filter("Customer", None, &only_email, &UserContext::user("u-1"))
        .unwrap_err();
    assert!(err.is_mapping());
}

#[test]
fn select_with_unknown_sort_column_fails() {
    let err = statements(BuilderConfig::new())
        .select_by_filter(
            "Customer",
            None,
            &SelectSpec::new().order_by(SortSpec::asc("Rank")),
            &UserContext::anonymous(),
        )
        .unwrap_err();
    assert!(err.is_mapping());
}

// ==================== Cache ====================

#[test]
fn templates_are_shared_across_builds() {
    let statements = statements(BuilderConfig::new());
    let args = json!({"Name": "Ann"});
    let user = UserContext::anonymous();
    for _ in 0..3 {
        statements
            .insert("customer", Argument::from_json(&args).unwrap(), &user)
            .unwrap();
    }
    assert_eq!(statements.cache().len(), 1);
    assert!(!statements
        .cache()
        .template("Customer")
        .unwrap()
        .get("Name")
        .unwrap()
        .has_value());
}

#[test]
fn unknown_shape_is_rejected() {
    let args = json!({"Name": "Ann"});
    let err = statements(BuilderConfig::new())
        .insert("Invoice", Argument::from_json(&args).unwrap(), &UserContext::anonymous())
        .unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn strict_config_rejects_unknown_keys() {
    let args = json!({"Name": "Ann", "Nickname": "A"});
    let err = statements(BuilderConfig::new().strict())
        .insert("Customer", Argument::from_json(&args).unwrap(), &UserContext::anonymous())
        .unwrap_err();
    assert!(err.is_mapping());
}
