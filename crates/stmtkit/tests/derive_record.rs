#![allow(dead_code)]

use serde::Serialize;
use serde_json::json;
use stmtkit::{PropertyInfo, Record, Tracked};

#[derive(Serialize, Record)]
#[orm(rename_all = "PascalCase")]
struct Customer {
    #[orm(key)]
    id: i64,
    first_name: String,
    #[orm(column = "EmailAddress")]
    email: Option<String>,
    #[orm(ignore_update)]
    created_by: String,
    #[orm(write_only)]
    password_hash: String,
    #[orm(skip)]
    cached_label: String,
}

#[derive(Serialize, Record)]
struct Plain {
    r#type: String,
    #[orm(ignore_insert, ignore_update)]
    version: i32,
}

fn customer() -> Customer {
    Customer {
        id: 7,
        first_name: "Ann".into(),
        email: None,
        created_by: "seed".into(),
        password_hash: "x".into(),
        cached_label: "Ann <none>".into(),
    }
}

#[test]
fn properties_follow_attributes() {
    let props = Customer::properties();
    assert_eq!(props.len(), 6);
    assert_eq!(props[0], PropertyInfo::new("id", "Id").key());
    assert_eq!(props[1], PropertyInfo::new("first_name", "FirstName"));
    assert_eq!(props[2], PropertyInfo::new("email", "EmailAddress"));
    assert_eq!(props[3], PropertyInfo::new("created_by", "CreatedBy").ignore_on_update());
    assert_eq!(props[4], PropertyInfo::new("password_hash", "PasswordHash").write_only());
    assert_eq!(props[5], PropertyInfo::unmapped("cached_label"));
}

#[test]
fn property_values_are_serialized() {
    let c = customer();
    assert_eq!(c.property_value("id").unwrap(), Some(json!(7)));
    assert_eq!(c.property_value("first_name").unwrap(), Some(json!("Ann")));
    assert_eq!(c.property_value("email").unwrap(), Some(json!(null)));
    assert_eq!(c.property_value("password_hash").unwrap(), None);
    assert_eq!(c.property_value("cached_label").unwrap(), None);
    assert_eq!(c.property_value("missing").unwrap(), None);
    assert!(c.changed_properties().is_none());
}

#[test]
fn raw_identifiers_and_flag_lists() {
    let props = Plain::properties();
    assert_eq!(props[0], PropertyInfo::new("type", "type"));
    assert!(props[1].ignore_on_insert && props[1].ignore_on_update);

    let p = Plain {
        r#type: "a".into(),
        version: 3,
    };
    assert_eq!(p.property_value("type").unwrap(), Some(json!("a")));
}

#[test]
fn tracked_reports_changes() {
    let mut tracked = Tracked::new(customer());
    tracked.get_mut().first_name = "Bea".into();
    tracked.mark_changed("first_name");
    tracked.mark_changed("first_name");

    assert_eq!(tracked.changed_properties(), Some(vec!["first_name".to_string()]));
    assert_eq!(tracked.property_value("first_name").unwrap(), Some(json!("Bea")));
    tracked.reset();
    assert_eq!(tracked.changed_properties(), Some(Vec::new()));
}
