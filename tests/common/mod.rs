//! Shared fixtures for the migration integration tests

use regmigrate::store::{
    EventRow, RegistrationDataRow, RegistrationFieldOptionRow, RegistrationFieldRow,
    RegistrationRow, Store, Transaction,
};
use serde_json::json;

pub fn event(id: &str, name: &str) -> EventRow {
    EventRow {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(format!("{name} Description")),
        link: None,
        image_url: None,
        event_display_rank: None,
        fields: json!({}),
    }
}

pub fn registration(id: &str, event_id: &str, user_id: &str) -> RegistrationRow {
    RegistrationRow {
        id: id.to_string(),
        event_id: event_id.to_string(),
        user_id: user_id.to_string(),
        data: json!({}),
    }
}

pub fn field(
    id: &str,
    event_id: &str,
    name: &str,
    field_type: &str,
    rank: Option<i64>,
) -> RegistrationFieldRow {
    RegistrationFieldRow {
        id: id.to_string(),
        event_id: event_id.to_string(),
        name: name.to_string(),
        description: None,
        field_type: field_type.to_string(),
        field_display_rank: rank,
        required: true,
        for_user: true,
        character_limit: None,
    }
}

pub fn field_option(id: &str, field_id: &str, value: &str) -> RegistrationFieldOptionRow {
    RegistrationFieldOptionRow {
        id: id.to_string(),
        registration_field_id: field_id.to_string(),
        value: value.to_string(),
    }
}

pub fn answer(
    id: &str,
    registration_id: Option<&str>,
    field_id: Option<&str>,
    value: &str,
) -> RegistrationDataRow {
    RegistrationDataRow {
        id: id.to_string(),
        registration_id: registration_id.map(str::to_string),
        registration_field_id: field_id.map(str::to_string),
        value: value.to_string(),
    }
}

/// Seed a store in one committed transaction.
pub fn seed(store: &Store, build: impl FnOnce(&mut Transaction<'_>)) {
    let mut tx = store.begin();
    build(&mut tx);
    tx.commit().expect("seeding commit failed");
}
