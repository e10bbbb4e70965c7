//! Generic storage records.

use serde_json::{Map, Value};

/// Store-assigned record identifier.
pub type RecordId = u64;

/// A schemaless document: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Field that carries the store-assigned id on every record an adapter returns.
pub const ID_FIELD: &str = "id";

/// Collection holding [`super::Student`] records.
pub const STUDENTS: &str = "students";

/// Collection holding [`super::Question`] records.
pub const QUESTIONS: &str = "questions";

/// Returns the store-assigned id of a record, if present.
#[must_use]
pub fn record_id(record: &Record) -> Option<RecordId> {
    record.get(ID_FIELD).and_then(Value::as_u64)
}

/// Returns a copy of `body` with `id` set as its id field.
#[must_use]
pub fn with_id(id: RecordId, body: &Record) -> Record {
    let mut record = body.clone();
    record.insert(ID_FIELD.to_string(), Value::from(id));
    record
}

/// Removes the id field from a record body before storing it.
pub fn strip_id(record: &mut Record) {
    record.remove(ID_FIELD);
}

/// Builds a record from a `serde_json::json!` object literal.
///
/// Non-object values produce an empty record.
#[must_use]
pub fn record_from(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
