use crate::types::Record;

/// Builds `count` records of the form `{"id":<n>}` with ids starting at zero.
pub fn numbered_records(count: u64) -> Vec<Record> {
    (0..count).map(numbered_record).collect()
}

/// Builds a single `{"id":<id>}` record.
pub fn numbered_record(id: u64) -> Record {
    Record::new(format!(r#"{{"id":{id}}}"#))
}

/// Reads the `id` field of a record built with [`numbered_record`].
pub fn record_id(record: &Record) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(record.as_str()).ok()?;
    value.get("id")?.as_u64()
}
