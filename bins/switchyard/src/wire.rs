use serde::{Deserialize, Serialize};

use switchyard_api::record::Record;

/// One NDJSON line on stdin/stdout. Payloads are schemaless.
#[derive(Debug, Deserialize, Serialize)]
pub struct WireRecord {
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub key: serde_json::Value,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl From<WireRecord> for Record {
    fn from(wire: WireRecord) -> Self {
        let mut record = Record::new(wire.destination, wire.key, wire.value);
        if let Some(partition) = wire.partition {
            record = record.with_partition(partition);
        }
        if let Some(timestamp) = wire.timestamp {
            record = record.with_timestamp(timestamp);
        }
        record
    }
}

impl From<&Record> for WireRecord {
    fn from(record: &Record) -> Self {
        Self {
            destination: record.destination().to_string(),
            partition: record.partition(),
            timestamp: record.timestamp(),
            key: record.key().to_json(),
            value: record.value().to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_optional_fields_default() {
        let wire: WireRecord = serde_json::from_str(r#"{"destination":"t"}"#).unwrap();
        let record = Record::from(wire);
        assert_eq!(record.destination(), "t");
        assert_eq!(record.partition(), None);
        assert!(record.key().is_null());
        assert!(record.value().is_null());
    }

    #[test]
    fn test_output_omits_unset_metadata() {
        let record = Record::new("t", json!(null), json!({"a": 1})).with_partition(2);
        let line = serde_json::to_value(WireRecord::from(&record)).unwrap();
        assert_eq!(
            line,
            json!({"destination": "t", "partition": 2, "key": null, "value": {"a": 1}})
        );
    }
}
