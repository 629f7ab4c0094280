//! The record delivered to handlers

use super::identifier::{IdValue, Identifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// One externally-produced record.
///
/// A record without a payload is a deletion. Identifiers are a set, so
/// duplicates collapse on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    ids: BTreeSet<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Record {
    pub fn new(ids: impl IntoIterator<Item = Identifier>, payload: impl Into<Value>) -> Self {
        let payload = match payload.into() {
            Value::Null => None,
            v => Some(v),
        };
        Self {
            ids: ids.into_iter().collect(),
            payload,
        }
    }

    /// A record announcing that the identified entity no longer exists.
    pub fn deleted(ids: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            payload: None,
        }
    }

    pub fn ids(&self) -> &BTreeSet<Identifier> {
        &self.ids
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn is_deleted(&self) -> bool {
        self.payload.is_none()
    }

    /// Value of the first identifier of type `kind`, if any.
    pub fn id_of(&self, kind: &str) -> Option<&IdValue> {
        self.ids
            .iter()
            .find(|id| id.kind() == kind)
            .map(Identifier::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_payload_means_deleted() {
        let record = Record::deleted([Identifier::new("f", 1)]);
        assert!(record.is_deleted());
        assert!(record.payload().is_none());

        let record = Record::new([Identifier::new("f", 1)], Value::Null);
        assert!(record.is_deleted());
    }

    #[test]
    fn payload_means_present() {
        let record = Record::new([Identifier::new("f", 1)], json!({"name": "abc"}));
        assert!(!record.is_deleted());
        assert_eq!(record.payload(), Some(&json!({"name": "abc"})));
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let record = Record::new(
            [
                Identifier::new("1", 2),
                Identifier::new("1", 2),
                Identifier::new("1", 3),
                Identifier::new("1", 3),
                Identifier::new("2", 3),
                Identifier::new("2", 3),
            ],
            "x",
        );
        let expected: BTreeSet<_> = [
            Identifier::new("1", 2),
            Identifier::new("1", 3),
            Identifier::new("2", 3),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.ids(), &expected);
    }

    #[test]
    fn id_of_finds_by_type() {
        let record = Record::new(
            [Identifier::new("email", "a@b.c"), Identifier::new("f", "a")],
            "abc",
        );
        assert_eq!(record.id_of("f"), Some(&IdValue::Str("a".into())));
        assert_eq!(record.id_of("missing"), None);
    }

    #[test]
    fn null_payload_deserializes_as_deleted() {
        let record: Record =
            serde_json::from_value(json!({"ids": [{"type": "f", "value": "d"}], "payload": null}))
                .unwrap();
        assert!(record.is_deleted());

        let record: Record =
            serde_json::from_value(json!({"ids": [{"type": "f", "value": "d"}]})).unwrap();
        assert!(record.is_deleted());
    }

    #[test]
    fn serde_shape() {
        let record = Record::new([Identifier::new("f", "a")], "abc");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            json!({"ids": [{"type": "f", "value": "a"}], "payload": "abc"})
        );
        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn missing_ids_is_rejected() {
        let err = serde_json::from_value::<Record>(json!({"payload": 1})).unwrap_err();
        assert!(err.to_string().contains("missing field `ids`"));
    }
}
