//! Mirror consumer: stages a run's records and commits them to a store
//!
//! Changes are only applied once the whole sequence has been seen, so a
//! failed import leaves the store untouched.

use super::store::MirrorStore;
use crate::error::{ImportError, ValidationError};
use crate::handler::GeneratorHandler;
use crate::inversion::{ControllerConfig, Feeder};
use crate::operation::{ImportKind, ImportOperation, OperationInfo};
use crate::pipeline::StartedSubscriber;
use crate::record::Record;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Build the consumer loop that mirrors one run into `store`.
///
/// - FULL_SYNC: the store ends up holding exactly the run's live records.
/// - PARTIAL_UPDATE: deletions are removed and live records upserted.
///
/// A record lacking the store's key identifier fails the run.
pub fn mirror_consumer(
    store: Arc<MirrorStore>,
) -> impl FnOnce(OperationInfo, Feeder<Record>) -> Result<(), ImportError> + Send + 'static {
    move |info, records| {
        let mut updates: HashMap<String, Value> = HashMap::new();
        let mut removals: HashSet<String> = HashSet::new();

        for record in &records {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(operation = %info.id, error = %e, "import failed, discarding staged changes");
                    return Ok(());
                }
            };

            let key = record
                .id_of(store.key_type())
                .ok_or_else(|| ValidationError::MissingIdentifier(store.key_type().to_string()))?
                .to_string();

            match record.payload() {
                None => {
                    updates.remove(&key);
                    removals.insert(key);
                }
                Some(payload) => {
                    removals.remove(&key);
                    updates.insert(key, payload.clone());
                }
            }

            records.suspend()?;
        }

        tracing::debug!(
            operation = %info.id,
            kind = %info.kind,
            updates = updates.len(),
            removals = removals.len(),
            "committing mirror"
        );
        match info.kind {
            ImportKind::FullSync => store.replace_all(updates),
            ImportKind::PartialUpdate => store.apply(removals, updates),
        }
        Ok(())
    }
}

/// Attaches a mirroring [`GeneratorHandler`] to every operation of one record type.
pub struct MirrorSubscriber {
    store: Arc<MirrorStore>,
    record_type: String,
    controller: ControllerConfig,
    name: String,
}

impl MirrorSubscriber {
    pub fn new(store: Arc<MirrorStore>, record_type: impl Into<String>) -> Self {
        let record_type = record_type.into();
        Self {
            name: format!("mirror({})", record_type),
            store,
            record_type,
            controller: ControllerConfig::default(),
        }
    }

    /// Settings for the consumer threads of attached handlers
    pub fn with_controller(mut self, config: ControllerConfig) -> Self {
        self.controller = config;
        self
    }
}

impl StartedSubscriber for MirrorSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_import_started(&self, op: &mut ImportOperation) -> Result<(), ImportError> {
        if op.record_type() != self.record_type {
            return Ok(());
        }

        let handler = GeneratorHandler::with_config(
            op,
            self.controller.clone(),
            mirror_consumer(self.store.clone()),
        )?
        .named(self.name.clone());
        op.attach_handler(Arc::new(handler));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ImportHandler;
    use crate::record::Identifier;
    use serde_json::json;

    fn live(key: &str, payload: &str) -> Record {
        Record::new([Identifier::new("f", key)], payload)
    }

    fn gone(key: &str) -> Record {
        Record::deleted([Identifier::new("f", key)])
    }

    async fn run(store: &Arc<MirrorStore>, kind: ImportKind, records: Vec<Record>) {
        let op = ImportOperation::new("foo", kind);
        let handler = GeneratorHandler::new(&op, mirror_consumer(store.clone())).unwrap();
        for record in &records {
            handler.on_record_available(&op, record).await.unwrap();
        }
        handler.on_import_finished(&op).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_sync_replaces_everything() {
        let store = Arc::new(MirrorStore::with_entries(
            "f",
            [("old".to_string(), json!("x"))].into_iter().collect(),
        ));

        run(
            &store,
            ImportKind::FullSync,
            vec![live("a", "abc"), live("d", "def"), gone("z")],
        )
        .await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"], json!("abc"));
        assert_eq!(snapshot["d"], json!("def"));
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_mentioned() {
        let store = Arc::new(MirrorStore::with_entries(
            "f",
            [
                ("a".to_string(), json!("abc")),
                ("d".to_string(), json!("def")),
            ]
            .into_iter()
            .collect(),
        ));

        run(
            &store,
            ImportKind::PartialUpdate,
            vec![gone("d"), live("g", "ghi")],
        )
        .await;

        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a", "g"]);
    }

    #[tokio::test]
    async fn test_later_record_wins_within_a_run() {
        let store = Arc::new(MirrorStore::new("f"));
        run(
            &store,
            ImportKind::PartialUpdate,
            vec![live("a", "one"), gone("a"), live("b", "x"), live("b", "y")],
        )
        .await;

        assert!(!store.contains("a"));
        assert_eq!(store.get("b"), Some(json!("y")));
    }

    #[tokio::test]
    async fn test_failed_import_leaves_store_untouched() {
        let store = Arc::new(MirrorStore::with_entries(
            "f",
            [("a".to_string(), json!("abc"))].into_iter().collect(),
        ));
        let op = ImportOperation::new("foo", ImportKind::FullSync);
        let handler = GeneratorHandler::new(&op, mirror_consumer(store.clone())).unwrap();

        handler
            .on_record_available(&op, &live("m", "mno"))
            .await
            .unwrap();
        handler.on_import_failed(&op).await.unwrap();

        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.get("a"), Some(json!("abc")));
    }

    #[tokio::test]
    async fn test_missing_key_fails_the_handler() {
        let store = Arc::new(MirrorStore::new("f"));
        let op = ImportOperation::new("foo", ImportKind::FullSync);
        let handler = GeneratorHandler::new(&op, mirror_consumer(store.clone())).unwrap();

        let record = Record::new([Identifier::new("email", "a@b.c")], "x");
        let err = handler.on_record_available(&op, &record).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation(ValidationError::MissingIdentifier(ref t)) if t == "f"
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_subscriber_ignores_other_record_types() {
        let store = Arc::new(MirrorStore::new("f"));
        let subscriber = MirrorSubscriber::new(store, "foo");

        let mut other = ImportOperation::new("bar", ImportKind::FullSync);
        subscriber.on_import_started(&mut other).unwrap();
        assert!(other.handlers().is_empty());

        let mut ours = ImportOperation::new("foo", ImportKind::FullSync);
        subscriber.on_import_started(&mut ours).unwrap();
        assert_eq!(ours.handlers().len(), 1);
        assert_eq!(ours.handlers()[0].name(), "mirror(foo)");
    }
}
