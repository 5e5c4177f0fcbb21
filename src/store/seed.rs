//! Built-in starter dataset.
//!
//! A fresh office gets a small seeded book so every screen has something to
//! show before the first real record is entered. The dataset is embedded at
//! compile time and parsed once; both store backends copy from it when a
//! collection is read for the first time with nothing persisted yet.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::Value;

use crate::error::StoreError;
use crate::store::Collection;

static STARTER: LazyLock<Result<HashMap<&'static str, Vec<Value>>, String>> =
    LazyLock::new(|| parse_starter(include_str!("starter_records.json")));

fn parse_starter(raw: &str) -> Result<HashMap<&'static str, Vec<Value>>, String> {
    let parsed: Value =
        serde_json::from_str(raw).map_err(|e| format!("invalid starter JSON: {e}"))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| "starter dataset root must be an object".to_string())?;

    let mut out = HashMap::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        let records = object
            .get(collection.as_str())
            .and_then(Value::as_array)
            .ok_or_else(|| format!("starter dataset is missing '{}'", collection))?;
        for record in records {
            if record.get("id").and_then(Value::as_str).is_none() {
                return Err(format!("a starter record in '{}' has no id", collection));
            }
        }
        out.insert(collection.as_str(), records.clone());
    }
    Ok(out)
}

/// Starter records for one collection, newest first.
pub fn starter_records(collection: Collection) -> Result<Vec<Value>, StoreError> {
    match &*STARTER {
        Ok(map) => Ok(map
            .get(collection.as_str())
            .cloned()
            .unwrap_or_default()),
        Err(message) => Err(StoreError::Seed(message.clone())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::starter_records;
    use crate::store::Collection;

    #[test]
    fn every_collection_has_starter_records() {
        for collection in Collection::ALL {
            let records = starter_records(collection).expect("starter dataset parses");
            assert!(
                !records.is_empty(),
                "collection '{}' should ship starter records",
                collection
            );
        }
    }

    #[test]
    fn seeded_cases_reference_seeded_clients() {
        let clients = starter_records(Collection::Clients).expect("clients parse");
        let cases = starter_records(Collection::Cases).expect("cases parse");

        let client_ids: Vec<&str> = clients
            .iter()
            .filter_map(|c| c.get("id").and_then(Value::as_str))
            .collect();

        for case in &cases {
            let client_id = case
                .get("clientId")
                .and_then(Value::as_str)
                .expect("case has clientId");
            assert!(
                client_ids.contains(&client_id),
                "case {:?} references unknown client {client_id}",
                case.get("caseNumber")
            );
        }
    }

    #[test]
    fn seeded_invoices_reference_seeded_clients() {
        let clients = starter_records(Collection::Clients).expect("clients parse");
        let invoices = starter_records(Collection::Invoices).expect("invoices parse");

        let client_ids: Vec<&str> = clients
            .iter()
            .filter_map(|c| c.get("id").and_then(Value::as_str))
            .collect();

        for invoice in &invoices {
            let client_id = invoice
                .get("clientId")
                .and_then(Value::as_str)
                .expect("invoice has clientId");
            assert!(client_ids.contains(&client_id));
        }
    }
}
