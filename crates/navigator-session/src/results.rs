use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use navigator_core::traits::ResultsSink;

#[derive(Default)]
struct Inner {
    elements: Vec<serde_json::Value>,
    updates: usize,
    last_update: Option<DateTime<Utc>>,
}

/// In-memory results store shared by every execution.
///
/// Array payloads are merged element by element; `null` adds nothing; any
/// other payload is kept as a single element. Arrival order is preserved.
#[derive(Default)]
pub struct ResultsStore {
    inner: Mutex<Inner>,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> Vec<serde_json::Value> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elements
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elements
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of payloads merged since the last clear.
    pub fn updates(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .updates
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_update
    }
}

impl ResultsSink for ResultsStore {
    fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Inner::default();
    }

    fn update(&self, payload: serde_json::Value) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match payload {
            serde_json::Value::Array(items) => inner.elements.extend(items),
            serde_json::Value::Null => {}
            other => inner.elements.push(other),
        }
        inner.updates += 1;
        inner.last_update = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_merges_in_arrival_order() {
        let store = ResultsStore::new();
        store.update(json!([{"vertex": "a"}, {"vertex": "b"}]));
        store.update(json!({"vertex": "c"}));
        store.update(json!(null));

        let vertices: Vec<_> = store
            .elements()
            .iter()
            .map(|e| e["vertex"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(vertices, vec!["a", "b", "c"]);
        assert_eq!(store.updates(), 3);
        assert!(store.last_update().is_some());
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = ResultsStore::new();
        store.update(json!([1, 2]));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.updates(), 0);
        assert!(store.last_update().is_none());
    }
}
