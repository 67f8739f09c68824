use std::collections::HashMap;

/// Per-class time of the last emitted alert, in seconds on the drive loop's
/// monotonic clock.
///
/// Written only by the dispatch engine, once per emitted alert. Entries are
/// never removed during a run; the key set is bounded by the policy table.
#[derive(Clone, Debug, Default)]
pub struct DebounceLedger {
    last_alert: HashMap<String, f64>,
}

impl DebounceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class_name: &str) -> Option<f64> {
        self.last_alert.get(class_name).copied()
    }

    pub fn set(&mut self, class_name: &str, timestamp: f64) {
        match self.last_alert.get_mut(class_name) {
            Some(last) => *last = timestamp,
            None => {
                self.last_alert.insert(class_name.to_string(), timestamp);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.last_alert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alert.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_created_on_first_set_and_overwritten_after() {
        let mut ledger = DebounceLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.get("person"), None);

        ledger.set("person", 0.0);
        assert_eq!(ledger.get("person"), Some(0.0));

        ledger.set("person", 3.1);
        assert_eq!(ledger.get("person"), Some(3.1));
        assert_eq!(ledger.len(), 1);

        ledger.set("dog", 1.0);
        assert_eq!(ledger.len(), 2);
    }
}
