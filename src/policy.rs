//! Alert policy table: which classes may speak, and what they say.
//!
//! Alerts are opt-in per class. A class name with no entry never produces an
//! utterance.

use anyhow::{anyhow, Result};
use std::collections::HashMap;

const DEFAULT_ENTRIES: [(&str, &str); 16] = [
    ("person", "Person ahead!"),
    ("car", "Vehicle ahead!"),
    ("bicycle", "Bicycle ahead!"),
    ("motorcycle", "Motorcycle ahead!"),
    ("bus", "Bus approaching!"),
    ("truck", "Truck ahead!"),
    ("train", "Train ahead!"),
    ("dog", "Dog ahead!"),
    ("cat", "Cat ahead!"),
    ("traffic light", "Traffic light detected!"),
    ("stop sign", "Stop sign detected!"),
    ("chair", "Chair ahead!"),
    ("couch", "Couch ahead!"),
    ("tv", "Television ahead!"),
    ("laptop", "Laptop detected!"),
    ("cell phone", "Cell phone ahead!"),
];

/// Immutable class-name to utterance mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertPolicy {
    entries: HashMap<String, String>,
}

impl AlertPolicy {
    /// Build a table from `(class_name, utterance)` pairs.
    ///
    /// Class names are trimmed; empty or duplicate names and empty utterances
    /// are rejected.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = HashMap::new();
        for (class_name, utterance) in entries {
            let class_name = class_name.as_ref().trim();
            let utterance = utterance.as_ref().trim();
            if class_name.is_empty() {
                return Err(anyhow!("alert policy class name must not be empty"));
            }
            if utterance.is_empty() {
                return Err(anyhow!(
                    "alert policy utterance for '{}' must not be empty",
                    class_name
                ));
            }
            if table
                .insert(class_name.to_string(), utterance.to_string())
                .is_some()
            {
                return Err(anyhow!("duplicate alert policy entry '{}'", class_name));
            }
        }
        Ok(Self { entries: table })
    }

    pub fn utterance_for(&self, class_name: &str) -> Option<&str> {
        self.entries.get(class_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
