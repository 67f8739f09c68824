//! Alert dispatch: confidence gate, policy lookup and per-class debounce.

mod engine;
mod ledger;

pub use engine::{
    AlertEngine, AlertSettings, Dispatch, Sighting, Utterance, DEFAULT_COOLDOWN_SECS,
    DEFAULT_THRESHOLD,
};
pub use ledger::DebounceLedger;
