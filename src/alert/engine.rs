use anyhow::{anyhow, Result};

use super::ledger::DebounceLedger;
use crate::detect::Detection;
use crate::labels::LabelResolver;
use crate::policy::AlertPolicy;

pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_COOLDOWN_SECS: f64 = 3.0;

/// Confidence gate and per-class cooldown.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlertSettings {
    /// Detections must score strictly above this to count.
    pub threshold: f32,
    /// Minimum spacing between two alerts for the same class.
    pub cooldown_secs: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl AlertSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(anyhow!(
                "alert threshold must be within [0, 1], got {}",
                self.threshold
            ));
        }
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(anyhow!(
                "alert cooldown must be a non-negative number of seconds, got {}",
                self.cooldown_secs
            ));
        }
        Ok(())
    }
}

/// A detection that cleared the confidence gate, with its resolved name.
#[derive(Clone, Debug, PartialEq)]
pub struct Sighting {
    pub class_id: i64,
    pub class_name: String,
    pub confidence: f32,
}

/// One utterance the voice sink should speak.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub class_name: String,
    pub text: String,
}

/// Result of dispatching one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dispatch {
    /// Every detection above threshold, in inference order.
    pub sightings: Vec<Sighting>,
    /// Alerts emitted this frame, in the order of their triggering detections.
    pub utterances: Vec<Utterance>,
}

/// Turns per-frame detections into debounced utterances.
///
/// The engine never blocks and never speaks; callers hand the returned
/// utterances to a voice sink. `now` is injected so cooldown behaviour does
/// not depend on a wall clock.
pub struct AlertEngine {
    settings: AlertSettings,
    labels: LabelResolver,
    policy: AlertPolicy,
    ledger: DebounceLedger,
}

impl AlertEngine {
    pub fn new(settings: AlertSettings, labels: LabelResolver, policy: AlertPolicy) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            labels,
            policy,
            ledger: DebounceLedger::new(),
        })
    }

    pub fn ledger(&self) -> &DebounceLedger {
        &self.ledger
    }

    /// Process one frame's detections at time `now` (seconds, monotonic).
    ///
    /// A negative or non-finite `now` suppresses every alert for the frame;
    /// sightings are still reported.
    pub fn dispatch(&mut self, detections: &[Detection], now: f64) -> Dispatch {
        let alerts_allowed = now.is_finite() && now >= 0.0;
        if !alerts_allowed {
            log::warn!("invalid frame timestamp {}, alerts suppressed", now);
        }

        let mut out = Dispatch::default();
        for detection in detections {
            if !self.passes_threshold(detection.confidence) {
                continue;
            }

            let class_name = self.labels.resolve(detection.class_id);
            out.sightings.push(Sighting {
                class_id: detection.class_id,
                class_name: class_name.to_string(),
                confidence: detection.confidence,
            });

            if !alerts_allowed {
                continue;
            }
            let Some(text) = self.policy.utterance_for(class_name) else {
                continue;
            };
            if !self.is_eligible(class_name, now) {
                continue;
            }

            // Recorded before the next detection is looked at, so a repeat of
            // the same class later in this frame falls inside the cooldown.
            self.ledger.set(class_name, now);
            out.utterances.push(Utterance {
                class_name: class_name.to_string(),
                text: text.to_string(),
            });
        }
        out
    }

    fn passes_threshold(&self, confidence: f32) -> bool {
        (0.0..=1.0).contains(&confidence) && confidence > self.settings.threshold
    }

    fn is_eligible(&self, class_name: &str, now: f64) -> bool {
        match self.ledger.get(class_name) {
            None => true,
            Some(last) => now - last > self.settings.cooldown_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Label ids used below: 0 person, 1 car, 2 dog, 3 giraffe.
    fn engine() -> AlertEngine {
        let labels = LabelResolver::from_text("person\ncar\ndog\ngiraffe");
        let policy = AlertPolicy::from_entries([
            ("person", "Person ahead!"),
            ("car", "Vehicle ahead!"),
            ("dog", "Dog ahead!"),
        ])
        .unwrap();
        AlertEngine::new(AlertSettings::default(), labels, policy).unwrap()
    }

    fn texts(dispatch: &Dispatch) -> Vec<&str> {
        dispatch.utterances.iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn person_scenario_respects_cooldown() {
        let mut engine = engine();

        let first = engine.dispatch(&[Detection::new(0, 0.9)], 0.0);
        assert_eq!(texts(&first), vec!["Person ahead!"]);
        assert_eq!(engine.ledger().get("person"), Some(0.0));

        let second = engine.dispatch(&[Detection::new(0, 0.95)], 1.0);
        assert!(second.utterances.is_empty());
        assert_eq!(second.sightings.len(), 1);
        assert_eq!(engine.ledger().get("person"), Some(0.0));

        let third = engine.dispatch(&[Detection::new(0, 0.6)], 3.1);
        assert_eq!(texts(&third), vec!["Person ahead!"]);
        assert_eq!(engine.ledger().get("person"), Some(3.1));
    }

    #[test]
    fn exactly_one_cooldown_later_is_still_suppressed() {
        let mut engine = engine();
        engine.dispatch(&[Detection::new(2, 0.9)], 10.0);
        assert!(engine
            .dispatch(&[Detection::new(2, 0.9)], 13.0)
            .utterances
            .is_empty());
        assert_eq!(
            texts(&engine.dispatch(&[Detection::new(2, 0.9)], 13.5)),
            vec!["Dog ahead!"]
        );
    }

    #[test]
    fn confidence_at_threshold_is_excluded() {
        let mut engine = engine();
        let out = engine.dispatch(&[Detection::new(2, 0.5)], 0.0);
        assert!(out.utterances.is_empty());
        assert!(out.sightings.is_empty());
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn classes_outside_policy_never_alert() {
        let mut engine = engine();
        for (i, now) in [0.0, 5.0, 100.0].into_iter().enumerate() {
            let out = engine.dispatch(&[Detection::new(3, 0.99)], now);
            assert!(out.utterances.is_empty(), "iteration {}", i);
            assert_eq!(out.sightings[0].class_name, "giraffe");
        }
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn out_of_range_class_id_is_unknown_and_silent() {
        let mut engine = engine();
        let out = engine.dispatch(&[Detection::new(999, 1.0), Detection::new(-4, 0.9)], 0.0);
        assert!(out.utterances.is_empty());
        assert_eq!(out.sightings.len(), 2);
        assert!(out.sightings.iter().all(|s| s.class_name == "unknown"));
    }

    #[test]
    fn same_class_twice_in_one_frame_alerts_once() {
        let mut engine = engine();
        let out = engine.dispatch(&[Detection::new(0, 0.7), Detection::new(0, 0.9)], 2.0);
        assert_eq!(texts(&out), vec!["Person ahead!"]);
        assert_eq!(out.sightings.len(), 2);
    }

    #[test]
    fn same_frame_dedupe_holds_with_zero_cooldown() {
        let labels = LabelResolver::from_text("person");
        let policy = AlertPolicy::from_entries([("person", "Person ahead!")]).unwrap();
        let settings = AlertSettings {
            cooldown_secs: 0.0,
            ..AlertSettings::default()
        };
        let mut engine = AlertEngine::new(settings, labels, policy).unwrap();

        let out = engine.dispatch(&[Detection::new(0, 0.9), Detection::new(0, 0.9)], 1.0);
        assert_eq!(out.utterances.len(), 1);
        let out = engine.dispatch(&[Detection::new(0, 0.9)], 1.001);
        assert_eq!(out.utterances.len(), 1);
    }

    #[test]
    fn utterances_follow_detection_order() {
        let mut engine = engine();
        let out = engine.dispatch(
            &[
                Detection::new(2, 0.8),
                Detection::new(3, 0.9),
                Detection::new(0, 0.7),
                Detection::new(1, 0.6),
            ],
            0.0,
        );
        assert_eq!(
            texts(&out),
            vec!["Dog ahead!", "Person ahead!", "Vehicle ahead!"]
        );
    }

    #[test]
    fn classes_are_throttled_independently() {
        let mut engine = engine();
        engine.dispatch(&[Detection::new(0, 0.9)], 0.0);
        let out = engine.dispatch(&[Detection::new(0, 0.9), Detection::new(1, 0.9)], 1.0);
        assert_eq!(texts(&out), vec!["Vehicle ahead!"]);
    }

    #[test]
    fn invalid_confidence_is_ignored() {
        let mut engine = engine();
        let out = engine.dispatch(
            &[
                Detection::new(0, 1.5),
                Detection::new(0, f32::NAN),
                Detection::new(0, -0.2),
            ],
            0.0,
        );
        assert_eq!(out, Dispatch::default());
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn invalid_timestamps_suppress_alerts() {
        let mut engine = engine();
        for now in [-1.0, f64::NAN, f64::INFINITY] {
            let out = engine.dispatch(&[Detection::new(0, 0.9)], now);
            assert!(out.utterances.is_empty());
            assert_eq!(out.sightings.len(), 1);
        }
        assert!(engine.ledger().is_empty());

        // A valid frame afterwards alerts normally.
        assert_eq!(engine.dispatch(&[Detection::new(0, 0.9)], 0.5).utterances.len(), 1);
    }

    #[test]
    fn settings_are_validated() {
        let bad_threshold = AlertSettings {
            threshold: 1.2,
            ..AlertSettings::default()
        };
        assert!(bad_threshold.validate().is_err());

        let bad_cooldown = AlertSettings {
            cooldown_secs: -1.0,
            ..AlertSettings::default()
        };
        assert!(bad_cooldown.validate().is_err());

        assert!(AlertSettings::default().validate().is_ok());
    }
}
