//! Threshold conditions: decorators that gate action delivery on a
//! numeric channel reading.
//!
//! A condition is edge-triggered with a latch. The wrapped handler fires
//! exactly once when the predicate turns true (ARMED -> FIRED) and the
//! latch re-arms only after the predicate turns false again, so a
//! borderline analog reading cannot re-fire on every sample.

use super::handler::ActionHandler;
use super::{Action, Event};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Supplies the numeric reading a condition compares against.
///
/// `None` means the reading is currently invalid (sensor fault, value out
/// of the channel's physical range). `alternative` selects the secondary
/// value on dual-value channels (e.g. humidity on a humidity+temperature
/// channel).
pub trait ChannelValueSource: Send + Sync {
    fn reading(&self, alternative: bool) -> Option<f64>;
}

#[derive(Clone, Copy, Debug)]
enum Check {
    Less(f64),
    LessEq(f64),
    Greater(f64),
    GreaterEq(f64),
    Between(f64, f64),
    BetweenEq(f64, f64),
    Equal(f64),
    Invalid,
}

/// A comparison against a threshold (or range), plus the choice of
/// primary/alternative channel value.
#[derive(Clone, Copy, Debug)]
pub struct Condition {
    check: Check,
    use_alternative: bool,
}

impl Condition {
    pub fn on_less(threshold: f64) -> Self {
        Self::new(Check::Less(threshold))
    }

    pub fn on_less_eq(threshold: f64) -> Self {
        Self::new(Check::LessEq(threshold))
    }

    pub fn on_greater(threshold: f64) -> Self {
        Self::new(Check::Greater(threshold))
    }

    pub fn on_greater_eq(threshold: f64) -> Self {
        Self::new(Check::GreaterEq(threshold))
    }

    /// True for `low < value < high`.
    pub fn on_between(low: f64, high: f64) -> Self {
        Self::new(Check::Between(low, high))
    }

    /// True for `low <= value <= high`.
    pub fn on_between_eq(low: f64, high: f64) -> Self {
        Self::new(Check::BetweenEq(low, high))
    }

    pub fn on_equal(threshold: f64) -> Self {
        Self::new(Check::Equal(threshold))
    }

    /// Fires when the reading becomes invalid, regardless of value.
    pub fn on_invalid() -> Self {
        Self::new(Check::Invalid)
    }

    fn new(check: Check) -> Self {
        Self {
            check,
            use_alternative: false,
        }
    }

    /// Compare against the secondary channel value instead of the primary
    /// one.
    pub fn use_alternative_value(mut self) -> Self {
        self.use_alternative = true;
        self
    }

    pub fn uses_alternative(&self) -> bool {
        self.use_alternative
    }

    fn is_met(&self, reading: Option<f64>) -> bool {
        match (self.check, reading) {
            (Check::Invalid, None) => true,
            (Check::Invalid, Some(_)) => false,
            (_, None) => false,
            (Check::Less(t), Some(v)) => v < t,
            (Check::LessEq(t), Some(v)) => v <= t,
            (Check::Greater(t), Some(v)) => v > t,
            (Check::GreaterEq(t), Some(v)) => v >= t,
            (Check::Between(lo, hi), Some(v)) => v > lo && v < hi,
            (Check::BetweenEq(lo, hi), Some(v)) => v >= lo && v <= hi,
            (Check::Equal(t), Some(v)) => v == t,
        }
    }
}

/// Registry-owned handler wrapper applying a [`Condition`] before
/// forwarding to the real client. Only change notifications are
/// evaluated; every other event is ignored.
pub(crate) struct ConditionDecorator {
    condition: Condition,
    source: Arc<dyn ChannelValueSource>,
    client: Arc<dyn ActionHandler>,
    fired: AtomicBool,
}

impl ConditionDecorator {
    pub(crate) fn new(
        condition: Condition,
        source: Arc<dyn ChannelValueSource>,
        client: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            condition,
            source,
            client,
            fired: AtomicBool::new(false),
        }
    }
}

impl ActionHandler for ConditionDecorator {
    fn handle_action(&self, event: Event, action: Action) {
        if !matches!(event, Event::Change | Event::SecondaryChange) {
            return;
        }
        let reading = self.source.reading(self.condition.uses_alternative());
        let met = self.condition.is_met(reading);
        if met {
            if !self.fired.swap(true, Ordering::SeqCst) {
                self.client.handle_action(event, action);
            }
        } else {
            self.fired.store(false, Ordering::SeqCst);
        }
    }
}

/// Channel kinds with distinct reading-validity rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Thermometer,
    HumidityAndTemperature,
    Distance,
    Wind,
    Pressure,
    Rain,
    Weight,
    ImpulseCounter,
    DimmerBrightness,
    RgbBrightness,
    GeneralPurposeMeasurement,
    ContainerFillLevel,
}

impl ChannelKind {
    /// Applies the kind's validity predicate to a raw reading.
    /// `alternative` matters only for dual-value kinds.
    pub fn validate(self, raw: f64, alternative: bool) -> Option<f64> {
        let valid = match self {
            ChannelKind::Thermometer => raw >= -273.0,
            ChannelKind::HumidityAndTemperature => {
                if alternative {
                    raw >= 0.0
                } else {
                    raw >= -273.0
                }
            }
            ChannelKind::Distance
            | ChannelKind::Wind
            | ChannelKind::Pressure
            | ChannelKind::Rain
            | ChannelKind::Weight => raw >= 0.0,
            ChannelKind::ImpulseCounter => true,
            ChannelKind::DimmerBrightness | ChannelKind::RgbBrightness => {
                (0.0..=100.0).contains(&raw)
            }
            ChannelKind::GeneralPurposeMeasurement => !raw.is_nan(),
            ChannelKind::ContainerFillLevel => (0.0..=100.0).contains(&raw),
        };
        valid.then_some(raw)
    }
}

/// Ready-made source: a mutable reading validated through a
/// [`ChannelKind`] table. Sensors update it, conditions read it.
pub struct TypedValueSource {
    kind: ChannelKind,
    primary: parking_lot::Mutex<f64>,
    secondary: parking_lot::Mutex<f64>,
}

impl TypedValueSource {
    pub fn new(kind: ChannelKind, initial: f64) -> Self {
        Self {
            kind,
            primary: parking_lot::Mutex::new(initial),
            secondary: parking_lot::Mutex::new(initial),
        }
    }

    pub fn set(&self, value: f64) {
        *self.primary.lock() = value;
    }

    pub fn set_secondary(&self, value: f64) {
        *self.secondary.lock() = value;
    }
}

impl ChannelValueSource for TypedValueSource {
    fn reading(&self, alternative: bool) -> Option<f64> {
        let raw = if alternative {
            *self.secondary.lock()
        } else {
            *self.primary.lock()
        };
        self.kind.validate(raw, alternative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::registry::ActionRegistry;
    use parking_lot::Mutex;

    struct Recorder {
        calls: Mutex<Vec<(Event, Action)>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl ActionHandler for Recorder {
        fn handle_action(&self, event: Event, action: Action) {
            self.calls.lock().push((event, action));
        }
    }

    #[test]
    fn test_condition_fires_only_on_edge() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());
        let source = Arc::new(TypedValueSource::new(ChannelKind::Thermometer, 20.0));

        registry.add_conditional_action(
            trigger,
            Action::TurnOn,
            id,
            Event::Change,
            Condition::on_greater(25.0),
            source.clone(),
        );

        // below threshold, stays armed
        registry.run_action(trigger, Event::Change);
        assert!(handler.calls.lock().is_empty());

        // crosses threshold, fires once
        source.set(26.0);
        registry.run_action(trigger, Event::Change);
        registry.run_action(trigger, Event::Change);
        assert_eq!(handler.calls.lock().len(), 1);

        // drops below, re-arms, fires again on next crossing
        source.set(24.0);
        registry.run_action(trigger, Event::Change);
        source.set(30.0);
        registry.run_action(trigger, Event::Change);
        assert_eq!(handler.calls.lock().len(), 2);
    }

    #[test]
    fn test_condition_ignores_non_change_events() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());
        let source = Arc::new(TypedValueSource::new(ChannelKind::Thermometer, 30.0));

        registry.add_conditional_action(
            trigger,
            Action::TurnOn,
            id,
            Event::Press,
            Condition::on_greater(25.0),
            source,
        );

        registry.run_action(trigger, Event::Press);
        assert!(handler.calls.lock().is_empty());
    }

    #[test]
    fn test_on_invalid_fires_when_reading_invalid() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());
        let source = Arc::new(TypedValueSource::new(ChannelKind::Thermometer, 20.0));

        registry.add_conditional_action(
            trigger,
            Action::TurnOff,
            id,
            Event::Change,
            Condition::on_invalid(),
            source.clone(),
        );

        registry.run_action(trigger, Event::Change);
        assert!(handler.calls.lock().is_empty());

        source.set(-300.0); // below absolute zero, invalid for a thermometer
        registry.run_action(trigger, Event::Change);
        assert_eq!(handler.calls.lock().len(), 1);
    }

    #[test]
    fn test_between_variants() {
        let cond = Condition::on_between(10.0, 20.0);
        assert!(!cond.is_met(Some(10.0)));
        assert!(cond.is_met(Some(15.0)));
        assert!(!cond.is_met(Some(20.0)));

        let cond = Condition::on_between_eq(10.0, 20.0);
        assert!(cond.is_met(Some(10.0)));
        assert!(cond.is_met(Some(20.0)));
        assert!(!cond.is_met(Some(20.5)));
    }

    #[test]
    fn test_validity_table() {
        assert_eq!(ChannelKind::Thermometer.validate(-275.0, false), None);
        assert_eq!(ChannelKind::Thermometer.validate(21.5, false), Some(21.5));
        assert_eq!(ChannelKind::Distance.validate(-1.0, false), None);
        assert_eq!(ChannelKind::ContainerFillLevel.validate(101.0, false), None);
        assert_eq!(ChannelKind::ContainerFillLevel.validate(55.0, false), Some(55.0));
        assert_eq!(
            ChannelKind::HumidityAndTemperature.validate(-10.0, true),
            None
        );
        assert_eq!(
            ChannelKind::HumidityAndTemperature.validate(-10.0, false),
            Some(-10.0)
        );
        assert_eq!(
            ChannelKind::GeneralPurposeMeasurement.validate(f64::NAN, false),
            None
        );
    }

    #[test]
    fn test_alternative_value_selection() {
        let source = TypedValueSource::new(ChannelKind::HumidityAndTemperature, 21.0);
        source.set_secondary(45.0);
        assert_eq!(source.reading(false), Some(21.0));
        assert_eq!(source.reading(true), Some(45.0));
    }
}
