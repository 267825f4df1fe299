//! Parameter automation timelines with Web Audio ramp semantics.

use super::ParamEvent;

/// Shape of the segment that ends at an [`AutomationEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Step to the value at the event time.
    Set,
    /// Straight line from the previous event.
    Linear,
    /// Exponential curve from the previous event.
    Exponential,
}

/// A point on a parameter timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationEvent {
    /// How the value travels to this point.
    pub shape: Shape,
    /// Value reached at `time`.
    pub value: f64,
    /// Absolute time in seconds.
    pub time: f64,
    /// Clock time when the event was scheduled; a ramp with no predecessor starts here.
    pub scheduled_at: f64,
}

/// Timeline of automation events for one parameter.
///
/// Events are kept sorted by time; events scheduled for the same instant keep
/// their insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct Automation {
    default: f64,
    events: Vec<AutomationEvent>,
}

impl Automation {
    /// Creates an empty timeline that reads `default` until the first event.
    pub fn new(default: f64) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    /// Scheduled events in time order.
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Value before any event takes effect.
    pub fn default_value(&self) -> f64 {
        self.default
    }

    /// Applies an event scheduled at clock time `now`.
    pub fn apply(&mut self, event: ParamEvent, now: f64) {
        let (shape, value, time) = match event {
            ParamEvent::SetValueAtTime { value, time } => (Shape::Set, value, time),
            ParamEvent::LinearRampToValueAtTime { value, end_time } => {
                (Shape::Linear, value, end_time)
            }
            ParamEvent::ExponentialRampToValueAtTime { value, end_time } => {
                (Shape::Exponential, value, end_time)
            }
            ParamEvent::CancelAndHoldAtTime { time } => {
                self.cancel_and_hold(time, now);
                return;
            }
        };
        self.insert(AutomationEvent {
            shape,
            value,
            time,
            scheduled_at: now,
        });
    }

    /// Value of the parameter at absolute time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut value = self.default;
        let mut last_time: Option<f64> = None;

        for event in &self.events {
            if event.time <= t {
                value = event.value;
                last_time = Some(event.time);
                continue;
            }

            let start = last_time.unwrap_or(event.scheduled_at.min(event.time));
            if t < start || event.time <= start {
                return value;
            }
            let progress = (t - start) / (event.time - start);
            return match event.shape {
                Shape::Set => value,
                Shape::Linear => value + (event.value - value) * progress,
                Shape::Exponential => {
                    // Undefined across zero or a sign change: hold until the end time.
                    if value == 0.0 || value.signum() != event.value.signum() {
                        value
                    } else {
                        value * (event.value / value).powf(progress)
                    }
                }
            };
        }
        value
    }

    fn insert(&mut self, event: AutomationEvent) {
        let at = self
            .events
            .iter()
            .position(|e| e.time > event.time)
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }

    fn cancel_and_hold(&mut self, time: f64, now: f64) {
        let held = self.value_at(time);
        self.events.retain(|e| e.time < time);
        self.insert(AutomationEvent {
            shape: Shape::Set,
            value: held,
            time,
            scheduled_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(value: f64, time: f64) -> ParamEvent {
        ParamEvent::SetValueAtTime { value, time }
    }

    #[test]
    fn test_default_until_first_event() {
        let mut a = Automation::new(0.5);
        a.apply(set(1.0, 2.0), 0.0);
        assert_eq!(a.value_at(1.0), 0.5);
        assert_eq!(a.value_at(2.0), 1.0);
        assert_eq!(a.value_at(10.0), 1.0);
    }

    #[test]
    fn test_linear_ramp_midpoint() {
        let mut a = Automation::new(0.0);
        a.apply(set(0.0, 1.0), 1.0);
        a.apply(
            ParamEvent::LinearRampToValueAtTime {
                value: 1.0,
                end_time: 2.0,
            },
            1.0,
        );
        assert!((a.value_at(1.5) - 0.5).abs() < 1e-12);
        assert_eq!(a.value_at(2.0), 1.0);
    }

    #[test]
    fn test_exponential_ramp_geometric_midpoint() {
        let mut a = Automation::new(1.0);
        a.apply(set(0.01, 0.0), 0.0);
        a.apply(
            ParamEvent::ExponentialRampToValueAtTime {
                value: 1.0,
                end_time: 1.0,
            },
            0.0,
        );
        assert!((a.value_at(0.5) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_ramp_from_zero_holds() {
        let mut a = Automation::new(0.0);
        a.apply(set(0.0, 0.0), 0.0);
        a.apply(
            ParamEvent::ExponentialRampToValueAtTime {
                value: 1.0,
                end_time: 1.0,
            },
            0.0,
        );
        assert_eq!(a.value_at(0.5), 0.0);
        assert_eq!(a.value_at(1.0), 1.0);
    }

    #[test]
    fn test_ramp_without_predecessor_starts_when_scheduled() {
        let mut a = Automation::new(0.0);
        a.apply(
            ParamEvent::LinearRampToValueAtTime {
                value: 1.0,
                end_time: 3.0,
            },
            2.0,
        );
        assert_eq!(a.value_at(1.0), 0.0);
        assert!((a.value_at(2.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cancel_and_hold_freezes_ramp() {
        let mut a = Automation::new(0.0);
        a.apply(set(0.0, 0.0), 0.0);
        a.apply(
            ParamEvent::LinearRampToValueAtTime {
                value: 1.0,
                end_time: 1.0,
            },
            0.0,
        );
        a.apply(ParamEvent::CancelAndHoldAtTime { time: 0.25 }, 0.25);
        assert!((a.value_at(0.25) - 0.25).abs() < 1e-12);
        assert!((a.value_at(5.0) - 0.25).abs() < 1e-12);
        assert_eq!(a.events().len(), 2);
    }

    #[test]
    fn test_same_time_events_keep_insertion_order() {
        let mut a = Automation::new(0.0);
        a.apply(set(1.0, 1.0), 0.0);
        a.apply(set(2.0, 1.0), 0.0);
        assert_eq!(a.value_at(1.0), 2.0);
    }
}
