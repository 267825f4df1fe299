//! Node controls: declarations, values, and validation.
//!
//! Each kind declares its controls as a static table of [`ControlSpec`]s. A
//! node stores one [`ControlValue`] per declared control, validated on every
//! write, so build functions can read them without re-checking.

use serde_json::{Map, Value, json};

use crate::error::ValidationError;
use crate::voice::{KeyCode, VoiceProfile};

use super::NodeKind;

/// Value domain of a control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlKind {
    /// Finite number in `[min, max]`.
    Number {
        /// Value for new nodes and absent document fields.
        default: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// One of a fixed set of names.
    Choice {
        /// Value for new nodes.
        default: &'static str,
        /// Allowed names.
        options: &'static [&'static str],
    },
    /// A key code from the physical layout.
    Key {
        /// Value for new nodes.
        default: &'static str,
    },
    /// An ADSR voice profile.
    Profile,
}

/// Static declaration of one control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlSpec {
    /// Persisted data key.
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Value domain.
    pub value: ControlKind,
    /// Whether the control can be ramped in place on a running graph.
    pub live: bool,
}

impl ControlSpec {
    /// Unbounded number.
    pub const fn number(key: &'static str, label: &'static str, default: f64) -> Self {
        Self::ranged(key, label, default, f64::MIN, f64::MAX)
    }

    /// Number restricted to `[min, max]`.
    pub const fn ranged(
        key: &'static str,
        label: &'static str,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            key,
            label,
            value: ControlKind::Number { default, min, max },
            live: false,
        }
    }

    /// Enumerated choice.
    pub const fn choice(
        key: &'static str,
        label: &'static str,
        default: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            value: ControlKind::Choice { default, options },
            live: false,
        }
    }

    /// Key code from the physical layout.
    pub const fn key_code(key: &'static str, label: &'static str, default: &'static str) -> Self {
        Self {
            key,
            label,
            value: ControlKind::Key { default },
            live: false,
        }
    }

    /// ADSR voice profile.
    pub const fn profile(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            value: ControlKind::Profile,
            live: false,
        }
    }

    /// Marks the control as adjustable on a running graph.
    pub const fn live(mut self) -> Self {
        self.live = true;
        self
    }

    /// Default value.
    pub fn default_value(&self) -> ControlValue {
        match self.value {
            ControlKind::Number { default, .. } => ControlValue::Number(default),
            ControlKind::Choice { default, .. } | ControlKind::Key { default } => {
                ControlValue::Choice(default.to_string())
            }
            ControlKind::Profile => ControlValue::Profile(VoiceProfile::default()),
        }
    }

    /// Clamps a number into this control's domain. Non-numeric controls pass through.
    pub fn clamp(&self, value: f64) -> f64 {
        match self.value {
            ControlKind::Number { min, max, .. } => value.clamp(min, max),
            _ => value,
        }
    }

    /// Checks a value against the domain.
    pub fn validate(&self, kind: NodeKind, value: &ControlValue) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::new(kind, self.key, reason);
        match (self.value, value) {
            (ControlKind::Number { min, max, .. }, ControlValue::Number(v)) => {
                if !v.is_finite() {
                    return Err(invalid(format!("{v} is not a finite number")));
                }
                if *v < min || *v > max {
                    return Err(invalid(format!("{v} is outside [{min}, {max}]")));
                }
                Ok(())
            }
            (ControlKind::Choice { options, .. }, ControlValue::Choice(name)) => {
                if options.contains(&name.as_str()) {
                    Ok(())
                } else {
                    Err(invalid(format!(
                        "'{name}' is not one of {}",
                        options.join(", ")
                    )))
                }
            }
            (ControlKind::Key { .. }, ControlValue::Choice(name)) => KeyCode::parse(name)
                .map(|_| ())
                .ok_or_else(|| invalid(format!("'{name}' is not a key on the layout"))),
            (ControlKind::Profile, ControlValue::Profile(profile)) => {
                profile.validate().map_err(invalid)
            }
            (_, other) => Err(invalid(format!("unexpected value {other:?}"))),
        }
    }

    /// Reads a persisted JSON value.
    fn parse_json(&self, kind: NodeKind, raw: &Value) -> Result<ControlValue, ValidationError> {
        let invalid = |reason: String| ValidationError::new(kind, self.key, reason);
        let value = match self.value {
            ControlKind::Number { .. } => match raw {
                Value::Number(n) => ControlValue::Number(n.as_f64().unwrap_or(f64::NAN)),
                // Older documents store numbers as strings.
                Value::String(s) => ControlValue::Number(
                    s.trim()
                        .parse::<f64>()
                        .map_err(|_| invalid(format!("'{s}' is not a number")))?,
                ),
                other => return Err(invalid(format!("expected a number, found {other}"))),
            },
            ControlKind::Choice { .. } | ControlKind::Key { .. } => match raw {
                Value::String(s) => ControlValue::Choice(s.clone()),
                other => return Err(invalid(format!("expected a string, found {other}"))),
            },
            ControlKind::Profile => ControlValue::Profile(
                serde_json::from_value(raw.clone()).map_err(|e| invalid(e.to_string()))?,
            ),
        };
        self.validate(kind, &value)?;
        Ok(value)
    }
}

/// Current value of one control.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    /// Scalar.
    Number(f64),
    /// Enumerated name or key code.
    Choice(String),
    /// Voice profile.
    Profile(VoiceProfile),
}

impl ControlValue {
    /// The scalar, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The name, if this is a choice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// The profile, if this is one.
    pub fn as_profile(&self) -> Option<&VoiceProfile> {
        match self {
            Self::Profile(p) => Some(p),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            // Integral values are written as integers so hand-written documents round-trip.
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => json!(*v as i64),
            Self::Number(v) => json!(v),
            Self::Choice(s) => json!(s),
            Self::Profile(p) => serde_json::to_value(p).unwrap_or(Value::Null),
        }
    }
}

impl From<f64> for ControlValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ControlValue {
    fn from(s: &str) -> Self {
        Self::Choice(s.to_string())
    }
}

impl From<VoiceProfile> for ControlValue {
    fn from(p: VoiceProfile) -> Self {
        Self::Profile(p)
    }
}

/// Validated control values of one node, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Controls {
    kind: NodeKind,
    values: Vec<ControlValue>,
}

impl Controls {
    /// Default values for `kind`.
    pub fn defaults(kind: NodeKind) -> Self {
        Self {
            kind,
            values: kind.controls().iter().map(ControlSpec::default_value).collect(),
        }
    }

    /// Reads a persisted data bag. Absent fields take their defaults and
    /// unknown fields are ignored.
    pub fn from_data(kind: NodeKind, data: &Value) -> Result<Self, ValidationError> {
        let mut controls = Self::defaults(kind);
        let fields = match data {
            Value::Object(map) => map,
            Value::Null => return Ok(controls),
            other => {
                return Err(ValidationError::new(
                    kind,
                    "data",
                    format!("expected an object, found {other}"),
                ));
            }
        };
        for (spec, slot) in kind.controls().iter().zip(controls.values.iter_mut()) {
            if let Some(raw) = fields.get(spec.key) {
                *slot = spec.parse_json(kind, raw)?;
            }
        }
        Ok(controls)
    }

    /// Writes the persisted data bag.
    ///
    /// Every control is written, including inline values of connected
    /// sockets, so they resurface if the socket is disconnected later.
    pub fn to_data(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(spec, value)| (spec.key.to_string(), value.to_json()))
            .collect();
        Value::Object(map)
    }

    /// Kind these controls belong to.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Declarations paired with current values.
    pub fn iter(&self) -> impl Iterator<Item = (&'static ControlSpec, &ControlValue)> {
        self.kind.controls().iter().zip(self.values.iter())
    }

    /// Current value of `key`.
    pub fn get(&self, key: &str) -> Option<&ControlValue> {
        self.iter().find(|(spec, _)| spec.key == key).map(|(_, v)| v)
    }

    /// Validates and stores a new value.
    pub fn set(&mut self, key: &str, value: ControlValue) -> Result<(), ValidationError> {
        let kind = self.kind;
        let index = kind
            .controls()
            .iter()
            .position(|spec| spec.key == key)
            .ok_or_else(|| ValidationError::new(kind, key, "no such control"))?;
        kind.controls()[index].validate(kind, &value)?;
        self.values[index] = value;
        Ok(())
    }

    /// Numeric value of `key`, or zero when `key` is not numeric.
    pub fn number(&self, key: &str) -> f64 {
        self.get(key).and_then(ControlValue::as_number).unwrap_or_default()
    }

    /// Name stored in `key`, or the empty string.
    pub fn choice(&self, key: &str) -> &str {
        self.get(key).and_then(ControlValue::as_str).unwrap_or_default()
    }

    /// Profile stored in `key`, or the default profile.
    pub fn profile(&self, key: &str) -> VoiceProfile {
        self.get(key)
            .and_then(ControlValue::as_profile)
            .copied()
            .unwrap_or_default()
    }
}
