//! Socket declarations.
//!
//! Every input socket declares how concurrent connections combine. The four
//! policies reproduce the editor's behavior exactly:
//!
//! | Policy | Unconnected | Connected |
//! |---|---|---|
//! | [`Combine::Signal`] | silent | each upstream patched into the primitive input |
//! | [`Combine::Override`] | parameter set to the inline value | parameter zeroed, the single upstream patched in |
//! | [`Combine::Additive`] | parameter set to the inline value | parameter zeroed once, each upstream patched in |
//! | [`Combine::Modulate`] | nothing | each upstream summed onto the parameter's base value |

use std::fmt;

/// Socket direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Accepts connections.
    Input,
    /// Emits connections.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// How many connections an input accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    /// At most one.
    Single,
    /// Any number.
    Multiple,
}

/// How an input socket's connections drive the primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combine {
    /// Audio into the primitive's input.
    Signal,
    /// "Base X" parameter: a connection replaces the inline value.
    Override,
    /// Parameter whose inline value is replaced by the sum of all connections.
    Additive,
    /// "Additional X" parameter: connections add onto the base value.
    Modulate,
}

impl Combine {
    /// True when a connection zeroes the parameter before patching.
    pub const fn zeroes_target(self) -> bool {
        matches!(self, Self::Override | Self::Additive)
    }
}

/// Static description of one socket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SocketSpec {
    /// Persisted socket key.
    pub name: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Input or output.
    pub direction: Direction,
    /// Connection limit (inputs only).
    pub multiplicity: Multiplicity,
    /// Combination policy (inputs only).
    pub combine: Combine,
    /// Control holding the inline fallback value, if any.
    pub inline_control: Option<&'static str>,
}

impl SocketSpec {
    /// Audio input accepting any number of connections.
    pub const fn signal(name: &'static str, label: &'static str) -> Self {
        Self::input(name, label, Multiplicity::Multiple, Combine::Signal, None)
    }

    /// "Base X" parameter input: one connection, overriding the inline control.
    pub const fn base(name: &'static str, label: &'static str, control: &'static str) -> Self {
        Self::input(name, label, Multiplicity::Single, Combine::Override, Some(control))
    }

    /// Parameter input whose connections sum and replace the inline control.
    pub const fn additive(name: &'static str, label: &'static str, control: &'static str) -> Self {
        Self::input(name, label, Multiplicity::Multiple, Combine::Additive, Some(control))
    }

    /// "Additional X" input: connections add onto the parameter's base value.
    pub const fn additional(name: &'static str, label: &'static str) -> Self {
        Self::input(name, label, Multiplicity::Multiple, Combine::Modulate, None)
    }

    /// Output socket.
    pub const fn output(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            direction: Direction::Output,
            multiplicity: Multiplicity::Multiple,
            combine: Combine::Signal,
            inline_control: None,
        }
    }

    const fn input(
        name: &'static str,
        label: &'static str,
        multiplicity: Multiplicity,
        combine: Combine,
        inline_control: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            label,
            direction: Direction::Input,
            multiplicity,
            combine,
            inline_control,
        }
    }
}
