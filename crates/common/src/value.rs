//! Runtime value representation for the stack machine.
//!
//! Everything the machine keeps on its operand stack is a [`Value`]. Code
//! addresses and frame bases share the stack with ordinary data, so they are
//! wrapped in their own newtypes and tagged separately. Arithmetic on an
//! address can never silently degrade into integer arithmetic.

use std::fmt;

use crate::error::ValueError;

/// An instruction address: an index into a flat [`Program`](crate::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ip(pub usize);

impl Ip {
    /// The address `delta` instructions away, or `None` if it would leave
    /// the `usize` range.
    pub fn offset(self, delta: i64) -> Option<Ip> {
        let delta = isize::try_from(delta).ok()?;
        self.0.checked_add_signed(delta).map(Ip)
    }
}

impl fmt::Display for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IP({})", self.0)
    }
}

/// A frame base: the absolute stack index of slot 0 of a call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameBase(pub usize);

impl fmt::Display for FrameBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SP({})", self.0)
    }
}

/// The kind of a [`Value`], used in type-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Ip,
    Frame,
}

impl ValueKind {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Ip => "ip",
            ValueKind::Frame => "frame",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single operand-stack cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// Ordinary signed data.
    Int(i64),
    /// A code address, produced by `PUSH_IP` or by the assembler.
    Ip(Ip),
    /// A saved frame base, produced by `PUSH_FRAME`.
    Frame(FrameBase),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Ip(_) => ValueKind::Ip,
            Value::Frame(_) => ValueKind::Frame,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Ip> for Value {
    fn from(ip: Ip) -> Self {
        Value::Ip(ip)
    }
}

impl From<FrameBase> for Value {
    fn from(base: FrameBase) -> Self {
        Value::Frame(base)
    }
}

impl TryFrom<Value> for i64 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(n) => Ok(n),
            other => Err(ValueError::wrong_kind(ValueKind::Int, other)),
        }
    }
}

impl TryFrom<Value> for Ip {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Ip(ip) => Ok(ip),
            other => Err(ValueError::wrong_kind(ValueKind::Ip, other)),
        }
    }
}

impl TryFrom<Value> for FrameBase {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Frame(base) => Ok(base),
            other => Err(ValueError::wrong_kind(ValueKind::Frame, other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Ip(ip) => write!(f, "{ip}"),
            Value::Frame(base) => write!(f, "{base}"),
        }
    }
}
