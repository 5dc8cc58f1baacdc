//! Argument values and deep structural equality.
//!
//! Call arguments are modelled as a closed variant type covering scalars,
//! ordered sequences and key-unique mappings. Deduplication compares whole
//! argument lists with [`args_eq`], an explicit recursive structural
//! equality.
//!
//! # Equality semantics
//!
//! - Floats compare by bit pattern: `NaN` equals `NaN`, and `0.0` does not
//!   equal `-0.0`. This keeps equality reflexive so values can serve as
//!   group representatives.
//! - Cyclic structures are unrepresentable: values form an owned tree, so
//!   recursion always terminates. Recursion depth is bounded only by the
//!   depth of the values being compared.

use std::collections::BTreeMap;
use std::fmt;

/// A single call argument.
///
/// # Examples
///
/// ```
/// use performer::{args, ArgValue};
///
/// let list = args![1, "retry", true];
/// assert_eq!(list[0], ArgValue::Int(1));
/// assert_eq!(list[1], ArgValue::Str("retry".to_string()));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArgValue {
    /// Absent / null argument.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Signed integer scalar.
    Int(i64),
    /// Floating point scalar. Compared by bit pattern.
    Float(f64),
    /// String scalar.
    Str(String),
    /// Ordered sequence; order is significant for equality.
    Seq(Vec<ArgValue>),
    /// Key-unique mapping; keys are compared along with values.
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Deep structural equality against another value.
    pub fn deep_eq(&self, other: &ArgValue) -> bool {
        match (self, other) {
            (ArgValue::Null, ArgValue::Null) => true,
            (ArgValue::Bool(a), ArgValue::Bool(b)) => a == b,
            (ArgValue::Int(a), ArgValue::Int(b)) => a == b,
            (ArgValue::Float(a), ArgValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ArgValue::Str(a), ArgValue::Str(b)) => a == b,
            (ArgValue::Seq(a), ArgValue::Seq(b)) => args_eq(a, b),
            (ArgValue::Map(a), ArgValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.deep_eq(vb))
            }
            _ => false,
        }
    }
}

/// Deep equality over whole argument lists.
///
/// Lists are equal when they have the same length and every position is
/// pairwise [`ArgValue::deep_eq`].
pub fn args_eq(a: &[ArgValue], b: &[ArgValue]) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_eq(y))
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

// Bit-pattern float comparison is reflexive, so full Eq is sound.
impl Eq for ArgValue {}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => write!(f, "null"),
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Str(s) => write!(f, "{:?}", s),
            ArgValue::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ArgValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<()> for ArgValue {
    fn from(_: ()) -> Self {
        ArgValue::Null
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v.into())
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Int(v.into())
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(v: Vec<ArgValue>) -> Self {
        ArgValue::Seq(v)
    }
}

impl From<BTreeMap<String, ArgValue>> for ArgValue {
    fn from(v: BTreeMap<String, ArgValue>) -> Self {
        ArgValue::Map(v)
    }
}

/// Build an argument list from plain Rust values.
///
/// ```
/// use performer::args;
///
/// let empty = args![];
/// assert!(empty.is_empty());
///
/// let list = args![42, "name", true];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::ArgValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        <[_]>::into_vec(::std::boxed::Box::new([
            $($crate::ArgValue::from($value)),+
        ]))
    };
}
