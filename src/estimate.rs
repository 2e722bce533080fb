//! Explicit "value or unknown" sentinel used throughout the pipeline.
//!
//! Missing reference data and zero-trial degenerate cases are values, not
//! errors: they compose through every downstream computation and surface as
//! explicit "n/a" markers in rendered output. Modeling them as a tagged type
//! (rather than sentinel strings) makes the short-circuiting type-checked.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A computed value, or `Unknown` when an input needed to compute it was
/// missing (absent reference data, zero trials).
///
/// Serializes as an optional value: `Unknown` becomes an empty CSV field /
/// JSON `null`, so persisted rows round-trip without magic strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate<T> {
    /// The computation produced a value.
    Known(T),
    /// The computation short-circuited on missing input.
    Unknown,
}

impl<T> Estimate<T> {
    /// The value, if known.
    pub fn known(self) -> Option<T> {
        match self {
            Estimate::Known(v) => Some(v),
            Estimate::Unknown => None,
        }
    }

    /// Whether this estimate is `Unknown`.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Estimate::Unknown)
    }

    /// Borrowed view of the value.
    pub fn as_ref(&self) -> Estimate<&T> {
        match self {
            Estimate::Known(v) => Estimate::Known(v),
            Estimate::Unknown => Estimate::Unknown,
        }
    }

    /// Apply `f` to a known value; `Unknown` propagates.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Estimate::Known(v) => Estimate::Known(f(v)),
            Estimate::Unknown => Estimate::Unknown,
        }
    }

    /// Chain a computation that may itself come up unknown.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Estimate<U>) -> Estimate<U> {
        match self {
            Estimate::Known(v) => f(v),
            Estimate::Unknown => Estimate::Unknown,
        }
    }
}

impl<T> From<Option<T>> for Estimate<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Estimate::Known(v),
            None => Estimate::Unknown,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Estimate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Known(v) => v.fmt(f),
            Estimate::Unknown => f.write_str("n/a"),
        }
    }
}

impl<T: Serialize> Serialize for Estimate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Estimate::Known(v) => serializer.serialize_some(v),
            Estimate::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Estimate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Estimate::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_propagates_through_map_and_and_then() {
        let u: Estimate<f64> = Estimate::Unknown;
        assert!(u.map(|v| v * 2.0).is_unknown());
        assert!(u.and_then(|_| Estimate::Known(1.0)).is_unknown());
        assert_eq!(Estimate::Known(2.0).map(|v| v * 2.0), Estimate::Known(4.0));
    }

    #[test]
    fn displays_na_for_unknown() {
        assert_eq!(format!("{}", Estimate::<f64>::Unknown), "n/a");
        assert_eq!(format!("{:.2}", Estimate::Known(0.126)), "0.13");
    }

    #[test]
    fn serializes_as_optional_value() {
        let json = serde_json::to_string(&Estimate::Known(0.5)).unwrap();
        assert_eq!(json, "0.5");
        let json = serde_json::to_string(&Estimate::<f64>::Unknown).unwrap();
        assert_eq!(json, "null");
        let back: Estimate<f64> = serde_json::from_str("null").unwrap();
        assert!(back.is_unknown());
    }
}
