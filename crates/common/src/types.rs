//! Core types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rational frame rate (e.g., 30000/1001 for 29.97fps).
///
/// This mirrors the host's JSON encoding (`{"num": .., "den": ..}`).
/// A zero denominator can arrive from a malformed project; accessors
/// guard against it instead of panicking so bad host data never takes
/// the engine down.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const FPS_24: Self = Self { num: 24, den: 1 };
    pub const FPS_25: Self = Self { num: 25, den: 1 };
    pub const FPS_30: Self = Self { num: 30, den: 1 };
    pub const FPS_29_97: Self = Self {
        num: 30000,
        den: 1001,
    };
    pub const FPS_60: Self = Self { num: 60, den: 1 };

    pub fn new(num: u32, den: u32) -> Self {
        assert!(den > 0, "Rational denominator must be > 0");
        Self { num, den }
    }

    /// Frames per second as a float. A malformed zero denominator
    /// evaluates as `den = 1` rather than dividing by zero.
    pub fn as_f64(self) -> f64 {
        if self.den == 0 {
            return self.num as f64;
        }
        self.num as f64 / self.den as f64
    }

    /// Whether this is a usable frame rate (positive numerator and denominator).
    pub fn is_valid(self) -> bool {
        self.num > 0 && self.den > 0
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Kind tag for timeline items addressed by the host and the selection
/// machine. Carried explicitly so entities never have to be told apart
/// by shape (such as the presence of a `file_id`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Clip,
    Transition,
    Effect,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::Transition => "transition",
            Self::Effect => "effect",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier threaded through every host call made during a
/// single gesture, letting the host group them into one undoable action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Allocate a fresh transaction id. One per gesture, at gesture start.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for TransactionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_display() {
        assert_eq!(Rational::FPS_30.to_string(), "30");
        assert_eq!(Rational::FPS_29_97.to_string(), "30000/1001");
    }

    #[test]
    fn rational_zero_den_does_not_divide_by_zero() {
        let r = Rational { num: 24, den: 0 };
        assert!((r.as_f64() - 24.0).abs() < f64::EPSILON);
        assert!(!r.is_valid());
    }

    #[test]
    fn rational_serde_matches_wire_format() {
        let json = r#"{"num":30000,"den":1001}"#;
        let r: Rational = serde_json::from_str(json).unwrap();
        assert_eq!(r, Rational::FPS_29_97);
        assert_eq!(serde_json::to_string(&r).unwrap(), json);
    }

    #[test]
    fn item_kind_as_str() {
        assert_eq!(ItemKind::Clip.as_str(), "clip");
        assert_eq!(ItemKind::Transition.to_string(), "transition");
        assert_eq!(
            serde_json::to_string(&ItemKind::Effect).unwrap(),
            "\"effect\""
        );
    }

    #[test]
    fn transaction_ids_are_unique() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn transaction_id_serializes_as_bare_string() {
        let tx = TransactionId::new();
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, format!("\"{}\"", tx.as_str()));
    }
}
