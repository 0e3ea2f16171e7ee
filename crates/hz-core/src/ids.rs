use core::fmt;
use core::num::NonZeroU64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Compact, stable identifier handed out by a store sequence.
///
/// - `u64` sequences never wrap in practice
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeqId(NonZeroU64);

impl SeqId {
    /// Create an id from a 0-based index by storing index+1.
    pub fn from_index(index: u64) -> Self {
        Self(NonZeroU64::MIN.saturating_add(index))
    }

    /// Parse a user-facing 1-based value; zero is not an id.
    pub fn from_value(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u64 {
        self.0.get() - 1
    }

    /// The 1-based value, as shown to users.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqId({})", self.get())
    }
}

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type CalculationId = SeqId;
pub type RuptureId = SeqId;

/// Position of a realization within its calculation (0-based, unique).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ordinal(pub u32);

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Site identifier as declared in the job configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Seismic sources are addressed by their declared string id.
pub type SourceId = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_id_round_trip_index() {
        for i in [0_u64, 1, 2, 42, 10_000] {
            let id = SeqId::from_index(i);
            assert_eq!(id.index(), i);
            assert_eq!(id.get(), i + 1);
        }
    }

    #[test]
    fn from_value_rejects_zero() {
        assert_eq!(SeqId::from_value(0), None);
        assert_eq!(SeqId::from_value(3), Some(SeqId::from_index(2)));
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<SeqId>(),
            core::mem::size_of::<Option<SeqId>>()
        );
    }
}
