//! Intensity measure types.
//!
//! IMTs are written the way job files spell them: `PGA`, `PGV`, `SA(0.2)`.
//! Spectral accelerations always carry 5% damping.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Damping ratio (percent) attached to every spectral acceleration.
pub const DEFAULT_SA_DAMPING: Real = 5.0;

#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Imt {
    /// Peak ground acceleration (g).
    Pga,
    /// Peak ground velocity (cm/s).
    Pgv,
    /// Spectral acceleration (g) at `period` seconds.
    Sa { period: Real, damping: Real },
}

impl Imt {
    pub fn sa(period: Real) -> Self {
        Imt::Sa {
            period,
            damping: DEFAULT_SA_DAMPING,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Imt::Pga => "PGA",
            Imt::Pgv => "PGV",
            Imt::Sa { .. } => "SA",
        }
    }

    pub fn sa_period(&self) -> Option<Real> {
        match self {
            Imt::Sa { period, .. } => Some(*period),
            _ => None,
        }
    }

    pub fn sa_damping(&self) -> Option<Real> {
        match self {
            Imt::Sa { damping, .. } => Some(*damping),
            _ => None,
        }
    }

    /// Oscillator period used by period-dependent models; PGA is the 0 s limit.
    pub fn spectral_period(&self) -> Option<Real> {
        match self {
            Imt::Pga => Some(0.0),
            Imt::Pgv => None,
            Imt::Sa { period, .. } => Some(*period),
        }
    }

    fn key(&self) -> (u8, u64, u64) {
        match self {
            Imt::Pga => (0, 0, 0),
            Imt::Pgv => (1, 0, 0),
            Imt::Sa { period, damping } => (2, period.to_bits(), damping.to_bits()),
        }
    }
}

impl PartialEq for Imt {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Imt {}

impl Hash for Imt {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Imt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Imt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Imt::Sa {
                    period: a,
                    damping: da,
                },
                Imt::Sa {
                    period: b,
                    damping: db,
                },
            ) => a.total_cmp(b).then(da.total_cmp(db)),
            _ => self.key().0.cmp(&other.key().0),
        }
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imt::Pga => write!(f, "PGA"),
            Imt::Pgv => write!(f, "PGV"),
            Imt::Sa { period, .. } => write!(f, "SA({period})"),
        }
    }
}

impl FromStr for Imt {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let text = s.trim();
        let invalid = || CoreError::InvalidImt {
            text: s.to_string(),
        };
        match text {
            "PGA" => Ok(Imt::Pga),
            "PGV" => Ok(Imt::Pgv),
            _ => {
                let inner = text
                    .strip_prefix("SA(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(invalid)?;
                let period: Real = inner.trim().parse().map_err(|_| invalid())?;
                if !period.is_finite() || period < 0.0 {
                    return Err(invalid());
                }
                Ok(Imt::sa(period))
            }
        }
    }
}

impl TryFrom<String> for Imt {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        value.parse()
    }
}

impl From<Imt> for String {
    fn from(imt: Imt) -> Self {
        imt.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_imts() {
        assert_eq!("PGA".parse::<Imt>().unwrap(), Imt::Pga);
        assert_eq!("PGV".parse::<Imt>().unwrap(), Imt::Pgv);
        let sa: Imt = "SA(0.1)".parse().unwrap();
        assert_eq!(sa.sa_period(), Some(0.1));
        assert_eq!(sa.sa_damping(), Some(5.0));
        assert_eq!(sa.to_string(), "SA(0.1)");
    }

    #[test]
    fn reject_garbage() {
        for bad in ["", "SA", "SA()", "SA(-1)", "SA(x)", "MMI"] {
            assert!(bad.parse::<Imt>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn ordering_puts_pga_first() {
        let mut imts = vec![Imt::sa(1.0), Imt::Pgv, Imt::sa(0.2), Imt::Pga];
        imts.sort();
        assert_eq!(imts, vec![Imt::Pga, Imt::Pgv, Imt::sa(0.2), Imt::sa(1.0)]);
    }
}
