use core::fmt;
use core::str::FromStr;

use crate::Error;

/// Which structures a measure enhances.
///
/// `Dark` accepts voxels whose two dominant eigenvalues are negative, which is
/// what a bright plate or rod on a darker surround produces. `Bright` accepts
/// positive dominant eigenvalues. Measures normalize the input
/// with [`Polarity::orient`] so a single sign test serves both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    #[default]
    Bright,
    Dark,
}

impl Polarity {
    /// Sign applied to eigenvalues before the sign gate.
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Bright => 1.0,
            Polarity::Dark => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Polarity::Bright => Polarity::Dark,
            Polarity::Dark => Polarity::Bright,
        }
    }

    /// Maps eigenvalues so the accepted structure always has positive `l2`, `l3`.
    #[inline]
    pub fn orient(self, e: crate::Eigenvalues3) -> crate::Eigenvalues3 {
        match self {
            Polarity::Bright => e,
            Polarity::Dark => e.negated(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Bright => "bright",
            Polarity::Dark => "dark",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bright" => Ok(Polarity::Bright),
            "dark" => Ok(Polarity::Dark),
            _ => Err(Error::UnknownPolarity(s.to_string())),
        }
    }
}

/// Numeric flag as used by command lines: `1` enhances bright objects, `0` dark.
impl TryFrom<i32> for Polarity {
    type Error = Error;

    fn try_from(flag: i32) -> Result<Self, Self::Error> {
        match flag {
            1 => Ok(Polarity::Bright),
            0 => Ok(Polarity::Dark),
            other => Err(Error::UnknownPolarity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Polarity;
    use crate::{Eigenvalues3, Error};

    #[test]
    fn parses_names_and_flags() {
        assert_eq!("bright".parse::<Polarity>(), Ok(Polarity::Bright));
        assert_eq!(" Dark ".parse::<Polarity>(), Ok(Polarity::Dark));
        assert_eq!(Polarity::try_from(1), Ok(Polarity::Bright));
        assert_eq!(Polarity::try_from(0), Ok(Polarity::Dark));

        assert_eq!(
            "grey".parse::<Polarity>(),
            Err(Error::UnknownPolarity("grey".to_string()))
        );
        assert!(Polarity::try_from(2).is_err());
    }

    #[test]
    fn orient_flips_dark_only() {
        let e = Eigenvalues3::new(-1.0, -10.0, -10.0);
        assert_eq!(Polarity::Bright.orient(e), e);
        assert_eq!(Polarity::Dark.orient(e).as_array(), [1.0, 10.0, 10.0]);
        assert_eq!(
            Polarity::Dark.orient(e),
            Polarity::Bright.orient(e.negated())
        );
    }
}
