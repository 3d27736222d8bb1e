use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------        Vnd         ----------------------------------------------------------
/// An amount of Vietnamese đồng.
///
/// The đồng has no minor unit in circulation, so amounts are stored as whole đồng in a signed 64-bit integer.
/// All arithmetic and comparisons are integer operations. Amounts are money; floating point never touches this type.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Vnd(i64);

op!(binary Vnd, Add, add);
op!(binary Vnd, Sub, sub);
op!(inplace Vnd, SubAssign, sub_assign);
op!(unary Vnd, Neg, neg);

impl Mul<i64> for Vnd {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Vnd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in đồng: {0}")]
pub struct VndConversionError(String);

impl From<i64> for Vnd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Vnd {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Vnd {}

impl TryFrom<u64> for Vnd {
    type Error = VndConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(VndConversionError(format!("Value {} is too large to convert to Vnd", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Vnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}₫", self.0)
    }
}

impl Vnd {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The absolute difference between two amounts. Used for tolerance checks against gateway-reported values.
    pub fn abs_diff(&self, other: Vnd) -> Vnd {
        Vnd((self.0 - other.0).abs())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Vnd::from(50_000);
        let b = Vnd::from(1_500);
        assert_eq!(a + b, Vnd::from(51_500));
        assert_eq!(a - b, Vnd::from(48_500));
        assert_eq!(-b, Vnd::from(-1_500));
        assert_eq!([a, b].into_iter().sum::<Vnd>(), Vnd::from(51_500));
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let expected = Vnd::from(50_000);
        let paid = Vnd::from(49_200);
        assert_eq!(expected.abs_diff(paid), Vnd::from(800));
        assert_eq!(paid.abs_diff(expected), Vnd::from(800));
    }

    #[test]
    fn display() {
        assert_eq!(Vnd::from(56_000).to_string(), "56000₫");
    }
}
