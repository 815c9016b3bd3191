use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// Penalty on weight magnitude. Absence of regularization is `Option::None`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regularization {
    /// `|w|`
    L1,
    /// `0.5 * w^2`
    L2,
}

impl Regularization {
    pub fn output(self, w: f32) -> f32 {
        match self {
            Self::L1 => w.abs(),
            Self::L2 => 0.5 * w * w,
        }
    }

    pub fn deriv(self, w: f32) -> f32 {
        match self {
            Self::L1 => {
                if w < 0.0 {
                    -1.0
                } else if w > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::L2 => w,
        }
    }

    /// Parses `"none"`, `"L1"` or `"L2"`.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, Error> {
        match s {
            "none" => Ok(None),
            s => s.parse().map(Some),
        }
    }
}

impl FromStr for Regularization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            s => Err(Error::Configuration(format!("unknown regularization {s:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l1_derivative_is_sign_with_zero_at_origin() {
        assert_eq!(Regularization::L1.deriv(-0.3), -1.0);
        assert_eq!(Regularization::L1.deriv(0.0), 0.0);
        assert_eq!(Regularization::L1.deriv(2.0), 1.0);
        assert_eq!(Regularization::L1.output(-0.3), 0.3);
    }

    #[test]
    fn l2_penalty_and_derivative() {
        assert_eq!(Regularization::L2.output(2.0), 2.0);
        assert_eq!(Regularization::L2.deriv(-0.5), -0.5);
    }

    #[test]
    fn parses_optional_names() {
        assert_eq!(Regularization::parse_optional("none").unwrap(), None);
        assert_eq!(
            Regularization::parse_optional("L2").unwrap(),
            Some(Regularization::L2)
        );
        assert!(Regularization::parse_optional("L3").is_err());
    }
}
