use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// Activation function of a node, resolved once when the network is built.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    #[display("linear")]
    Linear,
    #[default]
    #[display("tanh")]
    Tanh,
    #[display("sigmoid")]
    Sigmoid,
    #[display("relu")]
    Relu,
}

impl Activation {
    pub const ALL: [Self; 4] = [Self::Linear, Self::Tanh, Self::Sigmoid, Self::Relu];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
            Self::Relu => "relu",
        }
    }

    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Tanh => x.tanh(),
            Self::Sigmoid => logistic(x),
            Self::Relu => x.max(0.0),
        }
    }

    /// Derivative at the total input `x`. ReLU is not differentiable at 0 and uses 0 there.
    pub fn deriv(self, x: f32) -> f32 {
        match self {
            Self::Linear => 1.0,
            Self::Tanh => 1.0 - x.tanh().powi(2),
            Self::Sigmoid => {
                let s = logistic(x);
                s * (1.0 - s)
            }
            Self::Relu if x <= 0.0 => 0.0,
            Self::Relu => 1.0,
        }
    }
}

fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phi| phi.name() == s)
            .ok_or_else(|| Error::Configuration(format!("unknown activation function {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-3f32;
        for phi in Activation::ALL {
            for &x in &[-2.0f32, -0.5, 0.3, 1.7] {
                let numeric = (phi.apply(x + h) - phi.apply(x - h)) / (2.0 * h);
                assert!(
                    (numeric - phi.deriv(x)).abs() < 1e-2,
                    "{phi} at {x}: numeric {numeric}, analytic {}",
                    phi.deriv(x)
                );
            }
        }
    }

    #[test]
    fn relu_derivative_at_zero_is_zero() {
        assert_eq!(Activation::Relu.deriv(0.0), 0.0);
        assert_eq!(Activation::Relu.apply(-3.0), 0.0);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for phi in Activation::ALL {
            assert_eq!(phi.name().parse::<Activation>().unwrap(), phi);
            assert_eq!(phi.to_string(), phi.name());
        }
        assert!("softmax".parse::<Activation>().is_err());
    }
}
