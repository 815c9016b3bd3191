use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// A feature computed from a 2-D point, fed to one input node.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFeature {
    #[display("x")]
    X,
    #[display("y")]
    Y,
    #[display("xSquared")]
    XSquared,
    #[display("ySquared")]
    YSquared,
    #[display("xTimesY")]
    XTimesY,
    #[display("sinX")]
    SinX,
    #[display("sinY")]
    SinY,
}

impl InputFeature {
    pub const ALL: [Self; 7] = [
        Self::X,
        Self::Y,
        Self::XSquared,
        Self::YSquared,
        Self::XTimesY,
        Self::SinX,
        Self::SinY,
    ];

    /// Identifier given to the input node reading this feature.
    pub fn id(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::XSquared => "xSquared",
            Self::YSquared => "ySquared",
            Self::XTimesY => "xTimesY",
            Self::SinX => "sinX",
            Self::SinY => "sinY",
        }
    }

    /// Human readable label, `X_1` being the x coordinate and `X_2` the y coordinate.
    pub fn label(self) -> &'static str {
        match self {
            Self::X => "X_1",
            Self::Y => "X_2",
            Self::XSquared => "X_1^2",
            Self::YSquared => "X_2^2",
            Self::XTimesY => "X_1X_2",
            Self::SinX => "sin(X_1)",
            Self::SinY => "sin(X_2)",
        }
    }

    pub fn apply(self, x: f32, y: f32) -> f32 {
        match self {
            Self::X => x,
            Self::Y => y,
            Self::XSquared => x * x,
            Self::YSquared => y * y,
            Self::XTimesY => x * y,
            Self::SinX => x.sin(),
            Self::SinY => y.sin(),
        }
    }
}

impl FromStr for InputFeature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.id() == s)
            .ok_or_else(|| Error::Configuration(format!("unknown input feature {s:?}")))
    }
}

/// Input vector of the point `(x, y)`, one entry per feature in order.
pub fn construct_input(features: &[InputFeature], x: f32, y: f32) -> Vec<f32> {
    features.iter().map(|feature| feature.apply(x, y)).collect()
}

/// Input ids matching [`construct_input`] for the same features.
pub fn input_ids(features: &[InputFeature]) -> Vec<String> {
    features.iter().map(|feature| feature.id().to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_follows_feature_order() {
        let features = [InputFeature::XTimesY, InputFeature::X, InputFeature::YSquared];
        assert_eq!(construct_input(&features, 2.0, -3.0), [-6.0, 2.0, 9.0]);
        assert_eq!(input_ids(&features), ["xTimesY", "x", "ySquared"]);
    }

    #[test]
    fn ids_parse_back() {
        for feature in InputFeature::ALL {
            assert_eq!(feature.id().parse::<InputFeature>().unwrap(), feature);
            assert_eq!(feature.to_string(), feature.id());
        }
        assert!("z".parse::<InputFeature>().is_err());
    }

    #[test]
    fn sine_features() {
        let input = construct_input(&[InputFeature::SinX, InputFeature::SinY], 0.0, 1.0);
        assert_eq!(input, [0.0, 1.0f32.sin()]);
        assert_eq!(InputFeature::SinY.label(), "sin(X_2)");
    }
}
