use derive_more::Display;

/// Loss of a single prediction against its label.
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFunction {
    /// `0.5 * (output - target)^2`.
    #[default]
    #[display("square")]
    Square,
}

impl ErrorFunction {
    pub fn error(self, output: f32, target: f32) -> f32 {
        match self {
            Self::Square => 0.5 * (output - target).powi(2),
        }
    }

    /// d error / d output.
    pub fn deriv(self, output: f32, target: f32) -> f32 {
        match self {
            Self::Square => output - target,
        }
    }
}
