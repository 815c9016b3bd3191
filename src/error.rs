use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The network or training configuration is malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// An input vector does not match the size of the input layer.
    #[error("expected an input of {expected} features, found {found}")]
    Dimension { expected: usize, found: usize },
    #[error("cannot evaluate loss over an empty set of samples")]
    EmptyInput,
}
