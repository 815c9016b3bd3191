pub use faer;

mod activation;
mod boundary;
pub mod core;
mod error;
mod error_function;
mod features;
mod graph;
mod gym;
mod nn;
mod pretty_print;
mod regularization;

pub use activation::*;
pub use boundary::*;
pub use error::*;
pub use error_function::*;
pub use features::*;
pub use graph::*;
pub use gym::*;
pub use nn::*;
pub use pretty_print::*;
pub use regularization::*;
