use rayon::prelude::*;

use crate::{Error, ErrorFunction, NeuralNetwork, Result, core::evaluate, core::forward};

/// Mean of `error_fn` over `samples`. Runs a forward pass per sample, so only the transient
/// node state of the network changes.
pub fn mean_loss(
    nn: &mut NeuralNetwork,
    samples: &[(impl AsRef<[f32]>, f32)],
    error_fn: ErrorFunction,
) -> Result<f32> {
    if samples.is_empty() {
        return Err(Error::EmptyInput);
    }
    let mut loss = 0.0f32;
    for (x_i, y_i) in samples {
        let a_i = forward(nn, x_i.as_ref())?;
        loss += error_fn.error(a_i, *y_i);
    }
    Ok(loss / samples.len() as f32)
}

/// [`mean_loss`] evaluated on the rayon thread pool. The network is not touched.
pub fn mean_loss_par(
    nn: &NeuralNetwork,
    samples: &[(impl AsRef<[f32]> + Sync, f32)],
    error_fn: ErrorFunction,
) -> Result<f32> {
    if samples.is_empty() {
        return Err(Error::EmptyInput);
    }
    let n_nodes = nn.nodes().len();
    let loss = samples
        .par_iter()
        .map_init(
            || vec![0.0f32; n_nodes],
            |outputs, (x_i, y_i)| {
                evaluate(nn, x_i.as_ref(), outputs).map(|a_i| error_fn.error(a_i, *y_i))
            },
        )
        .try_reduce(|| 0.0, |a, b| Ok(a + b))?;
    Ok(loss / samples.len() as f32)
}
