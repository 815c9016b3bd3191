use clap::Parser;
use log::info;
use playground_nn::{
    Activation, Gym, InputFeature, NeuralNetwork, Regularization, Topology, TrainingConfig,
    construct_input, decision_boundary, input_ids,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Trains a small network on the XOR quadrant problem and prints the result.
#[derive(Debug, Parser)]
struct Args {
    /// Hidden layer sizes.
    #[arg(long, value_delimiter = ',', default_value = "4,2")]
    hidden: Vec<usize>,
    /// Input features, comma separated (x, y, xSquared, ySquared, xTimesY, sinX, sinY).
    #[arg(long, value_delimiter = ',', default_value = "x,y")]
    features: Vec<InputFeature>,
    #[arg(long, default_value = "tanh")]
    activation: Activation,
    /// none, L1 or L2.
    #[arg(long, default_value = "none")]
    regularization: String,
    #[arg(long, default_value_t = 0.03)]
    learning_rate: f32,
    #[arg(long, default_value_t = 0.0)]
    regularization_rate: f32,
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
    #[arg(long, default_value_t = 500)]
    steps: usize,
    /// Seed for both the dataset and the initial weights.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

type Samples = Vec<(Vec<f32>, f32)>;

/// Points in `[-5, 5]^2` labelled by the sign of `x * y`, split into train and test halves.
fn xor_samples(rng: &mut StdRng, features: &[InputFeature], n: usize) -> (Samples, Samples) {
    let padding = 0.3;
    let mut samples: Samples = (0..n)
        .map(|_| {
            let mut x: f32 = rng.random_range(-5.0..5.0);
            x += if x > 0.0 { padding } else { -padding };
            let mut y: f32 = rng.random_range(-5.0..5.0);
            y += if y > 0.0 { padding } else { -padding };
            let label = if x * y >= 0.0 { 1.0 } else { -1.0 };
            (construct_input(features, x, y), label)
        })
        .collect();
    let test = samples.split_off(n / 2);
    (samples, test)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (train, test) = xor_samples(&mut rng, &args.features, 500);

    let mut shape = vec![args.features.len()];
    shape.extend(&args.hidden);
    shape.push(1);
    let topology = Topology::new(shape, input_ids(&args.features))
        .with_activation_hidden(args.activation)
        .with_activation_output(Activation::Tanh)
        .with_regularization(Regularization::parse_optional(&args.regularization)?);
    let mut nn = NeuralNetwork::build_with_rng(&topology, &mut rng)?;

    let config = TrainingConfig::default()
        .with_learning_rate(args.learning_rate)
        .with_regularization_rate(args.regularization_rate)
        .with_batch_size(args.batch_size);
    let mut gym = Gym::with_initial_loss(&mut nn, config, &train, Some(test.as_slice()))?;

    let n_logs = 10;
    for i_step in 0..args.steps {
        let record = gym.step_with_test(&train, &test)?;
        if i_step % (args.steps / args.steps.min(n_logs)).max(1) == 0 || i_step + 1 == args.steps
        {
            info!(
                "[iter {}] train loss = {:.4}, test loss = {:.4}",
                record.iter,
                record.loss_train,
                record.loss_test.unwrap_or(f32::NAN)
            );
        }
    }

    for i_layer in 1..nn.n_layers() {
        if let Some(layer) = nn.pretty_print_layer(i_layer) {
            println!("=== Layer #{i_layer} ===\n\n{layer}\n");
        }
    }

    // Coarse text rendering of the output node's decision boundary.
    let density = 24;
    let boundary = decision_boundary(&nn, &args.features, density, (-6.0, 6.0))?;
    if let Some(grid) = boundary.node(nn.output_node().id()) {
        for j in 0..density {
            let row: String = (0..density)
                .map(|i| if grid[i][j] >= 0.0 { '+' } else { '.' })
                .collect();
            println!("{row}");
        }
    }
    Ok(())
}
