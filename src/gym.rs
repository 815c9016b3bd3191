use log::{debug, warn};

use crate::{
    Error, ErrorFunction, NeuralNetwork, Result,
    core::{back_propagate, forward, mean_loss, update_weights},
};

/// Hyperparameters of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f32,
    pub regularization_rate: f32,
    /// Number of samples whose gradients are averaged into one update.
    pub batch_size: usize,
    pub error_function: ErrorFunction,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.03,
            regularization_rate: 0.0,
            batch_size: 10,
            error_function: ErrorFunction::Square,
        }
    }
}

impl TrainingConfig {
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_regularization_rate(mut self, regularization_rate: f32) -> Self {
        self.regularization_rate = regularization_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_error_function(mut self, error_function: ErrorFunction) -> Self {
        self.error_function = error_function;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Configuration("batch size must be at least 1".into()));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(Error::Configuration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.regularization_rate.is_nan() || self.regularization_rate < 0.0 {
            return Err(Error::Configuration(format!(
                "regularization rate must not be negative, got {}",
                self.regularization_rate
            )));
        }
        Ok(())
    }
}

/// Losses after one training step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub iter: usize,
    pub loss_train: f32,
    pub loss_test: Option<f32>,
}

/// Drives training of a network, one pass over the training set per step.
pub struct Gym<'a> {
    nn: &'a mut NeuralNetwork,
    config: TrainingConfig,
    iter: usize,
    records: Vec<StepRecord>,
}

impl<'a> Gym<'a> {
    pub fn new(nn: &'a mut NeuralNetwork, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nn,
            config,
            iter: 0,
            records: Vec::new(),
        })
    }

    /// Like [`Gym::new`], but records the losses of the untrained network as iteration 0.
    pub fn with_initial_loss<X: AsRef<[f32]>>(
        nn: &'a mut NeuralNetwork,
        config: TrainingConfig,
        train: &[(X, f32)],
        test: Option<&[(X, f32)]>,
    ) -> Result<Self> {
        let mut gym = Self::new(nn, config)?;
        let record = gym.record(train, test)?;
        gym.records.push(record);
        Ok(gym)
    }

    pub fn nn(&mut self) -> &mut NeuralNetwork {
        &mut *self.nn
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Number of steps taken so far.
    pub fn iter(&self) -> usize {
        self.iter
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Trains on every sample of `train` in order, updating weights after every `batch_size`
    /// samples. Gradients of a trailing partial batch carry over into the next update.
    pub fn step(&mut self, train: &[(impl AsRef<[f32]>, f32)]) -> Result<StepRecord> {
        self.step_inner(train, None)
    }

    /// [`Gym::step`], also reporting the loss over `test`.
    pub fn step_with_test<X: AsRef<[f32]>>(
        &mut self,
        train: &[(X, f32)],
        test: &[(X, f32)],
    ) -> Result<StepRecord> {
        self.step_inner(train, Some(test))
    }

    fn step_inner<X: AsRef<[f32]>>(
        &mut self,
        train: &[(X, f32)],
        test: Option<&[(X, f32)]>,
    ) -> Result<StepRecord> {
        self.check_samples(train)?;
        if let Some(test) = test {
            self.check_samples(test)?;
        }
        let TrainingConfig {
            learning_rate,
            regularization_rate,
            batch_size,
            error_function,
        } = self.config;
        self.iter += 1;
        for (i, (x_i, y_i)) in train.iter().enumerate() {
            forward(self.nn, x_i.as_ref())?;
            back_propagate(self.nn, *y_i, error_function);
            if (i + 1) % batch_size == 0 {
                update_weights(self.nn, learning_rate, regularization_rate);
            }
        }
        let record = self.record(train, test)?;
        debug!(
            "[iter {}] loss_train = {}, loss_test = {:?}",
            record.iter, record.loss_train, record.loss_test
        );
        if !record.loss_train.is_finite() {
            warn!(
                "training loss diverged to {} at iteration {}, consider a lower learning rate",
                record.loss_train, record.iter
            );
        }
        self.records.push(record);
        Ok(record)
    }

    /// Rejects an empty sample set or any sample of the wrong length, so a failing step leaves
    /// the network and the history untouched.
    fn check_samples<X: AsRef<[f32]>>(&self, samples: &[(X, f32)]) -> Result<()> {
        if samples.is_empty() {
            return Err(Error::EmptyInput);
        }
        let expected = self.nn.n_inputs();
        match samples.iter().find(|(x, _)| x.as_ref().len() != expected) {
            Some((x, _)) => Err(Error::Dimension {
                expected,
                found: x.as_ref().len(),
            }),
            None => Ok(()),
        }
    }

    fn record<X: AsRef<[f32]>>(
        &mut self,
        train: &[(X, f32)],
        test: Option<&[(X, f32)]>,
    ) -> Result<StepRecord> {
        let error_function = self.config.error_function;
        let loss_train = mean_loss(self.nn, train, error_function)?;
        let loss_test = match test {
            Some(test) => Some(mean_loss(self.nn, test, error_function)?),
            None => None,
        };
        Ok(StepRecord {
            iter: self.iter,
            loss_train,
            loss_test,
        })
    }
}
