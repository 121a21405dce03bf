//! Online directional model
//!
//! Single-sample logistic regression over the fixed five-feature vector
//! `[imbalance, spread, vol_w1, vol_w2, vol_w3]`. Weights start at zero, so
//! an untrained model predicts exactly 0.5.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrategyError};

pub const FEATURE_DIM: usize = 5;

pub type FeatureVector = [f64; FEATURE_DIM];

/// Learning-rate schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub learning_rate: f64,
    /// Geometric decay applied after every update
    pub decay: f64,
    /// Floor for the decayed learning rate
    pub min_learning_rate: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            decay: 0.999,
            min_learning_rate: 1e-4,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(StrategyError::configuration(format!(
                "model decay must be in (0, 1], got {}",
                self.decay
            )));
        }
        if !(self.min_learning_rate > 0.0 && self.min_learning_rate <= self.learning_rate) {
            return Err(StrategyError::configuration(format!(
                "model learning rates must satisfy 0 < min ({}) <= initial ({})",
                self.min_learning_rate, self.learning_rate
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnlineDirectionalModel {
    weights: FeatureVector,
    bias: f64,
    learning_rate: f64,
    decay: f64,
    min_learning_rate: f64,
}

impl OnlineDirectionalModel {
    pub fn new(params: ModelParams) -> Self {
        Self {
            weights: [0.0; FEATURE_DIM],
            bias: 0.0,
            learning_rate: params.learning_rate,
            decay: params.decay,
            min_learning_rate: params.min_learning_rate,
        }
    }

    /// Probability of an up-move for `features`
    #[inline]
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        stable_sigmoid(self.score(features))
    }

    /// One SGD step toward `label` (0 or 1); returns the probability before the step
    pub fn update(&mut self, features: &FeatureVector, label: f64) -> f64 {
        let lr = self.learning_rate.max(self.min_learning_rate);
        let probability = self.predict(features);
        let error = probability - label;
        for (weight, feature) in self.weights.iter_mut().zip(features) {
            *weight -= lr * error * feature;
        }
        self.bias -= lr * error;
        self.learning_rate = (self.learning_rate * self.decay).max(self.min_learning_rate);
        probability
    }

    pub fn weights(&self) -> &FeatureVector {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    #[inline]
    fn score(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

impl Default for OnlineDirectionalModel {
    fn default() -> Self {
        Self::new(ModelParams::default())
    }
}

/// Logistic function that never evaluates `exp` of a large positive argument
#[inline]
fn stable_sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
