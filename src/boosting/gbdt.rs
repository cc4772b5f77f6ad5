//! Gradient boosted ensemble of fixed-depth trees under logistic loss.

use crate::boosting::history::{RoundRecord, TrainingHistory, HISTORY_HEADER};
use crate::boosting::loss::{calc_bias, mean_logloss, residuals, sigmoid};
use crate::config::Config;
use crate::core::error::{CartError, Result};
use crate::core::types::{NodeIndex, Score};
use crate::dataset::Dataset;
use crate::tree::Tree;

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Boosted classifier: a log-odds prior plus the sum of its trees' outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GBDT {
    config: Config,
    bias: Score,
    nr_field: usize,
    trees: Vec<Tree>,
}

impl GBDT {
    /// Create an untrained model. The configuration is validated here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(GBDT {
            config,
            bias: 0.0,
            nr_field: 0,
            trees: Vec::new(),
        })
    }

    /// Training configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Log-odds prior of the training labels.
    pub fn bias(&self) -> Score {
        self.bias
    }

    /// Fitted trees in round order.
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Number of fitted trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Dense field count of the training set.
    pub fn nr_field(&self) -> usize {
        self.nr_field
    }

    /// Train `config.num_trees` trees, replacing any earlier fit.
    ///
    /// All parallel work runs on a pool of `config.num_threads` workers. One
    /// line per round is logged at `info`.
    pub fn fit(&mut self, train: &Dataset, valid: Option<&Dataset>) -> Result<TrainingHistory> {
        crate::ensure!(train.nr_instance() > 0, crate::dataset_error!("training set is empty"));
        if let Some(valid) = valid {
            if valid.nr_field() != train.nr_field() {
                return Err(CartError::dimension_mismatch(
                    format!("training dense fields: {}", train.nr_field()),
                    format!("validation dense fields: {}", valid.nr_field()),
                ));
            }
        }

        let pool = self.config.build_thread_pool()?;
        pool.install(|| self.fit_rounds(train, valid))
    }

    fn fit_rounds(&mut self, train: &Dataset, valid: Option<&Dataset>) -> Result<TrainingHistory> {
        self.trees.clear();
        self.nr_field = train.nr_field();
        self.bias = calc_bias(train.mean_label())?;

        log::info!(
            "training {} trees of depth {} on {} instances with {} threads (bias {:.5})",
            self.config.num_trees,
            self.config.max_depth,
            train.nr_instance(),
            self.config.num_threads,
            self.bias
        );

        let valid_features: Vec<Vec<f32>> = valid
            .map(|va| {
                (0..va.nr_instance())
                    .into_par_iter()
                    .map(|i| va.feature_vector(i))
                    .collect()
            })
            .unwrap_or_default();

        let mut train_scores = vec![self.bias; train.nr_instance()];
        let mut valid_scores = vec![self.bias; valid_features.len()];
        let mut history = TrainingHistory::new();

        log::info!("{}", HISTORY_HEADER);
        let start = Instant::now();

        for iteration in 0..self.config.num_trees {
            let r = residuals(train.labels(), &train_scores);

            let mut tree = Tree::new(&self.config)?;
            let outputs = tree.fit(train, &r)?;

            train_scores
                .par_iter_mut()
                .zip(outputs.par_iter())
                .for_each(|(f, &gamma)| *f += gamma);
            valid_scores
                .par_iter_mut()
                .zip(valid_features.par_iter())
                .for_each(|(f, x)| *f += tree.predict(x).1);

            let record = RoundRecord {
                iteration,
                elapsed_secs: start.elapsed().as_secs_f64(),
                train_loss: mean_logloss(train.labels(), &train_scores),
                valid_loss: valid.map(|va| mean_logloss(va.labels(), &valid_scores)),
            };
            log::info!("{}", record);

            history.push(record);
            self.trees.push(tree);
        }

        Ok(history)
    }

    /// Raw score of one feature vector.
    pub fn predict(&self, x: &[f32]) -> Score {
        self.trees
            .iter()
            .fold(self.bias, |score, tree| score + tree.predict(x).1)
    }

    /// Probability that `x` is positive.
    pub fn predict_proba(&self, x: &[f32]) -> Score {
        sigmoid(self.predict(x))
    }

    /// Terminal node reached in every tree.
    pub fn get_indices(&self, x: &[f32]) -> Vec<NodeIndex> {
        self.trees.iter().map(|tree| tree.predict(x).0).collect()
    }

    fn check_fields(&self, dataset: &Dataset) -> Result<()> {
        if !self.trees.is_empty() && dataset.nr_field() != self.nr_field {
            return Err(CartError::dimension_mismatch(
                format!("model dense fields: {}", self.nr_field),
                format!("dataset dense fields: {}", dataset.nr_field()),
            ));
        }
        Ok(())
    }

    /// Raw scores of every instance of `dataset`.
    pub fn predict_dataset(&self, dataset: &Dataset) -> Result<Array1<Score>> {
        self.check_fields(dataset)?;
        let scores: Vec<Score> = (0..dataset.nr_instance())
            .into_par_iter()
            .map(|i| self.predict(&dataset.feature_vector(i)))
            .collect();
        Ok(Array1::from_vec(scores))
    }

    /// Leaf ids of every instance of `dataset`, one column per tree.
    pub fn leaf_indices(&self, dataset: &Dataset) -> Result<Array2<NodeIndex>> {
        self.check_fields(dataset)?;
        let rows: Vec<Vec<NodeIndex>> = (0..dataset.nr_instance())
            .into_par_iter()
            .map(|i| self.get_indices(&dataset.feature_vector(i)))
            .collect();
        let flat: Vec<NodeIndex> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((dataset.nr_instance(), self.trees.len()), flat)
            .map_err(|e| CartError::prediction(format!("leaf index shape error: {}", e)))
    }

    /// Serializes the model to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CartError::serialization(format!("JSON serialization failed: {}", e)))
    }

    /// Restores a model from JSON, checking its configuration and trees.
    pub fn from_json(json: &str) -> Result<Self> {
        let model: GBDT = serde_json::from_str(json)
            .map_err(|e| CartError::serialization(format!("JSON deserialization failed: {}", e)))?;
        model.config.validate()?;
        for tree in &model.trees {
            tree.validate()?;
            if tree.max_depth() != model.config.max_depth {
                return Err(CartError::serialization(format!(
                    "tree depth {} differs from configured depth {}",
                    tree.max_depth(),
                    model.config.max_depth
                )));
            }
        }
        Ok(model)
    }

    /// Write the model to `path` as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("saved model with {} trees to {}", self.trees.len(), path.as_ref().display());
        Ok(())
    }

    /// Read a model written by [`GBDT::save_json`].
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}
