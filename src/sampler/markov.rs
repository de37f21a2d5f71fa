// First-order Markov predictor.
//
// A lightweight stand-in for a trained sequence model: it counts which id
// follows which in the training windows and answers with smoothed transition
// probabilities for the last id of the context. Saved as JSON next to the
// vocabulary it was fitted against.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::{Predictor, PredictorError};
use crate::corpus::TrainingWindow;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Training window uses id {id}, outside a vocabulary of {size}")]
    IdOutOfRange { id: usize, size: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkovPredictor {
    pub vocab_size: usize,
    /// Additive smoothing; any positive value keeps every probability > 0.
    pub alpha: f64,
    /// transitions[prev][next] = count
    pub transitions: Vec<Vec<u64>>,
    /// Target counts regardless of context, used when the context is empty.
    pub unigram: Vec<u64>,
}

impl MarkovPredictor {
    /// Count `last context id -> target` over every window.
    ///
    /// Ids must come from the vocabulary of size `vocab_size`; anything else
    /// means windows and vocabulary were built from different corpora.
    pub fn fit(windows: &[TrainingWindow], vocab_size: usize, alpha: f64) -> Result<Self, ModelError> {
        let mut transitions = vec![vec![0u64; vocab_size]; vocab_size];
        let mut unigram = vec![0u64; vocab_size];

        for window in windows {
            let target = window.target;
            if target >= vocab_size {
                return Err(ModelError::IdOutOfRange { id: target, size: vocab_size });
            }
            unigram[target] += 1;
            if let Some(&prev) = window.context.last() {
                let row = transitions
                    .get_mut(prev)
                    .ok_or(ModelError::IdOutOfRange { id: prev, size: vocab_size })?;
                row[target] += 1;
            }
        }

        log::info!(
            "Fitted Markov predictor on {} windows ({} classes, alpha {})",
            windows.len(),
            vocab_size,
            alpha
        );

        Ok(Self {
            vocab_size,
            alpha,
            transitions,
            unigram,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read_to_string(path)?;
        let model: MarkovPredictor = serde_json::from_str(&data)?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    fn smoothed(&self, counts: &[u64]) -> Vec<f64> {
        let total: f64 = counts.iter().map(|&c| c as f64 + self.alpha).sum();
        if total <= 0.0 {
            return vec![1.0 / self.vocab_size as f64; self.vocab_size];
        }
        counts
            .iter()
            .map(|&c| (c as f64 + self.alpha) / total)
            .collect()
    }
}

impl Predictor for MarkovPredictor {
    fn predict(&self, window: &[Vec<f32>]) -> Result<Vec<f64>, PredictorError> {
        if let Some(row) = window.iter().find(|row| row.len() != self.vocab_size) {
            return Err(PredictorError(format!(
                "one-hot row has width {}, model expects {}",
                row.len(),
                self.vocab_size
            )));
        }

        let counts = window
            .last()
            .and_then(|row| hot_index(row))
            .and_then(|prev| self.transitions.get(prev))
            .unwrap_or(&self.unigram);
        Ok(self.smoothed(counts))
    }
}

fn hot_index(row: &[f32]) -> Option<usize> {
    row.iter().position(|&x| x > 0.5)
}
