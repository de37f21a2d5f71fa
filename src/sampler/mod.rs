//! Autoregressive melody generation.
//!
//! The predictor is opaque: it sees a one-hot context window and returns a
//! probability distribution over vocabulary ids. Each step the distribution is
//! sharpened or flattened by the temperature, one id is drawn, and the loop
//! stops early if that id is the delimiter.

pub mod markov;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use thiserror::Error;

use crate::corpus::one_hot;
use crate::token::Token;
use crate::vocabulary::{VocabError, Vocabulary};

/// Anything that can score the next id given a one-hot context window.
///
/// `window` has one row per context id, each row as wide as the vocabulary
/// (a batch of one). The returned vector must have one probability per id.
pub trait Predictor {
    fn predict(&self, window: &[Vec<f32>]) -> Result<Vec<f64>, PredictorError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Predictor failed: {0}")]
pub struct PredictorError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("Temperature must be positive, got {0}")]
    InvalidTemperature(f64),
    #[error("Distribution has no positive finite weight")]
    DegenerateDistribution,
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("Sampling error: {0}")]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Predictor(#[from] PredictorError),
    #[error("Predictor returned {actual} probabilities for a vocabulary of {expected}")]
    DistributionSize { expected: usize, actual: usize },
}

/// Rescale `probabilities` by `temperature` and renormalize.
///
/// `softmax(ln(p) / t)`, with the max logit subtracted before exponentiating
/// so that small temperatures do not overflow.
pub fn apply_temperature(probabilities: &[f64], temperature: f64) -> Result<Vec<f64>, SampleError> {
    if !(temperature > 0.0) {
        return Err(SampleError::InvalidTemperature(temperature));
    }

    let logits: Vec<f64> = probabilities.iter().map(|p| p.ln() / temperature).collect();
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(SampleError::DegenerateDistribution);
    }

    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Ok(exps.iter().map(|e| e / sum).collect())
}

/// Draw one index from `probabilities` after temperature rescaling.
pub fn sample_with_temperature<R: Rng + ?Sized>(
    probabilities: &[f64],
    temperature: f64,
    rng: &mut R,
) -> Result<usize, SampleError> {
    let weights = apply_temperature(probabilities, temperature)?;
    let dist = WeightedIndex::new(&weights).map_err(|_| SampleError::DegenerateDistribution)?;
    Ok(dist.sample(rng))
}

/// Generation front end: a predictor plus the vocabulary it was trained with.
pub struct MelodyGenerator<'a, P: Predictor + ?Sized> {
    predictor: &'a P,
    vocabulary: &'a Vocabulary,
    sequence_length: usize,
}

impl<'a, P: Predictor + ?Sized> MelodyGenerator<'a, P> {
    /// `sequence_length` is the number of start delimiters placed before the
    /// seed, matching the padding between songs at training time.
    pub fn new(predictor: &'a P, vocabulary: &'a Vocabulary, sequence_length: usize) -> Self {
        Self {
            predictor,
            vocabulary,
            sequence_length,
        }
    }

    /// Extend `seed` by up to `num_steps` sampled tokens.
    ///
    /// The returned melody starts with the seed. Generation stops early,
    /// without emitting it, when the delimiter is drawn. Only the last
    /// `max_sequence_length` ids are shown to the predictor; 0 disables the
    /// limit.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        seed: &[Token],
        num_steps: usize,
        max_sequence_length: usize,
        temperature: f64,
        rng: &mut R,
    ) -> Result<Vec<Token>, GenerateError> {
        if !(temperature > 0.0) {
            return Err(SampleError::InvalidTemperature(temperature).into());
        }

        let start = self.vocabulary.id(Token::Delimiter)?;
        let mut context = vec![start; self.sequence_length];
        context.extend(self.vocabulary.ids_of(seed)?);

        let mut melody = seed.to_vec();
        let vocab_size = self.vocabulary.len();

        for step in 0..num_steps {
            let window_start = match max_sequence_length {
                0 => 0,
                max => context.len().saturating_sub(max),
            };
            let window = one_hot(&context[window_start..], vocab_size);

            let probabilities = self.predictor.predict(&window)?;
            if probabilities.len() != vocab_size {
                return Err(GenerateError::DistributionSize {
                    expected: vocab_size,
                    actual: probabilities.len(),
                });
            }

            let output_id = sample_with_temperature(&probabilities, temperature, rng)?;
            context.push(output_id);

            // Distribution length was checked against the vocabulary above.
            let symbol = self
                .vocabulary
                .token(output_id)
                .ok_or(VocabError::IdOutOfRange { id: output_id, size: vocab_size })?;

            if symbol == Token::Delimiter {
                log::debug!("End of melody sampled after {} steps", step);
                break;
            }
            melody.push(symbol);
        }

        Ok(melody)
    }
}
