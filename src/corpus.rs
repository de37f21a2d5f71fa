//! Single-stream corpus assembly and training-window generation.

use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

use crate::token::{Token, TokenError, parse_tokens};
use crate::vocabulary::{VocabError, Vocabulary};
use crate::DELIMITER_SYMBOL;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("Encoded songs directory not found: {0}")]
    MissingDir(String),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, CorpusError>;

/// One training example: `sequence_length` context ids and the id that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingWindow {
    pub context: Vec<usize>,
    pub target: usize,
}

/// Concatenate every encoded song under `dataset_dir` into one stream, each
/// song followed by `sequence_length` delimiters so a full context window of
/// `/` always separates two songs.
pub fn create_single_file_dataset(dataset_dir: &Path, sequence_length: usize) -> Result<String> {
    if !dataset_dir.is_dir() {
        return Err(CorpusError::MissingDir(dataset_dir.display().to_string()));
    }

    let delimiter = format!("{} ", DELIMITER_SYMBOL).repeat(sequence_length);
    let mut songs = String::new();
    let mut count = 0usize;

    for entry in WalkDir::new(dataset_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let song = std::fs::read_to_string(entry.path())?;
        songs.push_str(song.trim());
        songs.push(' ');
        songs.push_str(&delimiter);
        count += 1;
    }

    log::info!("Assembled {} songs from {}", count, dataset_dir.display());
    Ok(songs.trim_end().to_string())
}

/// Assemble and write the single-file dataset, returning the stream.
pub fn write_single_file_dataset(
    dataset_dir: &Path,
    file_dataset_path: &Path,
    sequence_length: usize,
) -> Result<String> {
    let songs = create_single_file_dataset(dataset_dir, sequence_length)?;
    if let Some(parent) = file_dataset_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_dataset_path, &songs)?;
    Ok(songs)
}

pub fn load_single_file_dataset(path: &Path) -> Result<Vec<Token>> {
    let songs = std::fs::read_to_string(path)?;
    Ok(parse_tokens(&songs)?)
}

/// Map the whole stream to ids. A token missing from the vocabulary means the
/// vocabulary was built from a different corpus, so this fails rather than
/// skipping it.
pub fn convert_songs_to_int(songs: &[Token], vocabulary: &Vocabulary) -> Result<Vec<usize>> {
    Ok(vocabulary.ids_of(songs)?)
}

/// Slide a `sequence_length` window over `ids` with stride 1.
/// Produces `len - sequence_length` windows (none if the stream is too short).
pub fn generate_training_sequences(ids: &[usize], sequence_length: usize) -> Vec<TrainingWindow> {
    let num_sequences = ids.len().saturating_sub(sequence_length);
    (0..num_sequences)
        .map(|i| TrainingWindow {
            context: ids[i..i + sequence_length].to_vec(),
            target: ids[i + sequence_length],
        })
        .collect()
}

/// One-hot rows, one per id, each `num_classes` wide.
pub fn one_hot(ids: &[usize], num_classes: usize) -> Vec<Vec<f32>> {
    ids.iter()
        .map(|&id| {
            let mut row = vec![0.0; num_classes];
            if let Some(slot) = row.get_mut(id) {
                *slot = 1.0;
            }
            row
        })
        .collect()
}
