pub mod encode;
pub mod filter;

use crate::config::DatasetConfig;
use crate::event::Event;
use crate::token::join_tokens;
use crate::SONG_EXTENSION;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Songs directory not found: {0}")]
    MissingDir(String),
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("Time step {time_step} splits a {duration} duration into more than {max} steps")]
    TimeStepTooSmall { time_step: f64, duration: f64, max: usize },
}

/// Upper bound on tokens a single event may expand to.
const MAX_STEPS_PER_EVENT: usize = 4096;

pub struct PreprocessResult {
    pub loaded: u64,
    pub encoded: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Load every parsed song under `songs_dir`, drop the ones with unacceptable
/// durations, and write the rest as token files `save_dir/<index>`.
///
/// `<index>` is the song's position among successfully loaded songs, so
/// skipped songs leave gaps in the numbering.
pub fn preprocess(
    songs_dir: &Path,
    save_dir: &Path,
    config: &DatasetConfig,
    jobs: usize,
) -> std::result::Result<PreprocessResult, PreprocessError> {
    validate_time_step(config)?;
    if !songs_dir.is_dir() {
        return Err(PreprocessError::MissingDir(songs_dir.display().to_string()));
    }

    let song_files = collect_song_files(songs_dir);
    std::fs::create_dir_all(save_dir)?;

    log::info!(
        "Loading {} songs from {} with {} workers",
        song_files.len(),
        songs_dir.display(),
        jobs
    );

    let pb = ProgressBar::new(song_files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Loading...");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| PreprocessError::ThreadPool(e.to_string()))?;

    // Parsing is the expensive part; filtering, encoding and writing stay
    // sequential so file numbering follows load order.
    let loaded: Vec<_> = pool.install(|| {
        song_files
            .par_iter()
            .map(|path| {
                let result = load_song(path);
                pb.inc(1);
                result
            })
            .collect()
    });

    let mut result = PreprocessResult {
        loaded: 0,
        encoded: 0,
        skipped: 0,
        errors: 0,
    };

    let mut songs = Vec::with_capacity(loaded.len());
    for (path, song) in song_files.iter().zip(loaded) {
        match song {
            Ok(events) => songs.push((path, events)),
            Err(e) => {
                log::warn!("Error loading {}: {}", path.display(), e);
                result.errors += 1;
            }
        }
    }
    result.loaded = songs.len() as u64;
    log::info!("Loaded {} songs", result.loaded);

    for (i, (path, events)) in songs.iter().enumerate() {
        if let Some(d) = filter::first_unacceptable_duration(events, &config.acceptable_durations) {
            log::debug!("Skipping {}: unacceptable duration {}", path.display(), d);
            result.skipped += 1;
            continue;
        }

        let encoded = encode::encode_song(events, config.time_step);
        std::fs::write(save_dir.join(i.to_string()), join_tokens(&encoded))?;
        result.encoded += 1;
    }

    pb.finish_with_message(format!(
        "Done: {} encoded, {} skipped, {} errors",
        result.encoded, result.skipped, result.errors
    ));

    Ok(result)
}

/// Only songs whose durations all come from `acceptable_durations` reach the
/// encoder, so bounding the longest of them bounds every encoded event.
fn validate_time_step(config: &DatasetConfig) -> std::result::Result<(), PreprocessError> {
    let time_step = config.time_step;
    if !(time_step > 0.0) || !time_step.is_finite() {
        return Err(PreprocessError::InvalidTimeStep(time_step));
    }
    let longest = config
        .acceptable_durations
        .iter()
        .copied()
        .fold(0.0_f64, f64::max);
    if longest / time_step > MAX_STEPS_PER_EVENT as f64 {
        return Err(PreprocessError::TimeStepTooSmall {
            time_step,
            duration: longest,
            max: MAX_STEPS_PER_EVENT,
        });
    }
    Ok(())
}

/// Parsed-event song files under `dir`, in file-name order.
fn collect_song_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SONG_EXTENSION))
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn load_song(path: &Path) -> std::result::Result<Vec<Event>, PreprocessError> {
    log::debug!(
        "Loading: {}",
        path.file_name().and_then(|f| f.to_str()).unwrap_or("?")
    );
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| PreprocessError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
