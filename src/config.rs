use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Number of parallel workers for preprocessing. 0 = auto-detect (cores / 2, min 1).
    pub workers: usize,
    /// Corpus building settings.
    pub dataset: DatasetConfig,
    /// Melody generation settings.
    pub generation: GenerationConfig,
}

/// Corpus building configuration. Relative paths live under the XDG data dir.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory of parsed-event song files (used when `preprocess` has no CLI arg).
    pub songs_dir: Option<PathBuf>,
    /// Where encoded songs are written, one file per song.
    pub save_dir: PathBuf,
    /// Concatenated, delimited corpus.
    pub single_file_dataset: PathBuf,
    /// Token -> id vocabulary (JSON).
    pub mapping_path: PathBuf,
    /// Training window length, also the number of delimiters between songs.
    pub sequence_length: usize,
    /// Quantization step in quarter lengths.
    pub time_step: f64,
    /// Songs containing any other duration are skipped.
    pub acceptable_durations: Vec<f64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            songs_dir: None,
            save_dir: PathBuf::from("dataset"),
            single_file_dataset: PathBuf::from("file_dataset"),
            mapping_path: PathBuf::from("mapping.json"),
            sequence_length: crate::DEFAULT_SEQUENCE_LENGTH,
            time_step: crate::DEFAULT_TIME_STEP,
            acceptable_durations: crate::ACCEPTABLE_DURATIONS.to_vec(),
        }
    }
}

/// Melody generation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Fitted predictor (JSON).
    pub model_path: PathBuf,
    /// Upper bound on sampled tokens per melody.
    pub num_steps: usize,
    /// Context ids shown to the predictor each step (0 = unbounded).
    pub max_sequence_length: usize,
    pub temperature: f64,
    /// Quarter lengths per token when decoding.
    pub step_duration: f64,
    pub tempo_bpm: u32,
    /// Fixed RNG seed for reproducible melodies. Unset = seeded from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            num_steps: 500,
            max_sequence_length: crate::DEFAULT_SEQUENCE_LENGTH,
            temperature: 0.7,
            step_duration: crate::DEFAULT_TIME_STEP,
            tempo_bpm: 120,
            rng_seed: None,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/melodyseq/config.toml`, or `path` if given.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = path.map(Path::to_path_buf).or_else(Self::config_path);
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!(
                            "Failed to parse {}: {}. Using defaults.",
                            path.display(),
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!(
                        "Failed to read {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve worker count: 0 → auto-detect (cores / 2, min 1).
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            (cores / 2).max(1)
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Anchor a relative path under the XDG data directory; absolute paths pass through.
pub fn resolve_data_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.data_dir().join(path)
    } else {
        // Fallback: current directory
        path.to_path_buf()
    }
}
