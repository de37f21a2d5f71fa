pub mod config;
pub mod corpus;
pub mod decode;
pub mod event;
pub mod midi;
pub mod preprocess;
pub mod sampler;
pub mod token;
pub mod vocabulary;

/// Marker for a rest step
pub const REST_SYMBOL: &str = "r";

/// Marker for "previous pitch/rest holds for one more step"
pub const CONTINUATION_SYMBOL: &str = "_";

/// Song boundary in the corpus, end-of-melody during generation
pub const DELIMITER_SYMBOL: &str = "/";

/// Quantization granularity in quarter lengths (a sixteenth note)
pub const DEFAULT_TIME_STEP: f64 = 0.25;

/// Context length used for training windows and start padding
pub const DEFAULT_SEQUENCE_LENGTH: usize = 64;

/// Durations (quarter lengths) a song may contain to be kept in the corpus
pub const ACCEPTABLE_DURATIONS: &[f64] = &[0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

/// Extension of parsed-event song files handed over by the notation service
pub const SONG_EXTENSION: &str = "json";

/// Application name for XDG paths
pub const APP_NAME: &str = "melodyseq";
