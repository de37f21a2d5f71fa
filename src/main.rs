use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use melodyseq::config::{AppConfig, resolve_data_path};
use melodyseq::corpus;
use melodyseq::decode::decode_melody;
use melodyseq::sampler::MelodyGenerator;
use melodyseq::sampler::markov::MarkovPredictor;
use melodyseq::token::{join_tokens, parse_tokens};
use melodyseq::vocabulary::Vocabulary;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "melodyseq", version, about = "Folk-melody time-series encoder and sampler")]
struct Cli {
    /// Path to a config file (defaults to the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter and encode parsed songs into time-series token files
    Preprocess {
        /// Directory of parsed-event song files (defaults to config dataset.songs_dir)
        songs_dir: Option<PathBuf>,

        /// Output directory for encoded songs
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Number of parallel workers (0 = auto-detect from config)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,
    },

    /// Concatenate encoded songs into one corpus and build the vocabulary
    Corpus,

    /// Fit the Markov predictor on the corpus training windows
    Train {
        /// Additive smoothing for transition counts
        #[arg(long, default_value = "1.0")]
        alpha: f64,
    },

    /// Generate a melody from a seed and write it as MIDI
    Generate {
        /// Space-separated seed tokens, e.g. "55 _ 57 _ 59 _ 60 _ _ _"
        #[arg(short, long)]
        seed: String,

        /// Maximum number of tokens to sample
        #[arg(short = 'n', long)]
        steps: Option<usize>,

        /// Context ids shown to the predictor (0 = unbounded)
        #[arg(long)]
        max_sequence_length: Option<usize>,

        /// Sampling temperature (> 0)
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Fixed RNG seed for reproducible output
        #[arg(long)]
        rng_seed: Option<u64>,

        /// MIDI output file
        #[arg(short, long, default_value = "mel.mid")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load(cli.config.as_deref());
    let dataset = &config.dataset;

    let save_dir = resolve_data_path(&dataset.save_dir);
    let file_dataset = resolve_data_path(&dataset.single_file_dataset);
    let mapping_path = resolve_data_path(&dataset.mapping_path);
    let model_path = resolve_data_path(&config.generation.model_path);

    match cli.command {
        Commands::Preprocess { songs_dir, save_dir: out_dir, jobs } => {
            // Resolve songs dir: CLI arg > config songs_dir
            let songs_dir = match songs_dir.or_else(|| dataset.songs_dir.clone()) {
                Some(dir) => dir,
                None => anyhow::bail!(
                    "No songs directory. Pass it as an argument or set dataset.songs_dir in config."
                ),
            };
            let out_dir = out_dir.unwrap_or(save_dir);
            let workers = if jobs > 0 { jobs } else { config.resolve_workers() };

            let result = melodyseq::preprocess::preprocess(&songs_dir, &out_dir, dataset, workers)
                .context("Preprocessing failed")?;
            println!(
                "Preprocess complete: {} loaded, {} encoded, {} skipped, {} errors",
                result.loaded, result.encoded, result.skipped, result.errors
            );
        }

        Commands::Corpus => {
            let songs = corpus::write_single_file_dataset(
                &save_dir,
                &file_dataset,
                dataset.sequence_length,
            )
            .context("Failed to assemble corpus")?;
            let tokens = parse_tokens(&songs).context("Corpus contains an invalid token")?;

            let vocabulary = Vocabulary::build(&tokens);
            vocabulary
                .save(&mapping_path)
                .context("Failed to save vocabulary")?;

            let windows = tokens.len().saturating_sub(dataset.sequence_length);
            println!(
                "Corpus complete: {} tokens, {} vocabulary entries, {} training windows",
                tokens.len(),
                vocabulary.len(),
                windows
            );
            println!("Corpus: {}", file_dataset.display());
            println!("Vocabulary: {}", mapping_path.display());
        }

        Commands::Train { alpha } => {
            let vocabulary = Vocabulary::load(&mapping_path).context("Failed to load vocabulary")?;
            let songs = corpus::load_single_file_dataset(&file_dataset)
                .context("Failed to load corpus")?;
            let ids = corpus::convert_songs_to_int(&songs, &vocabulary)
                .context("Corpus does not match vocabulary; rebuild with `melodyseq corpus`")?;
            let windows = corpus::generate_training_sequences(&ids, dataset.sequence_length);

            let model = MarkovPredictor::fit(&windows, vocabulary.len(), alpha)
                .context("Training windows do not match vocabulary")?;
            model.save(&model_path).context("Failed to save model")?;
            println!(
                "Training complete: {} windows, model saved to {}",
                windows.len(),
                model_path.display()
            );
        }

        Commands::Generate {
            seed,
            steps,
            max_sequence_length,
            temperature,
            rng_seed,
            output,
        } => {
            let generation = &config.generation;
            let vocabulary = Vocabulary::load(&mapping_path).context("Failed to load vocabulary")?;
            let model = MarkovPredictor::load(&model_path).context("Failed to load model")?;
            let seed = parse_tokens(&seed).context("Invalid seed")?;

            let mut rng = match rng_seed.or(generation.rng_seed) {
                Some(s) => Pcg32::seed_from_u64(s),
                None => Pcg32::from_entropy(),
            };

            let generator = MelodyGenerator::new(&model, &vocabulary, dataset.sequence_length);
            let melody = generator
                .generate(
                    &seed,
                    steps.unwrap_or(generation.num_steps),
                    max_sequence_length.unwrap_or(generation.max_sequence_length),
                    temperature.unwrap_or(generation.temperature),
                    &mut rng,
                )
                .context("Generation failed")?;
            println!("{}", join_tokens(&melody));

            let events = decode_melody(&melody, generation.step_duration)
                .context("Failed to decode melody")?;
            melodyseq::midi::write_midi(&events, &output, generation.tempo_bpm)
                .context("Failed to write MIDI")?;
            println!(
                "Generated {} tokens ({} notes/rests) -> {}",
                melody.len(),
                events.len(),
                output.display()
            );
        }
    }

    Ok(())
}
