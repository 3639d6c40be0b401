use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kabar::config::DEFAULT_TIMEOUT_SECS;
use kabar::{
    report, ArticleRetriever, ArtifactPaths, ArtifactSet, ArtifactStore, Classifier, KabarConfig,
    Pipeline, PipelineError, RetrieverConfig,
};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding model_klasifikasi.json and tfidf_vectorizer.json
    #[arg(long, env = "KABAR_MODELS_DIR", global = true)]
    models_dir: Option<PathBuf>,

    /// Path to the model artifact, overriding --models-dir
    #[arg(long, env = "KABAR_MODEL_PATH", global = true)]
    model: Option<PathBuf>,

    /// Path to the vectorizer artifact, overriding --models-dir
    #[arg(long, env = "KABAR_VECTORIZER_PATH", global = true)]
    vectorizer: Option<PathBuf>,

    /// Timeout for fetching an article, in seconds
    #[arg(long, env = "KABAR_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout_secs: u64,

    /// Extra attempts when fetching an article hits a network error
    #[arg(long, env = "KABAR_RETRIES", default_value_t = 0, global = true)]
    retries: u32,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a headline or the article behind a URL
    Classify {
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },
    /// Read one headline or URL per line until EOF or `:q`
    Interactive,
    /// List the categories known to the model
    Categories,
    /// Print artifact checksums and compare them to expected values
    Verify {
        #[arg(long)]
        model_sha256: Option<String>,
        #[arg(long)]
        vectorizer_sha256: Option<String>,
    },
}

impl Args {
    fn config(&self) -> KabarConfig {
        KabarConfig {
            artifacts: ArtifactPaths::resolve(
                self.models_dir.clone(),
                self.model.clone(),
                self.vectorizer.clone(),
            ),
            retriever: RetrieverConfig {
                timeout: Duration::from_secs(self.timeout_secs),
                max_retries: self.retries,
                ..RetrieverConfig::default()
            },
        }
    }
}

const EXIT_FAILURE: u8 = 1;
const EXIT_ARTIFACTS_MISSING: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args.config();
    let store = ArtifactStore::new(config.artifacts.clone());

    match args.command.unwrap_or(Command::Interactive) {
        Command::Verify {
            model_sha256,
            vectorizer_sha256,
        } => Ok(verify(&store, model_sha256.as_deref(), vectorizer_sha256.as_deref())),
        Command::Categories => {
            let Some(classifier) = load_classifier(&store) else {
                return Ok(ExitCode::from(EXIT_ARTIFACTS_MISSING));
            };
            let categories = classifier.artifacts().categories().unwrap_or_default();
            if args.json {
                println!("{}", serde_json::to_string_pretty(categories)?);
            } else {
                print!("{}", report::render_categories(categories));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Classify { input } => {
            let Some(classifier) = load_classifier(&store) else {
                return Ok(ExitCode::from(EXIT_ARTIFACTS_MISSING));
            };
            let retriever = ArticleRetriever::new(config.retriever)
                .context("failed to build HTTP client")?;
            let pipeline = Pipeline::new(classifier, retriever);
            let ok = process_input(&pipeline, &input.join(" "), args.json).await?;
            Ok(if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILURE)
            })
        }
        Command::Interactive => {
            let Some(classifier) = load_classifier(&store) else {
                return Ok(ExitCode::from(EXIT_ARTIFACTS_MISSING));
            };
            let retriever = ArticleRetriever::new(config.retriever)
                .context("failed to build HTTP client")?;
            let pipeline = Pipeline::new(classifier, retriever);
            interactive(&pipeline, args.json).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads the artifacts once; reports and returns `None` when they are unusable.
fn load_classifier(store: &ArtifactStore) -> Option<Classifier> {
    let start_time = Instant::now();
    match store.load_set() {
        ArtifactSet::NotLoaded { reason } => {
            let paths = store.paths();
            eprintln!(
                "Failed to load model. Make sure '{}' and '{}' exist.",
                paths.model.display(),
                paths.vectorizer.display()
            );
            eprintln!("Cause: {}", reason);
            None
        }
        loaded => {
            info!("Artifacts ready (took {:.2?})", start_time.elapsed());
            Some(Classifier::new(loaded))
        }
    }
}

/// Runs one input through the pipeline and prints the outcome. Returns whether it succeeded.
async fn process_input(pipeline: &Pipeline, input: &str, json: bool) -> Result<bool> {
    match pipeline.run(input).await {
        Ok(analysis) => {
            if json {
                println!("{}", report::render_json(&analysis)?);
            } else {
                print!("{}", report::render_text(&analysis));
            }
            Ok(true)
        }
        Err(PipelineError::EmptyInput) => {
            eprintln!("Warning: {}", PipelineError::EmptyInput);
            Ok(false)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(false)
        }
    }
}

async fn interactive(pipeline: &Pipeline, json: bool) -> Result<()> {
    if let Some(categories) = pipeline.classifier().artifacts().categories() {
        eprintln!("Known categories: {}", categories.join(", "));
    }
    eprintln!("Enter a news headline or paste a URL (:q to quit).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), ":q" | ":quit") {
            break;
        }
        let classify_start = Instant::now();
        process_input(pipeline, &line, json).await?;
        info!("Request handled in {:.2?}", classify_start.elapsed());
        if !json {
            println!();
        }
    }
    Ok(())
}

fn verify(
    store: &ArtifactStore,
    model_sha256: Option<&str>,
    vectorizer_sha256: Option<&str>,
) -> ExitCode {
    let paths = store.paths();
    let mut all_ok = true;
    for (path, expected) in [(&paths.model, model_sha256), (&paths.vectorizer, vectorizer_sha256)] {
        let check = match store.check_file(path, expected) {
            Ok(check) => check,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ARTIFACTS_MISSING);
            }
        };
        match check.matches {
            Some(ok) => {
                all_ok &= ok;
                println!(
                    "{}  {}  {}",
                    check.digest,
                    check.path.display(),
                    if ok { "OK" } else { "MISMATCH" }
                );
            }
            None => println!("{}  {}", check.digest, check.path.display()),
        }
    }
    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}
