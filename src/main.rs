use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use chunkscope::chunking::density::{combined_densities, DensityParams};
use chunkscope::chunking::fixed::chunk_string_with_overlap;
use chunkscope::chunking::select::{select_max_metric_chunks, GapPolicy};
use chunkscope::chunking::sentences::{split_and_reconstitute, SentenceWindowParams};
use chunkscope::config::{Config, EmbedderBackend};
use chunkscope::corpus;
use chunkscope::embedding::{self, AzureEmbedder, Embedder, OnnxEmbedder};
use chunkscope::eval::{self, AnswerMetric, AnswerSimilarity, ContextOverlap};
use chunkscope::llm::AzureChatModel;
use chunkscope::output::terminal;
use chunkscope::rag::{self, ChunkRecord, InMemoryIndex};
use chunkscope::text::UnicodeSplitter;
use chunkscope::topics::discovery::{embed_topics, TfIdfExtractor};
use chunkscope::topics::labels::label_topics;
use chunkscope::topics::similarity::{rank_chunks, DEFAULT_EMBED_BATCH};
use chunkscope::topics::traits::TopicExtractor;
use chunkscope::topics::TopicSet;

/// chunkscope: topic-density chunking and RAG chunking-strategy evaluation.
///
/// Chunks a corpus by fixed word windows or by topical density, generates
/// synthetic QA sets, and scores retrieval-augmented answers.
#[derive(Parser)]
#[command(name = "chunkscope", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the documents come from.
#[derive(Args)]
struct CorpusArgs {
    /// CSV file holding the documents
    #[arg(long)]
    input: PathBuf,

    /// Text column to read (ignored with --reviews)
    #[arg(long, default_value = "text")]
    column: String,

    /// Treat the input as a reviews CSV and build "Title: ..; Content: .." texts
    #[arg(long)]
    reviews: bool,

    /// Number of reviews to sample (with --reviews)
    #[arg(long, default_value = "1000")]
    sample_size: usize,

    /// Sampling seed (with --reviews)
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Drop documents whose word count is above this percentile (0-1)
    #[arg(long)]
    max_percentile: Option<f64>,

    /// Strip \usepackage{...} directives from every document
    #[arg(long)]
    strip_latex: bool,
}

/// Sentence window sizes.
#[derive(Args)]
struct WindowArgs {
    #[arg(long, default_value = "1")]
    min_sentences: usize,

    #[arg(long, default_value = "3")]
    max_sentences: usize,

    #[arg(long, default_value = "1")]
    increment: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk documents greedily by topic density and write the density table
    Densities {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Topic set JSON (from discover-topics)
        #[arg(long)]
        topics: PathBuf,

        #[arg(long, default_value = "20")]
        min_substring: usize,

        #[arg(long, default_value = "50")]
        max_substring: usize,

        #[arg(long, default_value = "10")]
        overlap: usize,

        #[arg(long, default_value = "5")]
        increment: usize,

        /// Write the table as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Enumerate every sentence window of every document
    SentenceChunks {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        windows: WindowArgs,

        /// Write the chunks as JSON
        #[arg(long)]
        output: PathBuf,
    },

    /// Split documents into fixed word windows with overlap
    FixedChunks {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, default_value = "100")]
        chunk_length: usize,

        #[arg(long, default_value = "20")]
        overlap: usize,

        /// Write the chunks as JSON
        #[arg(long)]
        output: PathBuf,
    },

    /// Rank sentence windows by topic similarity and select a non-overlapping cover
    Select {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        windows: WindowArgs,

        /// Topic set JSON; topics without vectors are embedded first
        #[arg(long)]
        topics: PathBuf,

        /// Fail instead of truncating when a document cannot be covered
        #[arg(long)]
        strict: bool,

        #[arg(long, default_value_t = DEFAULT_EMBED_BATCH)]
        batch_size: usize,

        /// Write the selected chunks as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Discover topics with TF-IDF, optionally labelling and embedding them
    DiscoverTopics {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, default_value = "10")]
        max_topics: usize,

        #[arg(long, default_value = "60")]
        top_keywords: usize,

        /// Name topics with the labelling model (LABELLING_MODEL)
        #[arg(long)]
        label: bool,

        /// Attach topic vectors from the configured embedder
        #[arg(long)]
        embed: bool,

        /// Labelling requests in flight at once
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Write the topic set as JSON
        #[arg(long)]
        output: PathBuf,
    },

    /// Generate synthetic question/answer pairs (GEN_STEP_MODEL)
    GenerateQa {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Write the QA pairs as JSON
        #[arg(long)]
        output: PathBuf,
    },

    /// Answer a question from indexed chunks
    Ask {
        question: String,

        /// Chunk JSON (from fixed-chunks, sentence-chunks or select)
        #[arg(long)]
        chunks: PathBuf,

        #[arg(long, default_value_t = rag::retrieval::DEFAULT_TOP_K)]
        top_k: usize,
    },

    /// Answer every QA question from indexed chunks and score the answers
    Evaluate {
        /// QA pairs JSON (from generate-qa)
        #[arg(long)]
        qa: PathBuf,

        /// Chunk JSON (from fixed-chunks, sentence-chunks or select)
        #[arg(long)]
        chunks: PathBuf,

        #[arg(long, default_value_t = rag::retrieval::DEFAULT_TOP_K)]
        top_k: usize,

        /// Also write the evaluation records (question, ground_truth, answer, contexts)
        #[arg(long)]
        records: Option<PathBuf>,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Score an existing evaluation set without answering again
    Score {
        /// Evaluation records JSON (question, ground_truth, answer, contexts)
        #[arg(long)]
        records: PathBuf,

        /// Write the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Download the local sentence embedding model (~90 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chunkscope=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Densities {
            corpus,
            topics,
            min_substring,
            max_substring,
            overlap,
            increment,
            output,
        } => {
            let docs = load_corpus(&corpus)?;
            let topics = TopicSet::load(&topics)?;
            let params = DensityParams::new(min_substring, max_substring, overlap, increment);

            let table = combined_densities(&docs, &topics, params, &UnicodeSplitter)?;
            terminal::display_density_table(&table, 20);

            if let Some(path) = output {
                table.save_csv(&path)?;
                println!("\nDensity table written to {}", path.display());
            }
        }

        Commands::SentenceChunks {
            corpus,
            windows,
            output,
        } => {
            let docs = load_corpus(&corpus)?;
            let chunks = split_and_reconstitute(&docs, &UnicodeSplitter, window_params(&windows))?;
            println!("Reconstituted {} sentence windows from {} documents", chunks.len(), docs.len());
            write_json(&chunks, &output)?;
        }

        Commands::FixedChunks {
            corpus,
            chunk_length,
            overlap,
            output,
        } => {
            let docs = load_corpus(&corpus)?;
            let mut chunks = Vec::new();
            for doc in &docs {
                let doc_id = Uuid::new_v4().to_string();
                for text in chunk_string_with_overlap(doc, chunk_length, overlap)? {
                    chunks.push(ChunkRecord {
                        doc_id: doc_id.clone(),
                        chunk_id: Uuid::new_v4().to_string(),
                        text,
                    });
                }
            }
            println!("Split {} documents into {} fixed chunks", docs.len(), chunks.len());
            write_json(&chunks, &output)?;
        }

        Commands::Select {
            corpus,
            windows,
            topics,
            strict,
            batch_size,
            output,
        } => {
            let config = Config::load()?;
            config.require_embedder()?;
            let embedder = create_embedder(&config)?;

            let docs = load_corpus(&corpus)?;
            let mut topics = TopicSet::load(&topics)?;
            if !topics.has_vectors() {
                println!("Embedding topic terms...");
                embed_topics(&mut topics, embedder.as_ref()).await?;
            }

            let chunks = split_and_reconstitute(&docs, &UnicodeSplitter, window_params(&windows))?;
            println!("Ranking {} sentence windows...", chunks.len());
            let ranked = rank_chunks(chunks, embedder.as_ref(), &topics, batch_size).await?;

            let policy = if strict { GapPolicy::Strict } else { GapPolicy::Truncate };
            let report = select_max_metric_chunks(&ranked, policy)?;
            terminal::display_selection(&report);

            if let Some(path) = output {
                write_json(&report.chunks, &path)?;
            }
        }

        Commands::DiscoverTopics {
            corpus,
            max_topics,
            top_keywords,
            label,
            embed,
            concurrency,
            output,
        } => {
            let config = Config::load()?;
            let docs = load_corpus(&corpus)?;

            let extractor = TfIdfExtractor {
                top_n_keywords: top_keywords,
                max_topics,
                ..TfIdfExtractor::default()
            };
            let mut topics = extractor.extract(&docs)?;

            if embed {
                config.require_embedder()?;
                let embedder = create_embedder(&config)?;
                embed_topics(&mut topics, embedder.as_ref()).await?;
            }

            if label {
                let endpoint = config.require_azure()?;
                let model = AzureChatModel::new(&endpoint, config.require_labelling_model()?)?;
                topics = label_topics(topics, &model, concurrency).await?;
            }

            terminal::display_topics(&topics);
            topics.save(&output)?;
            println!("\nTopic set written to {}", output.display());
        }

        Commands::GenerateQa {
            corpus,
            concurrency,
            output,
        } => {
            let config = Config::load()?;
            let endpoint = config.require_azure()?;
            let model = AzureChatModel::new(&endpoint, config.require_gen_step_model()?)?;

            let docs = load_corpus(&corpus)?;
            let pairs = rag::qa::generate_qa_pairs(&docs, &model, concurrency).await;

            terminal::display_qa_pairs(&pairs, 10);
            rag::qa::save_qa_pairs(&pairs, &output)?;
            println!("\nQA pairs written to {}", output.display());
        }

        Commands::Ask {
            question,
            chunks,
            top_k,
        } => {
            let config = Config::load()?;
            let endpoint = config.require_azure()?;
            let model = AzureChatModel::new(&endpoint, config.require_gen_step_model()?)?;
            config.require_embedder()?;
            let index = build_index(&config, &chunks).await?;

            let answer = rag::ask(&question, &model, &index, top_k).await?;
            terminal::display_answer(&question, &answer);
        }

        Commands::Evaluate {
            qa,
            chunks,
            top_k,
            records,
            output,
        } => {
            let config = Config::load()?;
            let endpoint = config.require_azure()?;
            let model = AzureChatModel::new(&endpoint, config.require_gen_step_model()?)?;
            config.require_embedder()?;

            let pairs = rag::qa::load_qa_pairs(&qa)?;
            let index = build_index(&config, &chunks).await?;

            println!("Answering {} questions...", pairs.len());
            let eval_records = eval::build_records(&pairs, &model, &index, top_k).await;
            if let Some(path) = records {
                eval::save_records(&eval_records, &path)?;
            }

            score_records(&config, &eval_records, output.as_deref()).await?;
        }

        Commands::Score { records, output } => {
            let config = Config::load()?;
            config.require_embedder()?;

            let eval_records = eval::load_records(&records)?;
            println!("Loaded {} evaluation records", eval_records.len());
            score_records(&config, &eval_records, output.as_deref()).await?;
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading sentence embedding model...");
            println!("  Destination: {}", model_dir.display());

            embedding::download::download_embedding_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `chunkscope select` or `chunkscope evaluate`.");
        }
    }

    Ok(())
}

fn window_params(args: &WindowArgs) -> SentenceWindowParams {
    SentenceWindowParams::new(args.min_sentences, args.max_sentences, args.increment)
}

/// Load documents and apply the requested cleanup.
fn load_corpus(args: &CorpusArgs) -> Result<Vec<String>> {
    let mut docs = if args.reviews {
        corpus::load_and_sample(&args.input, args.sample_size, args.seed)?
            .into_iter()
            .map(|r| r.combined)
            .collect()
    } else {
        corpus::load_text_column(&args.input, &args.column)?
    };

    if args.strip_latex {
        docs = docs
            .iter()
            .map(|d| corpus::remove_latex_packages(d))
            .collect();
    }

    if let Some(percentile) = args.max_percentile {
        let (kept, outliers) = corpus::remove_over_percentile(
            docs,
            |d: &String| d.split_whitespace().count() as f64,
            percentile,
        )?;
        info!(kept = kept.len(), outliers = outliers.len(), "Removed long documents");
        docs = kept;
    }

    if docs.is_empty() {
        anyhow::bail!("No documents loaded from {}", args.input.display());
    }
    println!("Loaded {} documents from {}", docs.len(), args.input.display());
    Ok(docs)
}

/// Create the configured embedder. Call `require_embedder` first.
fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedder_backend {
        EmbedderBackend::Onnx => {
            let dir = embedding::download::embedding_model_dir(&config.model_dir);
            Ok(Arc::new(OnnxEmbedder::load(&dir)?))
        }
        EmbedderBackend::Azure => {
            let endpoint = config.require_azure()?;
            Ok(Arc::new(AzureEmbedder::new(&endpoint, &config.embedding_deployment)?))
        }
    }
}

async fn build_index(config: &Config, chunks: &Path) -> Result<InMemoryIndex> {
    let records = rag::load_chunks(chunks)?;
    println!("Indexing {} chunks...", records.len());
    let embedder = create_embedder(config)?;
    let name = chunks
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunks".to_string());
    Ok(InMemoryIndex::from_chunks(name, embedder, records).await?)
}

/// Run every metric over the records and display the report.
async fn score_records(config: &Config, records: &[eval::EvalRecord], output: Option<&Path>) -> Result<()> {
    let metrics: Vec<Box<dyn AnswerMetric>> = vec![
        Box::new(AnswerSimilarity::new(create_embedder(config)?)),
        Box::new(ContextOverlap),
    ];
    let report = eval::evaluate(records, &metrics).await;
    terminal::display_eval_report(&report);

    if let Some(path) = output {
        write_json(&report, path)?;
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Written to {}", path.display());
    Ok(())
}
