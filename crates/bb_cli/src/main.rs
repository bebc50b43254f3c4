use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bb_book::{AssemblerConfig, Assembly, BookOrganizer, ChapterAssembler};
use bb_core::{Article, ArticleStorage, Category, Error, Level, Result, TextAnalyzer};
use bb_inference::{create_generator, AssignmentMode, Classifier, ClusterConfig, LexicalAnalyzer, QuestionConfig, TopicClusterer};
use bb_scrapers::{init_logging, run_discover, run_scrape, DiscoverArgs, ScrapeArgs};
use bb_storage::{create_storage, StorageConfig, StorageKind};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Harvest a blog and assemble it into a chaptered book", long_about = None)]
struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    storage: StorageKind,
    /// Directory holding one database per session
    #[arg(long, default_value = "data/sessions")]
    data_dir: PathBuf,
    /// Session to use. Scrape and run start a new one when omitted.
    #[arg(long)]
    session: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the article URLs reachable from a seed page
    Discover(DiscoverArgs),
    /// Discover, extract, classify and store articles
    Scrape(ScrapeArgs),
    /// Cluster stored articles and write the chapter structure
    Generate(GenerateArgs),
    /// Scrape, then generate
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
        #[command(flatten)]
        generate: GenerateArgs,
    },
    /// Article counts per category, level and chapter
    Stats,
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// Where to write the chapter JSON. Defaults to <data-dir>/<session>.book.json
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 5)]
    clusters: usize,
    /// How articles join chapters: containment or cluster
    #[arg(long, default_value = "containment")]
    assignment: AssignmentMode,
    #[arg(long, default_value_t = 3)]
    quizzes: usize,
}

impl Cli {
    fn session_config(&self, allow_new: bool) -> Result<StorageConfig> {
        match (&self.session, allow_new) {
            (Some(id), _) => Ok(StorageConfig::new(&self.data_dir, id.clone())),
            (None, true) => Ok(StorageConfig::new_session(&self.data_dir)),
            (None, false) => Err(Error::Validation("--session is required for this command".to_string())),
        }
    }
}

async fn generate(
    storage: Arc<dyn ArticleStorage>,
    analyzer: Arc<dyn TextAnalyzer>,
    args: &GenerateArgs,
    output: &Path,
) -> Result<Assembly> {
    let clusterer = TopicClusterer::new(ClusterConfig {
        clusters: args.clusters.max(1),
        mode: args.assignment,
        ..ClusterConfig::default()
    });
    let questions = create_generator(&QuestionConfig::from_env())?;
    let assembler = ChapterAssembler::new(
        analyzer,
        questions,
        AssemblerConfig {
            quizzes_per_chapter: args.quizzes,
            ..AssemblerConfig::default()
        },
    );

    let assembly = BookOrganizer::new(storage, clusterer, assembler).organize().await?;
    bb_book::write_structure(output, &assembly.structure)?;
    Ok(assembly)
}

#[derive(Debug, Default, PartialEq)]
struct Stats {
    total: usize,
    by_category: BTreeMap<Category, usize>,
    by_level: BTreeMap<Level, usize>,
    by_chapter: BTreeMap<String, usize>,
}

impl Stats {
    fn from_articles(articles: &[Article]) -> Self {
        let mut stats = Stats {
            total: articles.len(),
            ..Stats::default()
        };
        for article in articles {
            *stats.by_category.entry(article.category).or_insert(0) += 1;
            *stats.by_level.entry(article.level).or_insert(0) += 1;
            let chapter = article.chapter.clone().unwrap_or_else(|| "(unassigned)".to_string());
            *stats.by_chapter.entry(chapter).or_insert(0) += 1;
        }
        stats
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Articles: {}", self.total)?;
        writeln!(f, "By category:")?;
        for category in Category::ALL {
            writeln!(f, "  {:<12} {}", category.as_str(), self.by_category.get(&category).unwrap_or(&0))?;
        }
        writeln!(f, "By level:")?;
        for level in Level::ALL {
            writeln!(f, "  {:<12} {}", level.as_str(), self.by_level.get(&level).unwrap_or(&0))?;
        }
        writeln!(f, "By chapter:")?;
        for (chapter, count) in &self.by_chapter {
            writeln!(f, "  {} ({})", chapter, count)?;
        }
        Ok(())
    }
}

fn default_output(config: &StorageConfig) -> PathBuf {
    config.data_dir.join(format!("{}.book.json", config.session_id))
}

async fn run(cli: Cli) -> Result<()> {
    let analyzer: Arc<dyn TextAnalyzer> = Arc::new(LexicalAnalyzer::new());

    match &cli.command {
        Commands::Discover(args) => {
            let urls = run_discover(args).await?;
            for url in &urls {
                println!("{}", url);
            }
            info!("🔍 {} article URLs found", urls.len());
        }
        Commands::Scrape(args) => {
            let config = cli.session_config(true)?;
            let storage = create_storage(cli.storage, &config).await?;
            let classifier = Arc::new(Classifier::new(Arc::clone(&analyzer)));
            let report = run_scrape(args, storage, classifier).await?;
            println!("Session {}: {}", config.session_id, report);
        }
        Commands::Generate(args) => {
            let config = cli.session_config(false)?;
            let storage = create_storage(cli.storage, &config).await?;
            let output = args.output.clone().unwrap_or_else(|| default_output(&config));
            let assembly = generate(storage, analyzer, args, &output).await?;
            println!("{} chapters written to {}", assembly.structure.len(), output.display());
        }
        Commands::Run { scrape, generate: generate_args } => {
            let config = cli.session_config(true)?;
            let storage = create_storage(cli.storage, &config).await?;
            let classifier = Arc::new(Classifier::new(Arc::clone(&analyzer)));
            let report = run_scrape(scrape, Arc::clone(&storage), classifier).await?;
            println!("Session {}: {}", config.session_id, report);

            let output = generate_args.output.clone().unwrap_or_else(|| default_output(&config));
            let assembly = generate(storage, analyzer, generate_args, &output).await?;
            println!("{} chapters written to {}", assembly.structure.len(), output.display());
        }
        Commands::Stats => {
            let config = cli.session_config(false)?;
            let storage = create_storage(cli.storage, &config).await?;
            print!("{}", Stats::from_articles(&storage.all().await?));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let logger = init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        logger.error(&format!("❌ {}", e));
        std::process::exit(1);
    }
}
