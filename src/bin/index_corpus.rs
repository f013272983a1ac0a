use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::de::DeserializeOwned;
use translatron::{
    Result,
    TranslatronConfig,
    indexer::{DocumentIndexer, EntityIndexer, IndexingStats},
    parser::DocumentTokenizer,
    storage::{create_storage, IndexLevel, LMDBStorage, StorageBackend},
    types::{Document, Entity},
    utils::init_logging,
};

/// Build the entity and document index from JSON-lines files
#[derive(Debug, Parser)]
#[command(name = "index_corpus", version)]
struct Args {
    /// INI configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index directory, overrides [storage] db_path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Entity files, one JSON object per line
    #[arg(short, long)]
    entities: Vec<PathBuf>,

    /// Document files, one JSON object per line
    #[arg(short, long)]
    documents: Vec<PathBuf>,

    /// Print the posting count of every token, rarest first, for tuning the stop word list
    #[arg(long)]
    statistics: bool,
}

fn load_config(args: &Args) -> Result<TranslatronConfig> {
    let mut config = match &args.config {
        Some(path) => TranslatronConfig::from_ini(path)?,
        None if Path::new("translatron.ini").exists() => TranslatronConfig::from_ini("translatron.ini")?,
        None => TranslatronConfig::default(),
    };
    if let Some(db) = &args.db {
        config.storage.db_path = db.clone();
    }
    Ok(config)
}

fn progress_for(path: &Path) -> Result<ProgressBar> {
    let size = fs::metadata(path)?.len();
    let progress = ProgressBar::new(size);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress.set_message(path.display().to_string());
    Ok(progress)
}

/// Stream `path` in batches of `batch_size` records into `index_batch`
fn ingest<T, F>(path: &Path, batch_size: usize, mut index_batch: F) -> Result<IndexingStats>
where
    T: DeserializeOwned,
    F: FnMut(&[T]) -> Result<IndexingStats>,
{
    let progress = progress_for(path)?;
    let reader = BufReader::new(File::open(path)?);
    let mut batch = Vec::with_capacity(batch_size);
    let mut stats = IndexingStats::default();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        progress.inc(line.len() as u64 + 1);
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => batch.push(record),
            Err(e) => {
                warn!("{}:{}: skipping unreadable record: {}", path.display(), line_num + 1, e);
                stats.skipped += 1;
                continue;
            }
        }
        if batch.len() >= batch_size {
            stats.merge(index_batch(&batch)?);
            batch.clear();
        }
    }
    if !batch.is_empty() {
        stats.merge(index_batch(&batch)?);
    }

    progress.finish_with_message(format!("{}: {} records", path.display(), stats.records));
    Ok(stats)
}

/// Levels reported by `--statistics`: the document index, then the entity index
const STATISTICS_LEVELS: [(&str, &[IndexLevel]); 2] = [
    ("Document index", &IndexLevel::DOCUMENT_LEVELS),
    ("Entity index", &[IndexLevel::Aliases, IndexLevel::CiAliases]),
];

fn print_token_frequencies<S: StorageBackend + ?Sized>(storage: &S) -> Result<()> {
    for (title, levels) in STATISTICS_LEVELS {
        println!("{}:", title);
        for level in levels {
            let counts = storage.token_frequencies(*level)?;
            println!("  [{}] {} tokens", level.as_str(), counts.len());
            for (token, count) in counts {
                println!("  {:>10}  {}", count, token);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config.logging, "index_corpus")?;

    if args.entities.is_empty() && args.documents.is_empty() && !args.statistics {
        warn!("Nothing to do: pass --entities, --documents or --statistics");
        return Ok(());
    }

    let start_time = Instant::now();
    let storage: Arc<LMDBStorage> = Arc::new(create_storage(&config.storage.db_path, config.storage.clone())?);
    let batch_size = config.storage.batch_size.max(1);

    let entity_indexer = EntityIndexer::new(Arc::clone(&storage));
    for path in &args.entities {
        info!("Indexing entities from {:?}", path);
        let stats = ingest::<Entity, _>(path, batch_size, |batch| entity_indexer.index_entities(batch))?;
        info!("{:?}: {} entities, {} postings, {} skipped", path, stats.records, stats.postings, stats.skipped);
    }

    if !args.documents.is_empty() {
        let tokenizer = DocumentTokenizer::new(&config.parser)?;
        info!("Document tokenizer: {}", config.parser.describe());
        let document_indexer = DocumentIndexer::new(Arc::clone(&storage), tokenizer);
        for path in &args.documents {
            info!("Indexing documents from {:?}", path);
            let stats = ingest::<Document, _>(path, batch_size, |batch| document_indexer.index_documents(batch))?;
            info!("{:?}: {} documents, {} postings, {} skipped", path, stats.records, stats.postings, stats.skipped);
        }
    }

    let stats = storage.get_stats()?;
    println!("Index at {}:", config.storage.db_path.display());
    for (level, tokens) in &stats.tokens_per_level {
        println!("  {:<10} {:>10} tokens", level.as_str(), tokens);
    }
    println!("  {} postings, {} entities, {} documents", stats.total_postings, stats.total_entities, stats.total_documents);
    if args.statistics {
        print_token_frequencies(&*storage)?;
    }
    println!("Finished in {:?}", start_time.elapsed());

    drop(entity_indexer);
    match Arc::try_unwrap(storage) {
        Ok(mut storage) => storage.close()?,
        Err(_) => warn!("Storage still shared at exit; skipping explicit close"),
    }
    Ok(())
}
