use std::path::{Path, PathBuf};
use std::sync::Arc;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use translatron::{
    Result,
    TranslatronConfig,
    service::{handler::error_reply, RequestHandler},
    storage::{create_storage, LMDBStorage},
    utils::init_logging,
};

/// Query an index built by index_corpus
#[derive(Debug, Parser)]
#[command(name = "find_mentions", version)]
struct Args {
    /// INI configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index directory, overrides [storage] db_path
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find entity mentions in the given text
    Ner { text: Vec<String> },
    /// Prefix search over the document index
    Search { query: Vec<String> },
    /// Look up entities by one whole alias
    Entity { term: String },
    /// Answer JSON requests read line by line from stdin
    Serve,
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

async fn run_request(handler: &RequestHandler<LMDBStorage>, request: Value) -> Result<()> {
    if let Some(reply) = handler.handle_value(request).await? {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    }
    Ok(())
}

async fn serve(handler: &RequestHandler<LMDBStorage>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut served = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match handler.handle(&line).await {
            Ok(Some(reply)) => reply,
            Ok(None) => continue,
            Err(e) => {
                warn!("Request failed: {}", e);
                let request: Option<Value> = serde_json::from_str(&line).ok();
                serde_json::to_string(&error_reply(request.as_ref().and_then(Value::as_object), &e))?
            }
        };
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        served += 1;
    }

    info!("Input closed after {} replies", served);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config.logging, "find_mentions")?;

    let storage = Arc::new(create_storage(&config.storage.db_path, config.storage.clone())?);
    let handler = RequestHandler::new(storage, &config)?;

    let outcome = match args.command {
        Command::Ner { text } => {
            run_request(&handler, serde_json::json!({"qtype": "ner", "query": text.join(" ")})).await
        }
        Command::Search { query } => {
            run_request(&handler, serde_json::json!({"qtype": "docsearch", "term": query.join(" ")})).await
        }
        Command::Entity { term } => {
            run_request(&handler, serde_json::json!({"qtype": "entitysearch", "term": term})).await
        }
        Command::Serve => serve(&handler).await,
    };

    if let Err(e) = &outcome {
        error!("find_mentions failed: {}", e);
    }
    outcome
}
