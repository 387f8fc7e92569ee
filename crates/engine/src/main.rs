//! Agora Retrieval CLI
//!
//! Loads the partitioned civic corpus into the in-process engine and runs
//! retrieval queries from the command line (arguments, or stdin when none
//! are given). Prints the retrieval context as JSON, one object per query.

use agora_common::{config::AppConfig, metrics, VERSION};
use agora_engine::{gate::run_with_timeout, Engine};
use serde_json::json;
use std::io::BufRead;
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    // Initialize tracing
    let level: Level = config
        .observability
        .log_level
        .parse()
        .unwrap_or(Level::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Agora retrieval engine v{}", VERSION);
    metrics::register_metrics();

    let timeout = config.query_timeout();
    let engine = Arc::new(Engine::load(config)?);

    for (partition, outcome) in &engine.load_report().outcomes {
        info!(partition = %partition, loaded = outcome.is_loaded(), "Partition outcome");
    }
    let stats = engine.stats();
    info!(
        entities = stats.entity_count,
        edges = stats.edge_count,
        chunks = stats.chunk_count,
        partitions = stats.partition_count,
        memory_estimate_mb = stats.memory_estimate_mb,
        "Corpus loaded"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let queries: Vec<String> = if args.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        vec![args.join(" ")]
    };

    for query in queries {
        let engine = engine.clone();
        let q = query.clone();
        let context =
            run_with_timeout(timeout, async move { Ok(engine.retrieve(&q)) }).await?;

        let output = json!({
            "query": query,
            "seeds": context.selection.seeds.len(),
            "community_seeds": context.selection.community_seed_count,
            "global_seeds": context.selection.global_seed_count,
            "partitions": context.selection.partitions,
            "entities": context.expansion.entities,
            "chunks": context.expansion.chunks,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
