use std::sync::Arc;
use therapist_match::config::Settings;
use therapist_match::core::Matcher;
use therapist_match::services::{CachedSource, InMemorySource, SnapshotSource};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Rank every fixture therapist for every fixture client and print the outcome as JSON
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    let fixture = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            error!("Usage: therapist-match <fixture.json>");
            return Err("missing fixture path".into());
        }
    };

    let memory = InMemorySource::from_fixture(&fixture)?;
    let client_ids = memory.client_ids();
    let therapists = memory.therapists();

    info!(
        fixture = %fixture,
        clients = client_ids.len(),
        therapists = therapists.len(),
        "Fixture loaded"
    );

    let mut source: Arc<dyn SnapshotSource> = Arc::new(memory);
    if settings.cache.enabled {
        source = Arc::new(CachedSource::new(
            source,
            settings.cache.capacity,
            settings.cache.ttl_secs,
        ));
        info!(
            "Snapshot cache enabled ({} entries, TTL: {}s)",
            settings.cache.capacity, settings.cache.ttl_secs
        );
    }

    let matcher = Matcher::with_stated_preferences(source, settings.matcher_settings());

    let mut rankings = serde_json::Map::new();
    for client_id in client_ids {
        match matcher.rank(&client_id, therapists.clone(), None).await {
            Ok(outcome) => {
                rankings.insert(client_id, serde_json::to_value(outcome)?);
            }
            Err(e) => {
                error!(client_id = %client_id, error = %e, "Ranking failed");
                rankings.insert(client_id, serde_json::json!({ "error": e.to_string() }));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&rankings)?);
    Ok(())
}
