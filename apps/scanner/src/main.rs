mod cache;
mod config;
mod errors;
mod history;
mod lookup;
mod models;
mod product_client;
mod products;
mod scan;
mod session;
mod state;

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::history::storage::FileHistoryStorage;
use crate::history::HistoryStore;
use crate::lookup::LookupOrchestrator;
use crate::product_client::{FetchOptions, ProductClient};
use crate::products::ProductService;
use crate::scan::{ScanEvent, ScanGate};
use crate::session::{SessionProvider, StaticSession};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scanner v{}", env!("CARGO_PKG_VERSION"));

    // Hydrate the history store before anything renders it
    let storage = Arc::new(FileHistoryStorage::new(&config.history_path));
    let history = Arc::new(HistoryStore::new(storage));
    history.load().await;
    info!(
        count = history.records().await.len(),
        "history store hydrated"
    );

    // Session boundary: fixed credentials from config
    let session = Arc::new(StaticSession::new(
        config.user.clone(),
        config.api_token.clone(),
    ));
    match session.current_user() {
        Some(user) => info!("session active for {user}"),
        None => info!("anonymous session, requests go out without auth"),
    }

    // Backend client + cache-first read path
    let client = ProductClient::new(
        config.graphql_url.clone(),
        session,
        Duration::from_secs(config.request_timeout_secs),
    );
    let products = Arc::new(ProductService::new(Arc::new(client)));
    info!("product client initialized ({})", config.graphql_url);

    let lookup = LookupOrchestrator::new(Arc::clone(&products), Arc::clone(&history));

    let state = AppState {
        history,
        products,
        lookup,
        config,
    };
    info!(
        history_path = %state.config.history_path,
        "ready for scans"
    );

    run_shell(state).await
}

/// Interactive shell standing in for the capture UI: each entered line is a
/// freshly-armed capture session whose code flows through the scan gate.
async fn run_shell(state: AppState) -> Result<()> {
    println!("enter a barcode to look it up, or a command:");
    println!("  history | reviews <code> | safety <code> | remove <code> | clear | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut gate = ScanGate::new();

    loop {
        print!("scan> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (command, rest) = match input.split_once(' ') {
            Some((head, tail)) => (head, tail.trim()),
            None => (input, ""),
        };

        match command {
            "quit" | "exit" => break,
            "history" => print_history(&state).await,
            "clear" => match state.history.clear().await {
                Ok(()) => println!("history cleared"),
                Err(e) => println!("could not clear history: {e}"),
            },
            "remove" if !rest.is_empty() => match state.history.remove(rest).await {
                Ok(()) => println!("removed {rest}"),
                Err(e) => println!("could not remove {rest}: {e}"),
            },
            "reviews" if !rest.is_empty() => {
                match state.products.get_reviews(rest, &FetchOptions::default()).await {
                    Ok(Some(reviews)) => {
                        println!(
                            "reviews ({}): {}",
                            reviews.sentiment.as_deref().unwrap_or("unrated"),
                            reviews.summary.as_deref().unwrap_or("no summary text")
                        );
                        if let Some(score) = reviews.sentiment_score {
                            println!("  sentiment score: {score:.2}");
                        }
                        for pro in reviews.pros.unwrap_or_default() {
                            println!("  + {pro}");
                        }
                        for con in reviews.cons.unwrap_or_default() {
                            println!("  - {con}");
                        }
                        if let Some(themes) = &reviews.key_themes {
                            if !themes.is_empty() {
                                println!("  themes: {}", themes.join(", "));
                            }
                        }
                        print_provenance(
                            reviews.confidence.as_deref(),
                            reviews.provider.as_deref(),
                            reviews.cached,
                            reviews.generated_at,
                        );
                    }
                    Ok(None) => println!("no review summary available yet for {rest}"),
                    Err(e) => println!("reviews fetch failed: {e} (try again)"),
                }
            }
            "safety" if !rest.is_empty() => {
                match state.products.get_safety(rest, &FetchOptions::default()).await {
                    Ok(Some(safety)) => {
                        println!(
                            "safety ({} risk): {}",
                            safety.risk_level.as_deref().unwrap_or("unknown"),
                            safety.summary.as_deref().unwrap_or("no summary text")
                        );
                        for allergen in safety.allergens.unwrap_or_default() {
                            println!("  ! contains {allergen}");
                        }
                        for cert in safety.certifications.unwrap_or_default() {
                            println!("  certified: {cert}");
                        }
                        for ingredient in safety.harmful_ingredients.unwrap_or_default() {
                            println!("  harmful: {ingredient}");
                        }
                        for recall in safety.recalls.unwrap_or_default() {
                            println!("  recall: {recall}");
                        }
                        if let Some(note) = safety.recommendations.as_deref() {
                            println!("  note: {note}");
                        }
                        print_provenance(
                            safety.confidence.as_deref(),
                            safety.provider.as_deref(),
                            safety.cached,
                            safety.generated_at,
                        );
                    }
                    Ok(None) => println!("no safety analysis available yet for {rest}"),
                    Err(e) => println!("safety fetch failed: {e} (try again)"),
                }
            }
            code => {
                // A fresh prompt is a fresh capture session.
                if !gate.is_armed() {
                    gate.rearm();
                }
                let event = ScanEvent {
                    code: code.to_string(),
                    symbology: "manual".to_string(),
                };
                let Some(event) = gate.offer(event) else {
                    continue;
                };
                debug!(code = %event.code, symbology = %event.symbology, "capture forwarded");
                match state.lookup.lookup(&event.code).await {
                    Ok(outcome) => match outcome.product {
                        Some(product) => {
                            println!(
                                "{} ({})",
                                product.name,
                                product.brand.as_deref().unwrap_or("unknown brand")
                            );
                            if let Some(url) = product.image_url.as_deref() {
                                println!("  image: {url}");
                            }
                        }
                        None => println!("no product matches {}", outcome.code),
                    },
                    Err(e) => println!("lookup failed: {e} (try scanning again)"),
                }
            }
        }
    }

    Ok(())
}

fn print_provenance(
    confidence: Option<&str>,
    provider: Option<&str>,
    cached: Option<bool>,
    generated_at: Option<DateTime<Utc>>,
) {
    let mut parts = Vec::new();
    if let Some(confidence) = confidence {
        parts.push(format!("{confidence} confidence"));
    }
    if let Some(provider) = provider {
        parts.push(format!("via {provider}"));
    }
    if let Some(at) = generated_at {
        parts.push(at.format("%Y-%m-%d").to_string());
    }
    if cached == Some(true) {
        parts.push("cached".to_string());
    }
    if !parts.is_empty() {
        println!("  [{}]", parts.join(", "));
    }
}

async fn print_history(state: &AppState) {
    if !state.history.is_hydrated().await {
        println!("history is still loading");
        return;
    }
    let records = state.history.records().await;
    if records.is_empty() {
        println!("no scans yet");
        return;
    }
    for record in records {
        let when = Utc
            .timestamp_millis_opt(record.observed_at)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "?".to_string());
        match record.product {
            Some(product) => println!("  {when}  {}  {}", record.code, product.name),
            None => println!("  {when}  {}  (no product found)", record.code),
        }
    }
}
