use anyhow::Context;
use recommendation_engine::models::{RecommendRequest, RecommendResponse};
use recommendation_engine::{EngineBuilder, EngineConfig, Result};
use serde_json::json;
use std::io::Read;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Initialize tracing; stdout carries the JSON response, so logs go
    // to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let payload = match read_payload() {
        Ok(payload) => payload,
        Err(e) => {
            error!("failed to read request: {}", e);
            println!("{}", error_body(&format!("failed to read request: {}", e)));
            return;
        }
    };

    let output = match run(&payload) {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(value) => value,
            Err(e) => error_body(&format!("failed to encode response: {}", e)),
        },
        Err(e) => {
            error!("recommendation failed: {}", e);
            error_body(&e.to_string())
        }
    };

    println!("{}", output);
}

/// The request arrives as a single JSON document: `argv[1]` when small
/// enough, stdin otherwise.
fn read_payload() -> anyhow::Result<String> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg);
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read request from stdin")?;
    Ok(buffer)
}

fn run(payload: &str) -> Result<RecommendResponse> {
    let request: RecommendRequest = serde_json::from_str(payload)?;
    let config = EngineConfig::from_env();

    info!(
        tracks = request.tracks_data.len(),
        context = %request.context,
        limit = request.limit,
        "request received"
    );

    let RecommendRequest {
        tracks_data,
        user_data,
        context,
        limit,
    } = request;

    let engine = EngineBuilder::new(config).build(tracks_data)?;
    Ok(engine.recommend(&user_data, &context, limit))
}

fn error_body(message: &str) -> serde_json::Value {
    json!({
        "error": message,
        "tracks": [],
        "insights": {},
    })
}
