use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use telemetry_dial::control::{ConfigSnapshot, PayloadFormat};
use telemetry_dial::levels::Severity;
use telemetry_dial::sampling::DynamicSampler;

#[derive(Parser)]
#[command(name = "dial-cli")]
#[command(about = "Inspect a running telemetry-dial agent", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Control loop state and override counts
    Status,
    /// Available loggers and active override tables
    Levels,
    /// Current sampling ratio
    Sampler,
    /// Resolved override pair for one logger
    Decision {
        logger: String,
    },
    /// Validate a snapshot file without contacting an agent
    Check {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = match &cli.command {
        Commands::Status => "/admin/status".to_string(),
        Commands::Levels => "/admin/levels".to_string(),
        Commands::Sampler => "/admin/sampler".to_string(),
        Commands::Decision { logger } => format!("/admin/decision/{}", logger),
        Commands::Check { file } => return check(file),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = reqwest::Client::new()
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

fn check(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(file)?;
    let snapshot = ConfigSnapshot::parse(&bytes, PayloadFormat::from_path(file))?;

    let mut problems = 0;
    for (table, entries) in [("logLevels", &snapshot.log_levels), ("samplingLogLevels", &snapshot.sampling_log_levels)] {
        for entry in entries {
            if let Err(e) = entry.level.parse::<Severity>() {
                eprintln!("{}: {}: {}", table, entry.logger, e);
                problems += 1;
            }
        }
    }
    if let Some(ratio) = snapshot.sample_ratio {
        if let Err(e) = DynamicSampler::new(ratio) {
            eprintln!("sampleRatio: {}", e);
            problems += 1;
        }
    }

    println!(
        "{}: {} log level(s), {} sampling level(s), sample ratio {}",
        file.display(),
        snapshot.log_levels.len(),
        snapshot.sampling_log_levels.len(),
        snapshot.sample_ratio.map_or_else(|| "unchanged".to_string(), |r| r.to_string()),
    );
    if problems > 0 {
        return Err(format!("{} invalid entries would be skipped", problems).into());
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
