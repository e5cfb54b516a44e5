use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "failoverctl")]
#[command(about = "Management CLI for the strategy failover daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8181")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show failover status
    Status,
    /// Show failover configuration
    Config,
    /// Change failure threshold and cooldown
    SetConfig {
        #[arg(long)]
        max_failures: u32,
        #[arg(long)]
        cooldown_secs: u32,
    },
    /// Enable automatic failover
    Enable,
    /// Disable automatic failover
    Disable,
    /// Switch to the next learned strategy now
    Failover,
    /// Clear failure tracking for the current strategy
    Reset { strategy_id: String },
    /// List learned working strategies
    Learned,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/failover/status", cli.url)),
        Commands::Config => client.get(format!("{}/failover/config", cli.url)),
        Commands::SetConfig {
            max_failures,
            cooldown_secs,
        } => client
            .put(format!("{}/failover/config", cli.url))
            .json(&json!({ "maxFailures": max_failures, "cooldownSecs": cooldown_secs })),
        Commands::Enable => client
            .put(format!("{}/failover/enabled", cli.url))
            .json(&json!({ "enabled": true })),
        Commands::Disable => client
            .put(format!("{}/failover/enabled", cli.url))
            .json(&json!({ "enabled": false })),
        Commands::Failover => client.post(format!("{}/failover/manual", cli.url)),
        Commands::Reset { strategy_id } => client
            .post(format!("{}/failover/reset", cli.url))
            .json(&json!({ "strategyId": strategy_id })),
        Commands::Learned => client.get(format!("{}/failover/learned", cli.url)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("OK ({})", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
