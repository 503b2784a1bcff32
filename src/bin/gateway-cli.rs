use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Admin key, sent as a bearer token on registry mutations.
    #[arg(short, long, env = "GATEWAY_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the raw service registry
    Registry,
    /// Aggregate UP/DOWN status per service
    Health,
    /// Circuit breaker state per known service
    Breakers,
    /// Register an instance
    Register { service: String, instance_url: String },
    /// Remove an instance
    Unregister { service: String, instance_url: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let res = match cli.command {
        Commands::Registry => client.get(format!("{}/registry", cli.url)).send().await?,
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
        Commands::Breakers => client.get(format!("{}/breakers", cli.url)).send().await?,
        Commands::Register { service, instance_url } => {
            client
                .post(format!("{}/registry", cli.url))
                .headers(headers)
                .json(&json!({ "serviceName": service, "url": instance_url }))
                .send()
                .await?
        }
        Commands::Unregister { service, instance_url } => {
            client
                .delete(format!("{}/registry", cli.url))
                .headers(headers)
                .json(&json!({ "serviceName": service, "url": instance_url }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
