use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "launcher-cli")]
#[command(about = "Command-line client for a running ROM launcher", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,
    /// List available ROMs
    Roms,
    /// Show play statistics
    Stats,
    /// Record a play of the given ROM
    Play {
        /// ROM filename, e.g. "Pokemon Emerald.gba"
        rom: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/api/health")).send().await?,
        Commands::Roms => client.get(format!("{base}/api/roms")).send().await?,
        Commands::Stats => client.get(format!("{base}/api/rom-stats")).send().await?,
        Commands::Play { rom } => {
            client
                .post(format!("{base}/api/rom-play"))
                .json(&json!({ "romName": rom }))
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
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
