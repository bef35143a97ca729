use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "nft-cli")]
#[command(about = "Command-line client for the NFT gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway version, chain and signing address
    Status,
    /// Issue a new NFT class
    IssueClass {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Mint an NFT into a class issued by the gateway
    Mint {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Overwrite the data of an existing NFT
    Update {
        #[arg(long)]
        class_id: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/api/status", cli.url)).send().await?,
        Commands::IssueClass {
            symbol,
            name,
            description,
        } => {
            client
                .post(format!("{}/api/create-class", cli.url))
                .json(&json!({
                    "classSymbol": symbol,
                    "className": name,
                    "classDescription": description,
                }))
                .send()
                .await?
        }
        Commands::Mint {
            symbol,
            id,
            name,
            description,
        } => {
            client
                .post(format!("{}/api/mint", cli.url))
                .json(&json!({
                    "classSymbol": symbol,
                    "nftID": id,
                    "name": name,
                    "description": description,
                }))
                .send()
                .await?
        }
        Commands::Update {
            class_id,
            id,
            name,
            description,
        } => {
            client
                .post(format!("{}/api/update", cli.url))
                .json(&json!({
                    "classID": class_id,
                    "nftID": id,
                    "name": name,
                    "description": description,
                }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }

    println!("{}", rendered);
    Ok(())
}
