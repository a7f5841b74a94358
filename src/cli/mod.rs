pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "crud")]
#[command(about = "CRUD CLI - Command-line interface for the CRUD repository API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "CRUD_API_URL",
        default_value = "http://127.0.0.1:8080",
        help = "Base URL of a running API server"
    )]
    pub url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server in the foreground")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Seed an in-memory store and run the sample finders")]
    Demo,

    #[command(about = "Record operations on registered collections")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },

    #[command(about = "Query a collection with a where filter or a declared finder")]
    Find {
        #[command(subcommand)]
        cmd: commands::find::FindCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = client::ApiClient::new(&cli.url);

    match cli.command {
        Commands::Serve(args) => commands::serve::handle(args).await,
        Commands::Demo => commands::demo::handle(output_format).await,
        Commands::Data { cmd } => commands::data::handle(cmd, &client, output_format).await,
        Commands::Find { cmd } => commands::find::handle(cmd, &client, output_format).await,
    }
}
