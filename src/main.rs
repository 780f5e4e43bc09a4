use anyhow::Result;
use clap::{Parser, Subcommand};
use streamnest_backend::cli;
use streamnest_backend::config::StreamnestConfig;
use streamnest_backend::database::models::ItemKind;
use streamnest_backend::node::BackendNode;
use streamnest_backend::telemetry;
use streamnest_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "Streamnest comment backend daemon and admin CLI")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST access
    Serve,
    /// Register a user and print its API token
    CreateUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Create a content item that can carry a comment thread
    CreateItem {
        #[arg(long)]
        kind: ItemKind,
        #[arg(long)]
        title: String,
        /// Optional owner user id
        #[arg(long)]
        owner: Option<String>,
    },
    /// List recent content items with their comment counts
    ListItems {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let config = StreamnestConfig::from_env()?;
    let node = BackendNode::start(config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => node.run_http_server().await,
        Command::CreateUser { name, avatar_url } => {
            cli::create_user(&node.database(), &name, avatar_url)
        }
        Command::CreateItem { kind, title, owner } => {
            cli::create_item(&node.database(), kind, &title, owner)
        }
        Command::ListItems { limit } => cli::list_items(&node.database(), limit),
    }
}
