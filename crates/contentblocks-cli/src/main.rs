use anyhow::Result;
use clap::{Parser, Subcommand};
use contentblocks_core::clean;
use contentblocks_storage::{persistent, ContentProvider};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "contentblocks")]
#[command(about="Content blocks admin CLI", long_about=None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show how a `q=` value is interpreted
    Clean { raw: String },
    /// Print every live document in a data directory as JSON lines
    Dump {
        data_dir: PathBuf,
        #[arg(long)]
        query: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Clean { raw } => {
            let q = clean(&raw)?;
            println!("{}", serde_json::to_string_pretty(&q)?);
        }
        Cmd::Dump { data_dir, query } => {
            let mem = persistent::load(&data_dir.join("wal"))?;
            let docs = match query {
                Some(raw) => mem.find(&clean(&raw)?).await?,
                None => mem.all_documents(),
            };
            for d in docs {
                println!("{}", serde_json::to_string(&d)?);
            }
        }
    }
    Ok(())
}
