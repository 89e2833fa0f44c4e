//! Image2Doc command line client

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image2doc_client::{ApiClient, ClientConfig, DocumentStore, IntakeFlow};

/// Turn photographed pages into Word documents
#[derive(Parser)]
#[command(name = "image2doc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL (overrides IMAGE2DOC_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image to a .docx
    Convert {
        image: PathBuf,
        /// Record the document under this user
        #[arg(long)]
        user: Option<String>,
        /// Document name (defaults to "document <date>")
        #[arg(long)]
        name: Option<String>,
        /// Also download the .docx to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List a user's documents
    List {
        #[arg(long)]
        user: String,
    },

    /// Rename a document
    Rename {
        id: String,
        name: String,
        #[arg(long)]
        user: String,
    },

    /// Delete a document
    Delete {
        id: String,
        #[arg(long)]
        user: String,
    },

    /// Download a generated document
    Download { url: String, out: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image2doc_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match cli.server {
        Some(url) => ClientConfig::new(url).with_timeout(ClientConfig::from_env().timeout),
        None => ClientConfig::from_env(),
    };
    let api = ApiClient::new(config)?;

    match cli.command {
        Commands::Convert {
            image,
            user,
            name,
            out,
        } => {
            let store = DocumentStore::new(Arc::new(api.clone()), user);
            let outcome = IntakeFlow::new(&api, &store)
                .run(&image, name.as_deref())
                .await?;

            println!("{}", outcome.response.text);
            println!();
            println!("id:   {}", outcome.item.id);
            println!("name: {}", outcome.item.name);
            println!("docx: {}", outcome.response.docx_url);

            if let Some(out) = out {
                let bytes = api.download(&outcome.response.docx_url, &out).await?;
                println!("saved {} ({} bytes)", out.display(), bytes);
            }
        }
        Commands::List { user } => {
            let store = DocumentStore::new(Arc::new(api), Some(user));
            store.refresh().await?;

            let documents = store.documents().await;
            if documents.is_empty() {
                println!("No documents");
            }
            for doc in documents {
                println!("{}\t{}\t{}\t{}", doc.id, doc.uploaded_at, doc.name, doc.url);
            }
        }
        Commands::Rename { id, name, user } => {
            let store = DocumentStore::new(Arc::new(api), Some(user));
            store.refresh().await?;
            store.rename(&id, &name).await?;
            println!("Renamed {} to \"{}\"", id, name);
        }
        Commands::Delete { id, user } => {
            let store = DocumentStore::new(Arc::new(api), Some(user));
            store.refresh().await?;
            store.remove(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::Download { url, out } => {
            let bytes = api.download(&url, &out).await?;
            println!("saved {} ({} bytes)", out.display(), bytes);
        }
    }

    Ok(())
}
