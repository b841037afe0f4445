use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{ChatMessage, LanguageModel, QaCoordinator, SessionId, SessionStoreRegistry};
use pdf_chat_server::config::{ModelArgs, ServeArgs};
use pdf_chat_server::session::cookie_key;
use pdf_chat_server::{serve, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the upload and question web server.
    Serve(ServeArgs),
    /// Index one local PDF and answer a single question about it.
    Ask {
        /// PDF to index.
        #[arg(long)]
        file: PathBuf,
        /// Question to ask.
        #[arg(long)]
        query: String,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Send a greeting to the chat model and print its reply.
    Ping {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Report whether the session secret is configured.
    CheckEnv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat boot"
    );

    match cli.command {
        Command::Serve(args) => {
            let registry = Arc::new(SessionStoreRegistry::new(args.session_ttl()));
            let coordinator = QaCoordinator::new(args.model.build_embedder()?, args.model.build_llm()?)
                .with_registry(registry);
            let state = AppState::new(coordinator, args.upload_dir.clone(), cookie_key(&args.secret_key)?)?;

            info!(
                upload_dir = %args.upload_dir.display(),
                model = %args.model.model,
                embedder = ?args.model.embedder,
                "serving"
            );
            serve(state, &args.bind, args.max_upload_bytes()).await?;
        }
        Command::Ask { file, query, model } => {
            let coordinator = QaCoordinator::new(model.build_embedder()?, model.build_llm()?);
            let session = SessionId::new();

            let summary = coordinator
                .ingest_pdf(session, &file)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!(
                "indexed {} ({} documents, {} chunks)",
                summary.source_path, summary.document_count, summary.chunk_count
            );

            let answer = coordinator
                .ask(&session, &query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("answer: {}", answer.answer);
            for source in answer.sources {
                println!("[{}]\n{}", source.source, source.page_content);
            }
        }
        Command::Ping { model } => {
            let client = model.build_client()?;
            let reply = client
                .generate(&[ChatMessage::user("Hi")])
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("{}: {}", client.model(), reply);
        }
        Command::CheckEnv => match std::env::var("PDF_CHAT_SECRET_KEY") {
            Ok(secret) if !secret.trim().is_empty() => {
                println!("PDF_CHAT_SECRET_KEY is set ({} characters)", secret.chars().count());
            }
            _ => {
                warn!("PDF_CHAT_SECRET_KEY is not set");
                println!("PDF_CHAT_SECRET_KEY is not set");
            }
        },
    }

    Ok(())
}
