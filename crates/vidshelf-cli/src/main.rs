//! Vidshelf CLI: operate the backend core directly against the configured store.
//!
//! Reads the same environment as the server (DATABASE_URL, UPLOAD_SIGNER, ...).

use clap::{Parser, Subcommand};
use vidshelf_cli::{init_backend, print_json};
use vidshelf_core::models::{UploadRequest, VideoCandidate};

#[derive(Parser)]
#[command(name = "vidshelf", about = "Vidshelf backend CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Register {
        email: String,
        /// At least 6 characters
        #[arg(long, env = "VIDSHELF_SECRET")]
        secret: String,
    },
    /// Check an email/secret pair
    Verify {
        email: String,
        #[arg(long, env = "VIDSHELF_SECRET")]
        secret: String,
    },
    /// Issue a direct-upload authorization for a user
    IssueUpload {
        email: String,
        #[arg(long, env = "VIDSHELF_SECRET")]
        secret: String,
        /// Filename the client will upload (only the extension is kept)
        filename: String,
        #[arg(long, default_value = "video/mp4")]
        content_type: String,
        /// Expected size in bytes; refused above 500 MiB
        #[arg(long)]
        file_size: Option<u64>,
    },
    /// Register video metadata after an upload
    CreateVideo {
        email: String,
        #[arg(long, env = "VIDSHELF_SECRET")]
        secret: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        video_location: String,
        #[arg(long)]
        thumbnail_location: String,
        /// 1-100; out-of-range values are clamped
        #[arg(long)]
        quality: Option<i32>,
    },
    /// Connect to the backend store and report whether it succeeded
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (_config, backend) = init_backend()?;

    match cli.command {
        Commands::Register { email, secret } => {
            let identity = backend.register(&email, &secret).await?;
            print_json(&identity)?;
        }
        Commands::Verify { email, secret } => {
            let identity = backend.verify(&email, &secret).await?;
            print_json(&identity)?;
        }
        Commands::IssueUpload {
            email,
            secret,
            filename,
            content_type,
            file_size,
        } => {
            let identity = backend.verify(&email, &secret).await?;
            let request = UploadRequest {
                filename,
                content_type,
                file_size,
            };
            let authorization = backend
                .issue_upload_authorization(Some(&identity), request)
                .await?;
            print_json(&authorization)?;
        }
        Commands::CreateVideo {
            email,
            secret,
            title,
            description,
            video_location,
            thumbnail_location,
            quality,
        } => {
            let identity = backend.verify(&email, &secret).await?;
            let candidate = VideoCandidate {
                title,
                description,
                video_location,
                thumbnail_location,
                quality,
                ..Default::default()
            };
            let video = backend.create_asset(Some(&identity), candidate).await?;
            print_json(&video)?;
        }
        Commands::Ping => {
            backend.get_connection().await?;
            print_json(&serde_json::json!({ "connected": backend.is_connected().await }))?;
        }
    }

    vidshelf_infra::shutdown_telemetry().await;
    Ok(())
}
