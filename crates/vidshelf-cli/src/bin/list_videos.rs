use anyhow::Result;
use clap::Parser;
use vidshelf_cli::{init_backend, print_json, truncate_string};
use vidshelf_core::models::VideoAsset;

#[derive(Parser, Debug)]
#[command(name = "list_videos")]
#[command(about = "List registered videos, most recent first")]
struct Args {
    /// Page size (default 50, clamped to 1-100); omit with no offset to list every video
    #[arg(long)]
    limit: Option<i64>,

    /// Offset for pagination (default: 0)
    #[arg(long, default_value = "0")]
    offset: i64,

    /// Output format: json or table (default: table)
    #[arg(long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (_config, backend) = init_backend()?;

    let videos = match (args.limit, args.offset) {
        (None, 0) => backend.list_assets().await?,
        (limit, offset) => backend.list_assets_page(limit, offset).await?,
    };

    match args.format.as_str() {
        "json" => print_json(&videos)?,
        _ => print_video_table(&videos),
    }

    vidshelf_infra::shutdown_telemetry().await;
    Ok(())
}

fn print_video_table(videos: &[VideoAsset]) {
    println!("\n=== Videos ===\n");

    if videos.is_empty() {
        println!("No videos found.");
        return;
    }

    println!(
        "{:<36} {:<30} {:>7} {:>9} {:<40} {:>20}",
        "ID", "Title", "Quality", "Size", "Video Location", "Created At"
    );
    println!("{}", "-".repeat(148));

    for video in videos {
        println!(
            "{:<36} {:<30} {:>7} {:>9} {:<40} {:>20}",
            video.id,
            truncate_string(&video.title, 30),
            video.quality,
            format!("{}x{}", video.display_width, video.display_height),
            truncate_string(&video.video_location, 40),
            video.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!("\nTotal: {} videos\n", videos.len());
}
