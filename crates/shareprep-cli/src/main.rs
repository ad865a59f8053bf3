//! Shareprep CLI: prepare local files as a share batch and send it.
//!
//! Uploads land in `--out`, messages go to an in-memory store. Binaries are
//! configured with the same environment as the library (FFMPEG_PATH,
//! FFPROBE_PATH, PDFTOPPM_PATH, SHAREPREP_*).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use shareprep_batch::SharePipeline;
use shareprep_cli::local::{DirectoryUploader, InMemoryMessageStore};
use shareprep_cli::{init_tracing, payload_for_file};
use shareprep_core::{BatchState, PeerId, PipelineConfig, RawPayload};
use shareprep_processing::Collaborators;

#[derive(Parser)]
#[command(name = "shareprep", about = "Prepare and send share batches locally")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare files as one batch, then send it
    Prepare {
        /// Files to share
        files: Vec<PathBuf>,
        /// Text sent ahead of the items
        #[arg(long)]
        text: Option<String>,
        /// Link shared after the files
        #[arg(long)]
        url: Option<String>,
        /// Send videos as round messages
        #[arg(long)]
        round: bool,
        /// Target peer id
        #[arg(long, default_value = "1")]
        peer: i64,
        /// Directory receiving uploads
        #[arg(long, default_value = "shareprep-out")]
        out: PathBuf,
        /// Milliseconds until the local store marks messages sent
        #[arg(long, default_value = "250")]
        delivery_delay_ms: u64,
        /// Stop after preparing
        #[arg(long)]
        no_send: bool,
    },
}

#[derive(Serialize)]
struct Line<'a, T: Serialize> {
    at: String,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct Delivery {
    delivered: f32,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let line = Line {
        at: chrono::Utc::now().to_rfc3339(),
        body: value,
    };
    let out = serde_json::to_string(&line).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;

    match cli.command {
        Commands::Prepare {
            files,
            text,
            url,
            round,
            peer,
            out,
            delivery_delay_ms,
            no_send,
        } => {
            tokio::fs::create_dir_all(&out)
                .await
                .with_context(|| format!("Failed to create {}", out.display()))?;

            let uploader = Arc::new(DirectoryUploader::new(out));
            let collaborators = Collaborators::from_config(uploader, &config)?;
            let store = Arc::new(InMemoryMessageStore::new(Duration::from_millis(
                delivery_delay_ms,
            )));
            let pipeline = SharePipeline::new(config.clone(), collaborators, store);
            let peer_id = PeerId(peer);

            let mut payloads = Vec::with_capacity(files.len() + 1);
            for file in &files {
                payloads.push(payload_for_file(file, round, &config).await?);
            }
            if let Some(url) = url {
                payloads.push(RawPayload::Url(url));
            }

            let mut batch = pipeline.prepare(peer_id, payloads, text.as_deref().unwrap_or(""));
            let mut contents = None;
            loop {
                let next = tokio::select! {
                    state = batch.next() => Some(state),
                    _ = tokio::signal::ctrl_c() => None,
                };
                let state = match next {
                    None => {
                        tracing::info!("Interrupted, cancelling batch");
                        batch.cancel();
                        continue;
                    }
                    Some(None) => break,
                    Some(Some(state)) => state?,
                };

                print_json(&state)?;
                match state {
                    BatchState::Done(done) => contents = Some(done),
                    BatchState::InteractionRequired(_) => {
                        anyhow::bail!("Batch needs a choice this CLI cannot make");
                    }
                    BatchState::Preparing | BatchState::Progress(_) => {}
                }
            }

            let Some(contents) = contents else {
                anyhow::bail!("Batch ended without a result");
            };
            if no_send {
                return Ok(());
            }

            let mut delivery = pipeline.send(vec![peer_id], contents);
            while let Some(progress) = delivery.next().await {
                print_json(&Delivery {
                    delivered: progress?,
                })?;
            }
        }
    }

    Ok(())
}
