use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use chunkscribe::{AudioInput, Config, Error, FfmpegSplitter, SttClient, Transcriber, format};

#[derive(Parser)]
#[command(name = "chunkscribe")]
#[command(about = "Transcribe audio of any size through a payload-limited STT service", long_about = None)]
struct Cli {
    /// Input audio file
    input: PathBuf,

    /// Emit one JSON event per line as partial results arrive
    #[arg(long)]
    stream: bool,

    /// Spoken language hint passed to the service (e.g. "en")
    #[arg(short, long)]
    lang: Option<String>,

    /// Transcription model
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(model) = cli.model {
        config.model = Some(model);
    }

    let input_path = cli.input.canonicalize().context("Failed to find input file")?;
    let mime_type = format::mime_for_path(&input_path)
        .ok_or_else(|| Error::UnsupportedMedia(input_path.display().to_string()))?;

    let bytes = tokio::fs::read(&input_path)
        .await
        .context("Failed to read input file")?;
    let file_name = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio")
        .to_string();
    let input = AudioInput::new(bytes, mime_type, file_name);

    let stt = SttClient::new(&config)
        .context("Failed to set up the transcription client")?
        .with_language(cli.lang);
    let transcriber = Transcriber::new(stt)
        .with_splitter(FfmpegSplitter::new(config.ffmpeg()))
        .with_segment_seconds(config.segment_seconds());

    if cli.stream {
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Print events as the pipeline produces them; the channel closes
        // when the job's sender is dropped.
        let printer = async {
            while let Some(event) = rx.recv().await {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{line}");
                }
            }
        };

        let (result, ()) = tokio::join!(transcriber.transcribe_streaming(&input, tx), printer);
        result?;
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Transcribing...");

        let transcript = transcriber.transcribe_batch(&input).await;
        pb.finish_and_clear();

        println!("{}", transcript?);
    }

    Ok(())
}
