//! Chattervox launcher.
//!
//! Selects the chat platform, AI backend, and TTS backend, builds the
//! session, and runs the pipeline until interrupted. Ctrl-C exits cleanly;
//! anything escaping the session loop is logged and re-raised.

use chattervox::ai::AiChoice;
use chattervox::chat::twitch::TwitchChatSource;
use chattervox::chat::youtube::YoutubeChatSource;
use chattervox::chat::ChatSource;
use chattervox::tts::{self, TtsChoice, TtsDispatch};
use chattervox::{ai, credentials, pipeline, AppConfig, Platform};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "chattervox", about = "Live stream chat to AI speech pipeline")]
struct Args {
    /// Chat platform to monitor.
    #[arg(long, value_enum)]
    platform: Platform,

    /// YouTube video ID or Twitch channel name.
    #[arg(long)]
    stream_id: String,

    /// TTS backend.
    #[arg(long, value_enum, default_value = "local")]
    tts: TtsChoice,

    /// AI backend.
    #[arg(long, value_enum, default_value = "openai")]
    ai: AiChoice,

    /// Configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;

    info!("starting chat monitoring for {:?}", args.platform);
    info!("stream id: {}", args.stream_id);
    info!("TTS: {:?} | AI: {:?}", args.tts, args.ai);

    let ai_backend = ai::create_backend(args.ai, &config);
    let tts_backend = tts::create_backend(args.tts, &config)?;

    // The polling regime falls back to local synthesis when the streaming
    // backend fails; the push regime deliberately does not, so repeated
    // remote failures stay visible.
    let tts_dispatch = if args.tts == TtsChoice::Fish && args.platform == Platform::Youtube {
        TtsDispatch::new(tts_backend)
            .with_fallback(tts::create_backend(TtsChoice::Local, &config)?)
    } else {
        TtsDispatch::new(tts_backend)
    };

    let source: Arc<dyn ChatSource> = match args.platform {
        Platform::Youtube => Arc::new(YoutubeChatSource::new(&config, &args.stream_id)),
        Platform::Twitch => {
            // No safe default exists for the access token: halt startup.
            let creds = credentials::discover_twitch_token()?;
            Arc::new(TwitchChatSource::new(&creds.access_token, &args.stream_id))
        }
    };

    let session = pipeline::Session::new(&config, args.platform, ai_backend, tts_dispatch);
    let queue_size = config.queue_size();

    tokio::select! {
        result = pipeline::run(session, source, queue_size) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("stopping chat monitoring...");
        }
    }

    Ok(())
}
