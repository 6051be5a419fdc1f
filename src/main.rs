//! Assistant entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lumen::config::Config;
use lumen::intent::IntentClassifier;
use lumen::navigation::{Navigation, OsmNavigation};
use lumen::perception::{CameraClient, Perception, RemotePerception, VisionClient};
use lumen::reasoning::{LanguageModel, Reasoning};
use lumen::session::Session;
use lumen::speech::{Microphone, Speaker, Speech, SpeechToText, TextToSpeech, VoiceGateway};
use lumen::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "lumen", version, about = "Voice-driven vision assistant")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file path (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run one typed command instead of listening, then exit
    #[arg(long, value_name = "COMMAND", num_args = 0..=1, default_missing_value = "describe the scene")]
    test: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Record from the microphone and report what was heard
    TestMic {
        /// Seconds to wait for speech
        #[arg(long, default_value_t = 5)]
        duration: u64,
    },
    /// Synthesize and play a test sentence
    TestSpeaker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "lumen=info",
        1 => "lumen=debug",
        _ => "lumen=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Some(Command::TestMic { duration }) => test_mic(duration).await,
        Some(Command::TestSpeaker) => test_speaker(&config).await,
        None => run_session(config, cli.test).await,
    }
}

/// Build the collaborators and run the session
async fn run_session(config: Config, one_shot: Option<String>) -> anyhow::Result<()> {
    anyhow::ensure!(
        !config.openai_api_key.is_empty(),
        "OpenAI API key required (set OPENAI_API_KEY or the config file)"
    );
    anyhow::ensure!(
        !config.anthropic_api_key.is_empty(),
        "Anthropic API key required (set ANTHROPIC_API_KEY or the config file)"
    );

    let sqlite = SqliteStore::init(&config.database_path).context("failed to open database")?;
    sqlite
        .ensure_user(&config.user_id)
        .context("failed to bootstrap user")?;
    let store: Arc<dyn Store> = Arc::new(sqlite);

    let preferences = store.load_preferences(&config.user_id)?;

    let stt = SpeechToText::new(config.openai_api_key.clone())?
        .with_model(config.stt_model.clone())
        .with_language(preferences.language.clone());
    let tts = TextToSpeech::new(config.openai_api_key.clone())?
        .with_model(config.tts_model.clone())
        .with_voice(config.tts_voice.clone())
        .with_speed(preferences.voice_speed);
    let speech: Arc<dyn Speech> =
        Arc::new(VoiceGateway::new(stt, tts).context("failed to open audio devices")?);

    let camera = CameraClient::new(config.camera_url.clone());
    let vision =
        VisionClient::new(config.anthropic_api_key.clone())?.with_model(config.vision_model.clone());
    let perception: Arc<dyn Perception> = Arc::new(RemotePerception::new(camera, vision));

    let reasoning: Arc<dyn Reasoning> = Arc::new(
        LanguageModel::new(config.openai_api_key.clone())?.with_model(config.reasoning_model.clone()),
    );

    let navigation: Arc<dyn Navigation> = Arc::new(OsmNavigation::new()?);

    let classifier = if config.remote_classification {
        IntentClassifier::remote(
            Arc::clone(&reasoning),
            Duration::from_secs(config.classify_budget_secs),
        )
    } else {
        IntentClassifier::keyword()
    };

    let mut session = Session::new(
        speech,
        perception,
        reasoning,
        navigation,
        store,
        classifier,
        config.user_id.clone(),
    )?
    .with_listen_window(Duration::from_secs(config.listen_window_secs));

    match one_shot {
        Some(command) => session.run_once(&command).await?,
        None => session.run().await?,
    }

    Ok(())
}

/// Microphone diagnostic: wait for one utterance and report it
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    let mic = Microphone::open()?;
    println!("Listening for up to {duration} seconds, say something...");

    let window = Duration::from_secs(duration);
    let samples = tokio::task::spawn_blocking(move || mic.record(window)).await??;

    match samples {
        Some(samples) => println!("Heard an utterance: {} samples captured.", samples.len()),
        None => println!("Heard only silence."),
    }

    Ok(())
}

/// Speaker diagnostic: synthesize and play a sentence
async fn test_speaker(config: &Config) -> anyhow::Result<()> {
    anyhow::ensure!(
        !config.openai_api_key.is_empty(),
        "OpenAI API key required for speech synthesis"
    );

    let tts = TextToSpeech::new(config.openai_api_key.clone())?
        .with_model(config.tts_model.clone())
        .with_voice(config.tts_voice.clone());

    println!("Synthesizing test sentence...");
    let audio = tts.synthesize("This is a speaker test. If you can hear this, audio output works.")
        .await?;

    let speaker = Speaker::open()?;
    tokio::task::spawn_blocking(move || speaker.play_mp3(&audio)).await??;
    println!("Done.");

    Ok(())
}
