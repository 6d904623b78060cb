use anyhow::Result;
use clap::{Parser, Subcommand};
use pointlens::{Config, Language, ReasoningProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pointlens", version, about = "Point, tap, identify, chat")]
struct Cli {
    /// Config file path (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check configuration and reasoning-service credentials.
    Doctor,
    /// One-shot connectivity probe: send a message and print the reply.
    Ask {
        text: String,
        /// Language for the probe (en or ko).
        #[arg(long, default_value = "en")]
        lang: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Doctor => doctor(&config),
        Command::Ask { text, lang } => ask(&config, &text, &lang).await,
    }
}

fn doctor(config: &Config) -> Result<()> {
    println!("model:        {}", config.provider.model);
    println!("timeout:      {}s", config.provider.timeout_secs);
    println!(
        "base url:     {}",
        config.provider.base_url.as_deref().unwrap_or("(default)")
    );
    println!("language:     {}", config.ui.language.display_name());

    match config.build_provider() {
        Ok(_) => {
            println!("credentials:  ok");
            Ok(())
        }
        Err(e) => {
            println!("credentials:  MISSING");
            Err(e.into())
        }
    }
}

async fn ask(config: &Config, text: &str, lang: &str) -> Result<()> {
    let language = Language::from_str_code(lang)
        .ok_or_else(|| anyhow::anyhow!("unsupported language: {lang}"))?;
    let provider = Arc::new(config.build_provider()?);

    let session = provider
        .create_session(&language.chat_system_instruction("the world around the user"))
        .await?;
    let reply = session.send(text).await?;
    println!("{reply}");
    Ok(())
}
