use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use afiyalink_core::{languages, Config, RequestCoordinator, RequestShape, CHAT_PATH};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::{App, Screen};

#[derive(Parser)]
#[command(name = "afiyalink")]
#[command(about = "Health chatbot and medical translator for the terminal")]
struct Cli {
    /// Backend base URL (overrides config and AFIYALINK_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Source language code or name for translation
    #[arg(long, global = true)]
    source: Option<String>,
    /// Target language code or name for translation
    #[arg(long, global = true)]
    target: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chatbot screen (default)
    Chat,
    /// Open the medical translator screen
    Translate,
    /// Ask the chatbot a single question and print the reply
    Ask {
        /// Your question
        text: String,
    },
    /// List supported translation languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    // The terminal UI owns stderr, so interactive sessions log to a file
    let interactive = matches!(command, Commands::Chat | Commands::Translate);
    let log_file = if interactive { log_path() } else { None };
    init_logging(log_file)?;

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        Config::default()
    });
    if let Some(url) = cli.base_url {
        config.api_base_url = url;
    }
    if let Some(source) = cli.source {
        config.source_language = source;
    }
    if let Some(target) = cli.target {
        config.target_language = target;
    }

    match command {
        Commands::Chat => run_tui(App::new(&config)?).await,
        Commands::Translate => {
            let mut app = App::new(&config)?;
            app.screen = Screen::Translate;
            run_tui(app).await
        }
        Commands::Ask { text } => ask(&config, &text).await,
        Commands::Languages => {
            for lang in languages::LANGUAGES {
                println!("{:<4} {}", lang.code, lang.name);
            }
            Ok(())
        }
    }
}

fn log_path() -> Option<PathBuf> {
    Config::config_dir().ok().map(|dir| dir.join("afiyalink.log"))
}

fn init_logging(log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{}=info,afiyalink_core=info", env!("CARGO_CRATE_NAME")).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
        app.poll_requests().await;
    }
    Ok(())
}

async fn ask(config: &Config, text: &str) -> Result<()> {
    let transport = app::http_transport(config, CHAT_PATH)?;
    let shape = RequestShape::chat(&config.user_id, &config.chat_language);
    let mut chat = RequestCoordinator::new(transport, shape);

    if !chat.submit(text).await {
        anyhow::bail!("nothing to send");
    }
    if let Some(reply) = chat.session().and_then(|s| s.last_agent_text()) {
        println!("{}", reply);
    }
    Ok(())
}
