mod app;
mod cache;
mod cards;
mod classifier;
mod config;
mod draw;
mod error;
mod fingerprint;
mod generator;
mod logging;
mod prompt;
mod rate_limit;
mod sanitize;
mod session;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::{DefaultTerminal, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

use crate::app::{App, GenerationResult};
use crate::cards::Card;
use crate::config::Config;
use crate::draw::Spread;
use crate::generator::{Generator, OpenAiGenerator};
use crate::session::ReadingSession;
use crate::ui::{DISCLAIMER, draw_ui, reading_lines};

/// Redraw interval; also drives the spinner.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "tarot", version, about = "Mystic Tarot Master in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Draw cards for one question and print the reading
    Ask {
        question: String,
        /// Number of cards (defaults to the configured spread)
        #[arg(long, value_enum)]
        spread: Option<Spread>,
        /// Print the reading as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the deck, or show one card by number
    Cards { number: Option<usize> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let start_time = Instant::now();

    // Logging failures are not fatal; the app just runs without a log file.
    let logging = match logging::init(logging::STARTUP_LEVEL) {
        Ok(ctx) => {
            logging::cleanup_old_logs(&ctx.log_directory);
            Some(ctx)
        }
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };
    let session_id = logging
        .as_ref()
        .map(|ctx| ctx.session_id.clone())
        .unwrap_or_else(|| "tarot".to_string());

    let loaded_config = config::load_config();
    let level = &loaded_config.config.logging.level;
    if let Some(ctx) = &logging
        && let Err(e) = logging::update_log_level(&ctx.filter_handle, level)
    {
        warn!(level = %level, error = %e, "log_level_update_failed");
    }

    debug!(
        config_path = %loaded_config.config_path.display(),
        project_config = ?loaded_config.project_config_path,
        status = ?loaded_config.status,
        "config_loaded"
    );
    if let Some(e) = &loaded_config.project_error {
        eprintln!("Warning: .tarot was ignored: {}", e);
    }
    let config = loaded_config.config;

    let result = match cli.command {
        Some(Command::Cards { number }) => print_cards(number),
        Some(Command::Ask {
            question,
            spread,
            json,
        }) => {
            let generator = build_generator(&config)?;
            let spread = spread.unwrap_or(config.reading.spread);
            ask(&config, generator.as_ref(), &question, spread, json).await
        }
        None => {
            let generator = build_generator(&config)?;
            run_tui(&config, generator, session_id.clone()).await
        }
    };

    info!(
        session_id = %session_id,
        duration_secs = start_time.elapsed().as_secs_f64(),
        "session_end"
    );

    result
}

/// Fails before any UI starts when the API key is missing.
fn build_generator(config: &Config) -> Result<Arc<dyn Generator>> {
    let Some(api_key) = config.api_key() else {
        let name = &config.generator.api_key_env;
        warn!(env = %name, "api_key_missing");
        bail!("{name}가 설정되지 않았어요. 환경 변수 {name}에 API 키를 넣어주세요.");
    };
    let generator = OpenAiGenerator::new(&config.generator, api_key)
        .context("Failed to build the HTTP client")?;
    info!(model = %config.generator.model, "generator_ready");
    Ok(Arc::new(generator))
}

fn print_cards(number: Option<usize>) -> Result<()> {
    let cards: Vec<Card> = match number {
        Some(n) => match Card::from_index(n) {
            Some(card) => vec![card],
            None => bail!("카드 번호는 0부터 {}까지야.", Card::ALL.len() - 1),
        },
        None => Card::ALL.to_vec(),
    };

    for card in cards {
        let info = card.info();
        println!("{} {}", info.glyph, card.display_name());
        println!("    {}", info.flavor);
    }
    Ok(())
}

async fn ask(
    config: &Config,
    generator: &dyn Generator,
    question: &str,
    spread: Spread,
    json: bool,
) -> Result<()> {
    let mut session = ReadingSession::new(&config.limits);
    let reading = session.read(generator, question, spread).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
    } else {
        for line in reading_lines(&reading) {
            println!("{}", line);
        }
        println!();
        println!("{}", DISCLAIMER);
    }
    Ok(())
}

async fn run_tui(config: &Config, generator: Arc<dyn Generator>, session_id: String) -> Result<()> {
    let (generation_tx, generation_rx) = mpsc::unbounded_channel();
    let app = App::new(
        ReadingSession::new(&config.limits),
        generator,
        generation_tx,
        config.reading.spread,
        config.limits.max_question_chars,
        session_id,
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, app, generation_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;

    result
}

async fn run_app(
    mut terminal: DefaultTerminal,
    mut app: App,
    mut generation_rx: UnboundedReceiver<GenerationResult>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        terminal.draw(|f| draw_ui(f, &mut app))?;

        tokio::select! {
            _ = tick.tick() => {}
            Some(result) = generation_rx.recv() => app.on_generated(result),
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        info!("quit_requested");
                        return Ok(());
                    }
                }
                Some(Ok(Event::Mouse(mouse))) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_up(3),
                    MouseEventKind::ScrollDown => app.scroll_down(3),
                    _ => {}
                },
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
        }
    }
}
