use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use lifgpt_core::{ChatSession, Config, Formatter, InferenceClient, LifGptClient};

mod app;
mod handler;
mod logging;
mod markup;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "lifgpt")]
#[command(version, about = "Terminal chat client for lifGPT")]
struct Cli {
    /// Route prefix of the inference endpoint (requests go to <ROUTE>ai)
    #[arg(long, global = true)]
    api_route: Option<String>,
    /// Escape markup characters in messages before formatting
    #[arg(long, global = true)]
    escape_markup: bool,
    /// Log file for the chat UI
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt and print the exchange
    Ask {
        /// Your question
        prompt: String,
    },
    /// Format stdin and print the markup
    Format,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the inference route prefix
    SetRoute {
        /// e.g. http://localhost:2000/
        url: String,
    },
    /// Print the resolved settings
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = settle_config(Config::load());
    let formatter = Formatter::escaping(cli.escape_markup || config.escapes_markup());

    // The chat UI owns the terminal, so it logs to a file
    if cli.command.is_none() {
        let log_path = match cli.log_file.clone().or_else(|| config.log_file.clone().map(PathBuf::from)) {
            Some(path) => path,
            None => logging::default_log_path()?,
        };
        logging::init_file_logging(&log_path)?;
    } else {
        logging::init_stderr_logging()?;
    }
    if let Some(error) = config_error {
        tracing::warn!(error = %error, "config file unreadable, using defaults");
    }

    match cli.command {
        None => {
            let route = config.resolve_api_route(cli.api_route.as_deref())?;
            run_chat(route, formatter).await
        }
        Some(Commands::Ask { prompt }) => {
            let route = config.resolve_api_route(cli.api_route.as_deref())?;
            let client = LifGptClient::new(&route);
            ask_once(&client, formatter, &prompt, &mut std::io::stdout()).await
        }
        Some(Commands::Format) => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            println!("{}", format_input(formatter, &input));
            Ok(())
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::SetRoute { url } => {
                Config::save_api_route(&url)?;
                println!("Saved route {} to {}", url, Config::get_config_path()?.display());
                Ok(())
            }
            ConfigAction::Show => {
                show_config(&config, cli.api_route.as_deref());
                Ok(())
            }
        },
    }
}

/// A broken config file falls back to defaults instead of failing commands
/// that may not need it. The error is handed back for logging.
fn settle_config(loaded: Result<Config>) -> (Config, Option<anyhow::Error>) {
    match loaded {
        Ok(config) => (config, None),
        Err(error) => (Config::default(), Some(error)),
    }
}

async fn run_chat(route: String, formatter: Formatter) -> Result<()> {
    tracing::info!(%route, escape_markup = formatter.escapes(), "starting chat");

    let mut events = EventHandler::new();
    let client = Arc::new(LifGptClient::new(&route));
    let mut app = App::new(ChatSession::with_formatter(formatter), client, route, events.sender());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = event_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    tracing::info!(messages = app.session.transcript().len(), "chat closed");
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn ask_once<C, W>(client: &C, formatter: Formatter, prompt: &str, out: &mut W) -> Result<()>
where
    C: InferenceClient + ?Sized,
    W: Write,
{
    let mut session = ChatSession::with_formatter(formatter);

    if session.submit(client, prompt).await.is_none() {
        return Err(anyhow!("Nothing to send: the prompt is empty"));
    }

    for msg in session.transcript() {
        writeln!(out, "[{}] {}: {}", msg.time, msg.sender.display_name(), msg.text)?;
    }

    match session.last_error() {
        Some(error) => Err(anyhow!("{}", error)),
        None => Ok(()),
    }
}

/// Drop the newline the shell adds at the end of piped input, then format.
fn format_input(formatter: Formatter, input: &str) -> String {
    formatter.format(input.strip_suffix('\n').unwrap_or(input))
}

fn show_config(config: &Config, flag: Option<&str>) {
    let route = config.resolve_api_route(flag).ok();
    let config_path = Config::get_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    let log_file = config
        .log_file
        .clone()
        .or_else(|| logging::default_log_path().ok().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "(unknown)".to_string());

    println!("config file:   {}", config_path);
    match route {
        Some(route) => {
            println!("api route:     {}", route);
            println!("endpoint:      {}", LifGptClient::new(&route).endpoint());
        }
        None => println!("api route:     (not set)"),
    }
    println!("escape markup: {}", config.escapes_markup());
    println!("log file:      {}", log_file);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::StaticClient;
    use lifgpt_core::RESPONSE_ERROR;

    fn printed(out: Vec<u8>) -> Vec<String> {
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_ask_once_prints_both_messages() {
        let client = StaticClient(Ok("*42*".to_string()));
        let mut out = Vec::new();

        ask_once(&client, Formatter::new(), "meaning?", &mut out).await.unwrap();

        let lines = printed(out);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] You: meaning?"));
        assert!(lines[1].ends_with("] lifGPT: <strong>42</strong><br>"));
        // "[HH:MM] "
        assert_eq!(lines[0].find(']'), Some(6));
    }

    #[tokio::test]
    async fn test_ask_once_fails_on_server_error() {
        let client = StaticClient(Err(500));
        let mut out = Vec::new();

        let err = ask_once(&client, Formatter::new(), "hi", &mut out).await.unwrap_err();

        assert_eq!(err.to_string(), RESPONSE_ERROR);
        let lines = printed(out);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("] You: hi"));
    }

    #[tokio::test]
    async fn test_ask_once_rejects_blank_prompt() {
        let client = StaticClient(Ok("unused".to_string()));
        let mut out = Vec::new();

        assert!(ask_once(&client, Formatter::new(), "   ", &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_format_input_drops_one_trailing_newline() {
        let formatter = Formatter::new();
        assert_eq!(format_input(formatter, "a\nb\n"), "a<br />b");
        assert_eq!(format_input(formatter, "a\n\n"), "a<br />");
        assert_eq!(format_input(formatter, "*x*\n"), "<strong>x</strong><br>");
    }

    #[test]
    fn test_format_input_honors_escaping() {
        assert_eq!(format_input(Formatter::escaping(true), "<b>\n"), "&lt;b&gt;");
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (config, error) = settle_config(Config::load_from(&path));

        assert_eq!(config, Config::default());
        assert!(error.is_some());
    }

    #[test]
    fn test_readable_config_is_kept() {
        let config = Config {
            api_route: Some("http://localhost:2000/".to_string()),
            ..Config::default()
        };
        let (settled, error) = settle_config(Ok(config.clone()));
        assert_eq!(settled, config);
        assert!(error.is_none());
    }
}
