//! Chat command implementation

use crate::chat::{supervise, ChatSession, ConnectionStatus, Locale, Message, Notice, Role};
use crate::cli::output::{connection_label, format_sources_table, render_message, to_json};
use crate::cli::ChatArgs;
use crate::client::ApiError;
use crate::config::ParleyConfig;
use crate::format::{self, ValidationConstraints};
use colored::Colorize;
use serde_json::json;
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

type CliResult = Result<String, Box<dyn std::error::Error>>;

const HELP: &str = "\
Commands:
  /retry    resend your last message
  /new      start a new conversation
  /history  show this conversation
  /sources  toggle showing retrieved context
  /status   connection and usage details
  /quit     leave (also /exit or Ctrl+D)";

/// Handle `parley chat`
pub async fn handle_chat(args: &ChatArgs, config: &ParleyConfig) -> CliResult {
    let mut config = config.clone();
    if let Some(user) = &args.user {
        config.chat.user_id = user.clone();
    }
    if let Some(locale) = &args.locale {
        config.chat.locale = locale.parse::<Locale>()?;
    }
    if args.no_persist {
        config.storage.persist_conversation = false;
    }

    let mut session = ChatSession::from_config(&config);
    if let Some(id) = &args.conversation {
        session = session.with_conversation_id(id.clone());
    } else if args.new {
        session.new_conversation()?;
    }

    match &args.message {
        Some(message) => handle_one_shot(&mut session, message, args).await,
        None => run_interactive(&mut session, &config, args.sources).await,
    }
}

/// Send a single message and return the formatted reply.
async fn handle_one_shot(session: &mut ChatSession, text: &str, args: &ChatArgs) -> CliResult {
    let locale = session.locale();
    let reply = match session.send(text).await {
        Ok(Some(reply)) => reply,
        Ok(None) => return Err(locale.text(Notice::EmptyMessage).into()),
        Err(e) => return Err(describe_failure(session, &e).into()),
    };

    if args.json {
        return Ok(to_json(&json!({
            "conversation_id": session.conversation_id(),
            "message": reply,
        }))?);
    }
    if args.html {
        return Ok(reply.to_html());
    }

    let mut output = reply.text.clone();
    if args.sources {
        if let Some(table) = sources_table(&reply) {
            output.push_str("\n\n");
            output.push_str(&table);
        }
    }
    Ok(output)
}

fn describe_failure(session: &ChatSession, error: &ApiError) -> String {
    let text = session.describe(error);
    if error.is_retryable() {
        format!("{} [{}]", text, error.code().unwrap_or("ERROR"))
    } else {
        text
    }
}

fn sources_table(message: &Message) -> Option<String> {
    message
        .metadata
        .as_ref()
        .filter(|m| !m.retrieved_context.is_empty())
        .map(|m| format_sources_table(&m.retrieved_context))
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{} ", ">".bold())?;
    stdout.flush()
}

enum Flow {
    Continue,
    Quit,
}

/// Interactive read-send-print loop.
async fn run_interactive(
    session: &mut ChatSession,
    config: &ParleyConfig,
    show_sources: bool,
) -> CliResult {
    let locale = session.locale();
    let max_length = config.api.max_message_length;
    let constraints = ValidationConstraints {
        min_length: 0,
        max_length,
        required: true,
    };
    let mut show_sources = show_sources;

    let status = session.check_connection().await;
    println!(
        "{} {} ({})",
        "parley".bold(),
        session.client().base_url(),
        connection_label(status)
    );
    println!("Conversation {}", session.conversation_id().dimmed());
    println!("Type /help for commands.");

    let poll_seconds = config.chat.health_poll_seconds;
    let mut ticker = tokio::time::interval(Duration::from_secs(poll_seconds.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut reprompt = true;

    loop {
        if reprompt {
            prompt()?;
        }
        reprompt = true;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = ticker.tick(), if poll_seconds > 0 => {
                reprompt = poll_connection(session, locale).await;
                continue;
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let Some(line) = line else {
            // EOF
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            match handle_command(line, session, &mut show_sources).await {
                Flow::Continue => continue,
                Flow::Quit => break,
            }
        }

        let report = format::validate(line, &constraints);
        if !report.valid {
            let notice = if report.length == 0 {
                Notice::EmptyMessage
            } else {
                Notice::MessageTooLong(max_length)
            };
            println!("{}", locale.text(notice).yellow());
            continue;
        }
        if report.length >= config.chat.warning_threshold {
            println!("{}", format!("{}/{}", report.length, max_length).dimmed());
        }

        match interruptible(session.send(line), tokio::signal::ctrl_c()).await {
            Some(outcome) => print_outcome(outcome, session, show_sources),
            None => report_interrupted(session),
        }
    }

    Ok(String::new())
}

/// Run a supervised turn unless `signal` fires first, in which case the turn is dropped.
async fn interruptible<F, S>(turn: F, signal: S) -> Option<Result<F::Output, String>>
where
    F: Future,
    S: Future,
{
    tokio::select! {
        outcome = supervise(turn) => Some(outcome),
        _ = signal => None,
    }
}

fn report_interrupted(session: &mut ChatSession) {
    session.interrupt();
    println!("\n{}", "Request cancelled. Type /retry to send it again.".dimmed());
}

/// Re-check the connection and report transitions. Returns whether the prompt needs redrawing.
async fn poll_connection(session: &mut ChatSession, locale: Locale) -> bool {
    let before = session.state().connection_status();
    let after = session.check_connection().await;

    match (before, after) {
        (ConnectionStatus::Error, ConnectionStatus::Connected) => {
            println!("\n{}", locale.text(Notice::ConnectionRestored).green());
            true
        }
        (ConnectionStatus::Connected, ConnectionStatus::Error) => {
            println!("\n{}", locale.text(Notice::Network).red());
            true
        }
        _ => false,
    }
}

fn print_outcome(
    outcome: Result<Result<Option<Message>, ApiError>, String>,
    session: &ChatSession,
    show_sources: bool,
) {
    match outcome {
        Ok(Ok(Some(reply))) => {
            println!("{}", render_message(&reply));
            if show_sources {
                if let Some(table) = sources_table(&reply) {
                    println!("{}", table);
                }
            }
        }
        Ok(Ok(None)) => {}
        Ok(Err(e)) => {
            if let Some(last) = session.state().messages().last() {
                println!("{}", render_message(last));
            }
            if e.is_retryable() {
                println!("{}", "Type /retry to try again.".dimmed());
            }
        }
        Err(reason) => {
            let message = Message::new(Role::Error, format!("Turn failed: {}", reason), None);
            println!("{}", render_message(&message));
        }
    }
}

async fn handle_command(line: &str, session: &mut ChatSession, show_sources: &mut bool) -> Flow {
    let command = line.split_whitespace().next().unwrap_or(line);
    match command {
        "/quit" | "/exit" => return Flow::Quit,
        "/help" => println!("{}", HELP),
        "/retry" => match interruptible(session.retry(), tokio::signal::ctrl_c()).await {
            Some(outcome) => {
                if matches!(outcome, Ok(Ok(None))) {
                    println!("{}", "Nothing to retry yet.".dimmed());
                }
                print_outcome(outcome, session, *show_sources);
            }
            None => report_interrupted(session),
        },
        "/new" => match session.new_conversation() {
            Ok(id) => println!("Started conversation {}", id.dimmed()),
            Err(e) => println!("{}", format!("Could not save new conversation: {}", e).yellow()),
        },
        "/history" => {
            for message in session.state().messages() {
                println!("{}", render_message(message));
            }
        }
        "/sources" => {
            *show_sources = !*show_sources;
            let state = if *show_sources { "on" } else { "off" };
            println!("Sources {}", state);
        }
        "/status" => {
            let state = session.state();
            println!(
                "Connection: {}\nConversation: {}\nUser: {}\nMessages: {}\nTokens: {}",
                connection_label(state.connection_status()),
                session.conversation_id(),
                session.user_id(),
                state.message_count(),
                state.total_tokens()
            );
        }
        other => println!("{}", format!("Unknown command {}. Type /help.", other).yellow()),
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConnectionArgs;
    use mockito::Server;
    use std::path::PathBuf;

    fn chat_args(message: &str) -> ChatArgs {
        ChatArgs {
            message: Some(message.to_string()),
            json: false,
            html: false,
            sources: false,
            new: false,
            conversation: Some("conv_cli_test".to_string()),
            user: None,
            locale: None,
            no_persist: true,
            connection: ConnectionArgs {
                config: PathBuf::from("parley.toml"),
                base_url: None,
                timeout: None,
                log_level: None,
            },
        }
    }

    fn config_for(url: String) -> ParleyConfig {
        let mut config = ParleyConfig::default();
        config.api.base_url = url;
        config.storage.persist_conversation = false;
        config
    }

    async fn reply_server(body: &str) -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        (server, mock)
    }

    #[tokio::test]
    async fn test_one_shot_plain() {
        let (server, _mock) = reply_server(r#"{"response":"**Rust** it is","conversation_id":"conv_cli_test"}"#).await;
        let output = handle_chat(&chat_args("Which language?"), &config_for(server.url()))
            .await
            .unwrap();
        assert_eq!(output, "**Rust** it is");
    }

    #[tokio::test]
    async fn test_one_shot_html() {
        let (server, _mock) = reply_server(r#"{"response":"**Rust** <3","conversation_id":"c"}"#).await;
        let mut args = chat_args("Which language?");
        args.html = true;

        let output = handle_chat(&args, &config_for(server.url())).await.unwrap();
        assert_eq!(output, "<strong>Rust</strong> &lt;3");
    }

    #[tokio::test]
    async fn test_one_shot_json_includes_conversation() {
        let (server, _mock) = reply_server(r#"{"response":"ok","conversation_id":"conv_cli_test"}"#).await;
        let mut args = chat_args("hi");
        args.json = true;

        let output = handle_chat(&args, &config_for(server.url())).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["conversation_id"], "conv_cli_test");
        assert_eq!(parsed["message"]["role"], "assistant");
        assert_eq!(parsed["message"]["text"], "ok");
    }

    #[tokio::test]
    async fn test_one_shot_sources_table() {
        let (server, _mock) = reply_server(
            r#"{"response":"ok","conversation_id":"c",
                "retrieved_context":[{"id":"cv.md","text":"Rust and Go","similarity":0.8}]}"#,
        )
        .await;
        let mut args = chat_args("hi");
        args.sources = true;

        let output = handle_chat(&args, &config_for(server.url())).await.unwrap();
        assert!(output.contains("cv.md"));
    }

    #[tokio::test]
    async fn test_one_shot_failure_uses_locale() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/")
            .with_status(429)
            .create_async()
            .await;
        let mut args = chat_args("hi");
        args.locale = Some("sv".to_string());

        let err = handle_chat(&args, &config_for(server.url())).await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Du skickar för många meddelanden."));
        assert!(err.to_string().contains("RATE_LIMIT_EXCEEDED"));
    }

    #[tokio::test]
    async fn test_one_shot_blank_message() {
        let err = handle_chat(&chat_args("   "), &config_for("http://127.0.0.1:9".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Type a message before sending.");
    }

    #[tokio::test]
    async fn test_one_shot_too_long_uses_locale() {
        let mut args = chat_args(&"x".repeat(501));
        args.locale = Some("sv".to_string());

        let err = handle_chat(&args, &config_for("http://127.0.0.1:9".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Meddelandet är för långt. Maximalt 500 tecken.");
    }

    #[tokio::test]
    async fn test_interruptible_signal_wins_over_slow_turn() {
        let turn = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "finished"
        };
        let signal = tokio::time::sleep(Duration::from_millis(20));

        assert!(interruptible(turn, signal).await.is_none());
    }

    #[tokio::test]
    async fn test_interruptible_passes_through_finished_turn() {
        let signal = std::future::pending::<()>();
        let outcome = interruptible(async { 7 }, signal).await;
        assert_eq!(outcome, Some(Ok(7)));
    }

    #[tokio::test]
    async fn test_invalid_locale_rejected() {
        let mut args = chat_args("hi");
        args.locale = Some("klingon".to_string());
        assert!(handle_chat(&args, &config_for("http://127.0.0.1:9".to_string()))
            .await
            .is_err());
    }
}
