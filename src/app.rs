//! Command runners behind the CLI.
//!
//! Every runner writes to a caller-supplied sink so the binary can hand in
//! stdout and tests can hand in a buffer. The `bool` in each result is
//! `true` when the command succeeded end to end.

use std::io::Write;

use clap::CommandFactory;
use colored::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::binder::{self, Slot};
use crate::chat::ChatSession;
use crate::cli::{self, Args, Command, ReplCommand};
use crate::client::{ChatBackend, ChatClient, ChatParams, Outcome};
use crate::compare::{ComparisonRun, RunPhase, Submission, Variant};
use crate::embedding;
use crate::error::CompareError;
use crate::providers::Deployment;
use crate::render;
use crate::upload::{self, DocumentUploader};
use crate::views::{DeploymentComparison, TemperatureComparison};

/// Dispatch a parsed command line.
pub async fn run(args: Args) -> Result<bool, CompareError> {
    if let Command::Completions { shell } = &args.command {
        let mut cmd = Args::command();
        clap_complete::generate(*shell, &mut cmd, "llm-compare", &mut std::io::stdout());
        return Ok(true);
    }

    let config = cli::resolve_config(&args)?;
    let defaults = ChatParams::new(config.default_temperature, config.default_deployment);
    let client = ChatClient::from_config(config)?;
    let mut stdout = std::io::stdout();

    match args.command {
        Command::Chat { temperature, deployment } => {
            let mut session = ChatSession::new(
                defaults.temperature,
                deployment.unwrap_or(defaults.deployment),
            );
            if let Some(t) = temperature {
                session.set_temperature(t)?;
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            chat_loop(&mut session, &client, stdin, &mut stdout).await
        }
        Command::Ask { prompt, temperature, deployment } => {
            let params = ChatParams::new(
                temperature.unwrap_or(defaults.temperature),
                deployment.unwrap_or(defaults.deployment),
            );
            ask(&client, &prompt, params, None, &mut stdout).await
        }
        Command::Query { question, source, temperature, deployment } => {
            let params = ChatParams::new(
                temperature.unwrap_or(defaults.temperature),
                deployment.unwrap_or(defaults.deployment),
            );
            ask(&client, &question, params, Some(source), &mut stdout).await
        }
        Command::CompareDeployments { prompt, temperature } => {
            let mut view = DeploymentComparison::with_temperature(temperature.unwrap_or(defaults.temperature));
            compare(DeploymentComparison::TITLE, view.run_mut(), &prompt, &client, &mut stdout).await
        }
        Command::CompareTemperatures { prompt, deployment } => {
            let mut view = TemperatureComparison::new(deployment.unwrap_or(defaults.deployment));
            compare(TemperatureComparison::TITLE, view.run_mut(), &prompt, &client, &mut stdout).await
        }
        Command::Upload { path } => {
            let receipt = upload::upload_document(&client, &path).await?;
            writeln!(stdout, "{} {}", receipt.file_name.bright_green(), receipt.status).map_err(io_err)?;
            Ok(true)
        }
        Command::Embed { text } => {
            let items = embedding::build(&client, &text).await?;
            write!(stdout, "{}", render::render_embeddings(&items)).map_err(io_err)?;
            Ok(true)
        }
        Command::EmbedStore { text } => {
            let status = embedding::store(&client, &text).await?;
            writeln!(stdout, "{status}").map_err(io_err)?;
            Ok(true)
        }
        Command::Search { text, limit } => {
            let results = embedding::search(&client, &text, limit).await?;
            write!(stdout, "{}", render::render_search_results(&results)).map_err(io_err)?;
            Ok(true)
        }
        Command::Completions { .. } => Ok(true),
    }
}

/// Run one comparison, printing each response as it arrives and the full
/// board at the end.
pub async fn compare<V, B, W>(
    title: &str,
    run: &mut ComparisonRun<V>,
    prompt: &str,
    backend: &B,
    out: &mut W,
) -> Result<bool, CompareError>
where
    V: Variant,
    B: ChatBackend,
    W: Write,
{
    match run.submit(prompt) {
        Submission::Rejected { message } => return Err(CompareError::Validation(message)),
        Submission::Ignored => return Ok(false),
        Submission::Started(_) => {}
    }

    writeln!(out, "{}", title.bright_cyan().bold()).map_err(io_err)?;
    if let Some(req) = run.pending_request() {
        writeln!(out, "{}", format!("asking {}...", req.variant.label()).dimmed()).map_err(io_err)?;
    }

    let mut write_result = Ok(());
    run.drive(backend, |r| {
        if write_result.is_err() {
            return;
        }
        write_result = write_progress(r, out);
    })
    .await;
    write_result.map_err(io_err)?;

    writeln!(out).map_err(io_err)?;
    write!(out, "{}", render::render_board(title, run)).map_err(io_err)?;
    out.flush().map_err(io_err)?;

    Ok(*run.phase() == RunPhase::Completed)
}

fn write_progress<V: Variant, W: Write>(run: &ComparisonRun<V>, out: &mut W) -> std::io::Result<()> {
    // the slot just filled sits right before the cursor
    let answered = match run.phase() {
        RunPhase::Halted { .. } => None,
        _ => run.cursor().checked_sub(1),
    };
    if let Some(idx) = answered {
        if let Some(view) = binder::bind(run).into_iter().nth(idx) {
            if let Slot::Response(_) = view.slot {
                write!(out, "{}", render::render_slot(&view.heading, view.slot))?;
            }
        }
    }
    if let Some(req) = run.pending_request() {
        writeln!(out, "{}", format!("asking {}...", req.variant.label()).dimmed())?;
    }
    out.flush()
}

/// Single exchange against the chat endpoint, or the grounded query endpoint
/// when `source` is `Some` (its inner value scopes retrieval to one file).
pub async fn ask<B: ChatBackend, W: Write>(
    backend: &B,
    prompt: &str,
    params: ChatParams,
    source: Option<Option<String>>,
    out: &mut W,
) -> Result<bool, CompareError> {
    if prompt.trim().is_empty() {
        return Err(CompareError::Validation(crate::chat::EMPTY_INPUT_MESSAGE.to_string()));
    }
    let outcome = match &source {
        Some(file) => backend.query(prompt, params, file.as_deref()).await,
        None => backend.chat(prompt, params).await,
    };
    match outcome {
        Outcome::Ok { text } => {
            writeln!(out, "{text}").map_err(io_err)?;
            Ok(true)
        }
        Outcome::Err { message } => {
            writeln!(out, "{}", format!("Error occurred: {message}").bright_red()).map_err(io_err)?;
            Ok(false)
        }
    }
}

/// Interactive chat over a line reader.
pub async fn chat_loop<C, R, W>(
    session: &mut ChatSession,
    client: &C,
    reader: R,
    out: &mut W,
) -> Result<bool, CompareError>
where
    C: ChatBackend + DocumentUploader,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "{} ({} @ {}) - /help for commands",
        "chat".bright_cyan().bold(),
        session.deployment().display_name(),
        session.temperature()
    )
    .map_err(io_err)?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.map_err(io_err)? {
        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Help => writeln!(out, "{}", cli::REPL_HELP).map_err(io_err)?,
            ReplCommand::Clear => {
                session.clear_document();
                writeln!(out, "{}", "conversation cleared".dimmed()).map_err(io_err)?;
            }
            ReplCommand::Temperature(arg) => {
                let result = arg
                    .parse::<f64>()
                    .map_err(|_| CompareError::Validation(format!("not a number: {arg}")))
                    .and_then(|t| session.set_temperature(t));
                match result {
                    Ok(()) => writeln!(out, "temperature = {}", session.temperature()),
                    Err(e) => writeln!(out, "{}", e.to_string().bright_red()),
                }
                .map_err(io_err)?;
            }
            ReplCommand::Deployment(arg) => {
                match arg.parse::<Deployment>() {
                    Ok(d) => {
                        session.set_deployment(d);
                        writeln!(out, "deployment = {}", d.display_name())
                    }
                    Err(e) => writeln!(out, "{}", e.bright_red()),
                }
                .map_err(io_err)?;
            }
            ReplCommand::Upload(path) => match client.upload(&path).await {
                Ok(receipt) => {
                    session.attach_document(receipt.file_name, &receipt.status);
                    if let Some(msg) = session.log().last() {
                        writeln!(out, "{}", render::render_message(msg)).map_err(io_err)?;
                    }
                }
                Err(e) => writeln!(out, "{}", e.to_string().bright_red()).map_err(io_err)?,
            },
            ReplCommand::Unknown(cmd) => {
                writeln!(out, "{}", format!("unknown command /{cmd}").bright_red()).map_err(io_err)?
            }
            ReplCommand::Send(text) => {
                session.clear_error();
                match session.send(&text, client).await {
                    Ok(Some(reply)) => writeln!(out, "{}", render::render_message(reply)).map_err(io_err)?,
                    Ok(None) => debug!("send ignored"),
                    Err(e) => writeln!(out, "{}", e.to_string().bright_red()).map_err(io_err)?,
                }
            }
        }
        out.flush().map_err(io_err)?;
    }

    info!(messages = session.log().len(), "chat session ended");
    Ok(true)
}

fn io_err(source: std::io::Error) -> CompareError {
    CompareError::Io {
        path: "<output>".to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatMessage, Role};
    use crate::compare::Temperature;
    use crate::test_support::{Endpoint, Scripted, UPLOAD_STATUS};

    #[tokio::test]
    async fn compare_prints_each_response_and_board() {
        let backend = Scripted::new(vec![
            Outcome::success("Hi"),
            Outcome::success("Bonjour"),
            Outcome::success("Ni hao"),
        ]);
        let mut view = DeploymentComparison::new();
        let mut out = Vec::new();
        let ok = compare("Compare Deployments", view.run_mut(), "Hello", &backend, &mut out)
            .await
            .expect("compare");
        assert!(ok);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("asking openAI..."));
        assert!(text.contains("asking deepseek..."));
        // once as progress, once in the final board
        assert_eq!(text.matches("Bonjour").count(), 2);
    }

    #[tokio::test]
    async fn compare_reports_halt_as_unsuccessful() {
        let backend = Scripted::new(vec![Outcome::success("0"), Outcome::failure("boom")]);
        let mut view = TemperatureComparison::default();
        let mut out = Vec::new();
        let ok = compare("Compare Temperatures", view.run_mut(), "Test", &backend, &mut out)
            .await
            .expect("compare");
        assert!(!ok);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Error occurred with temperature 0.5: boom"));
        assert_eq!(view.run().results().get(&Temperature(0.0)), Some("0"));
    }

    #[tokio::test]
    async fn compare_blank_prompt_is_validation_error() {
        let backend = Scripted::new(vec![]);
        let mut view = DeploymentComparison::new();
        let mut out = Vec::new();
        let err = compare("x", view.run_mut(), " ", &backend, &mut out).await.unwrap_err();
        assert!(err.is_validation());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn ask_prints_reply_or_error() {
        let backend = Scripted::new(vec![Outcome::success("pong"), Outcome::failure("nope")]);
        let params = ChatParams::new(0.7, Deployment::OpenAi);

        let mut out = Vec::new();
        assert!(ask(&backend, "ping", params, None, &mut out).await.expect("ask"));
        assert!(String::from_utf8_lossy(&out).contains("pong"));

        let mut out = Vec::new();
        assert!(!ask(&backend, "ping", params, Some(None), &mut out).await.expect("ask"));
        assert!(String::from_utf8_lossy(&out).contains("Error occurred: nope"));
    }

    #[tokio::test]
    async fn compare_after_blank_prompt_clears_error() {
        let backend = Scripted::new([
            Outcome::success("a"),
            Outcome::success("b"),
            Outcome::success("c"),
        ]);
        let mut view = DeploymentComparison::new();
        let mut out = Vec::new();
        assert!(compare("x", view.run_mut(), "", &backend, &mut out).await.is_err());
        assert!(view.run().error_message().is_some());

        let ok = compare("x", view.run_mut(), "Hello", &backend, &mut out)
            .await
            .expect("compare");
        assert!(ok);
        assert!(view.run().error_message().is_none());
    }

    async fn drive_chat(session: &mut ChatSession, backend: &Scripted, script: &str) -> String {
        let mut out = Vec::new();
        let ok = chat_loop(session, backend, script.as_bytes(), &mut out)
            .await
            .expect("chat loop");
        assert!(ok);
        String::from_utf8(out).expect("utf8")
    }

    #[tokio::test]
    async fn chat_loop_sends_plain_lines_and_logs_replies() {
        let backend = Scripted::new([Outcome::success("Hello back"), Outcome::failure("rate limited")]);
        let mut session = ChatSession::default();
        let text = drive_chat(&mut session, &backend, "Hi there\nAgain\n").await;

        assert!(text.contains("bot>"));
        assert!(text.contains("Hello back"));
        assert!(text.contains("Error occurred: rate limited"));
        let roles: Vec<Role> = session.log().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::User, Role::Error]);
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn chat_loop_applies_settings_to_later_sends() {
        let backend = Scripted::new([Outcome::success("ok")]);
        let mut session = ChatSession::default();
        let text = drive_chat(
            &mut session,
            &backend,
            "/temp 0.2\n/temp 3\n/temp warm\n/deploy deepseek\n/deploy gemini\nGo\n",
        )
        .await;

        assert!(text.contains("temperature = 0.2"));
        assert!(text.contains("Temperature must be between 0 and 1."));
        assert!(text.contains("not a number: warm"));
        assert!(text.contains("deployment = DeepSeek"));
        assert!(text.contains("Unknown deployment: gemini"));
        assert_eq!(session.temperature(), 0.2);
        assert_eq!(session.deployment(), Deployment::Deepseek);
        assert_eq!(backend.calls()[0].params, ChatParams::new(0.2, Deployment::Deepseek));
    }

    #[tokio::test]
    async fn chat_loop_upload_grounds_later_questions_until_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").expect("write");

        let backend = Scripted::new([Outcome::success("grounded"), Outcome::success("plain")]);
        let mut session = ChatSession::default();
        let script = format!("/upload {}\nSummarize\n/clear\nHello\n", path.display());
        let text = drive_chat(&mut session, &backend, &script).await;

        assert!(text.contains(UPLOAD_STATUS));
        assert!(text.contains("conversation cleared"));
        assert_eq!(backend.uploads(), [path]);
        let calls = backend.calls();
        assert_eq!(calls[0].endpoint, Endpoint::Query);
        assert_eq!(calls[0].source.as_deref(), Some("report.pdf"));
        assert_eq!(calls[1].endpoint, Endpoint::Chat);
        assert!(session.document().is_none());
        assert_eq!(
            session.log(),
            &[
                ChatMessage::new(Role::User, "Hello"),
                ChatMessage::new(Role::Assistant, "plain")
            ]
        );
    }

    #[tokio::test]
    async fn chat_loop_upload_without_path_is_validation_message() {
        let backend = Scripted::default();
        let mut session = ChatSession::default();
        let text = drive_chat(&mut session, &backend, "/upload\n").await;
        assert!(text.contains(upload::EMPTY_FILE_MESSAGE));
        assert!(!text.contains("I/O error"));
        assert!(backend.uploads().is_empty());
        assert!(session.log().is_empty());
    }

    #[tokio::test]
    async fn chat_loop_stops_at_quit_and_reports_bad_input() {
        let backend = Scripted::new([Outcome::success("never")]);
        let mut session = ChatSession::default();
        let text = drive_chat(&mut session, &backend, "   \n/bogus\n/help\n/quit\nafter quit\n").await;

        assert!(text.contains(crate::chat::EMPTY_INPUT_MESSAGE));
        assert!(text.contains("unknown command /bogus"));
        assert!(text.contains("/deploy <name>"));
        assert!(backend.calls().is_empty());
        assert!(session.log().is_empty());
    }
}
