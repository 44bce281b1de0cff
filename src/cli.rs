use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::client::validate_temperature;
use crate::config::Config;
use crate::error::CompareError;
use crate::providers::{Deployment, DEFAULT_SEARCH_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "llm-compare")]
#[command(version)]
#[command(about = "Chat with LLM deployments and compare their answers side by side")]
pub struct Args {
    /// Path to a TOML config file (defaults to ./llm-compare.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the chat backend, e.g. http://localhost:8080
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat session on stdin
    Chat {
        /// Sampling temperature between 0 and 1
        #[arg(long, value_parser = parse_temperature)]
        temperature: Option<f64>,

        #[arg(long, value_enum)]
        deployment: Option<Deployment>,
    },

    /// Send a single prompt and print the reply
    Ask {
        prompt: String,

        #[arg(long, value_parser = parse_temperature)]
        temperature: Option<f64>,

        #[arg(long, value_enum)]
        deployment: Option<Deployment>,
    },

    /// Send one prompt to every deployment, one after the other
    CompareDeployments {
        prompt: String,

        /// Temperature used for every deployment (config default when omitted)
        #[arg(long, value_parser = parse_temperature)]
        temperature: Option<f64>,
    },

    /// Send one prompt at temperatures 0, 0.5 and 1
    CompareTemperatures {
        prompt: String,

        #[arg(long, value_enum)]
        deployment: Option<Deployment>,
    },

    /// Upload a PDF or DOCX document for grounded questions
    Upload { path: PathBuf },

    /// Ask a question grounded in uploaded documents
    Query {
        question: String,

        /// Restrict retrieval to this uploaded file name
        #[arg(long)]
        source: Option<String>,

        #[arg(long, value_parser = parse_temperature)]
        temperature: Option<f64>,

        #[arg(long, value_enum)]
        deployment: Option<Deployment>,
    },

    /// Print the embedding vector for a text
    Embed { text: String },

    /// Embed a text and store it in the vector collection
    EmbedStore { text: String },

    /// Find stored embeddings similar to a text
    Search {
        text: String,

        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn parse_temperature(s: &str) -> Result<f64, String> {
    let t: f64 = s.trim().parse().map_err(|_| format!("not a number: {s}"))?;
    validate_temperature(t).map_err(|e| e.to_string())
}

/// Load the config file and apply the global CLI overrides on top.
pub fn resolve_config(args: &Args) -> Result<Config, CompareError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = args.timeout {
        config.request_timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

/// One line typed into the interactive chat.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Send(String),
    Temperature(String),
    Deployment(String),
    Upload(PathBuf),
    /// Drop the document context and the log.
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return ReplCommand::Send(line.trim_end_matches(['\r', '\n']).to_string());
        };
        let (cmd, arg) = match rest.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (rest, ""),
        };
        match cmd {
            "temp" | "temperature" => ReplCommand::Temperature(arg.to_string()),
            "deploy" | "deployment" => ReplCommand::Deployment(arg.to_string()),
            "upload" => ReplCommand::Upload(PathBuf::from(arg)),
            "clear" => ReplCommand::Clear,
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        }
    }
}

pub const REPL_HELP: &str = "\
/temp <0..1>        set sampling temperature
/deploy <name>      openAI | mistral | deepseek
/upload <path>      upload a PDF/DOCX and ground answers in it
/clear              drop the document and clear the conversation
/quit               leave";
