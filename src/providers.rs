use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Backend deployment selected per request.
///
/// The wire names are fixed by the chat endpoint (`openAI`, `mistral`,
/// `deepseek`); the CLI also accepts the lowercase `openai` spelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum Deployment {
    #[default]
    #[value(name = "openAI", alias = "openai")]
    #[serde(rename = "openAI")]
    OpenAi,
    #[value(name = "mistral")]
    #[serde(rename = "mistral")]
    Mistral,
    #[value(name = "deepseek")]
    #[serde(rename = "deepseek")]
    Deepseek,
}

impl Deployment {
    /// All deployments in comparison order.
    pub const ALL: [Deployment; 3] = [Deployment::OpenAi, Deployment::Mistral, Deployment::Deepseek];

    pub fn as_str(self) -> &'static str {
        match self {
            Deployment::OpenAi => "openAI",
            Deployment::Mistral => "mistral",
            Deployment::Deepseek => "deepseek",
        }
    }

    /// Human-facing name, as shown in deployment pickers.
    pub fn display_name(self) -> &'static str {
        match self {
            Deployment::OpenAi => "OpenAI",
            Deployment::Mistral => "Mistral",
            Deployment::Deepseek => "DeepSeek",
        }
    }
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Deployment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Deployment::OpenAi),
            "mistral" => Ok(Deployment::Mistral),
            "deepseek" => Ok(Deployment::Deepseek),
            _ => Err(format!("Unknown deployment: {}", s)),
        }
    }
}

// -- Chat endpoint types ----------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub input: String,
    pub temperature: f64,
    pub deployment: Deployment,
}

/// Body returned by both the chat and the grounded query endpoint.
///
/// Success carries `response`; failure carries `error`. The grounded query
/// endpoint may set `error` even on a 2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// -- Grounded query endpoint types ------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RagQueryRequest {
    pub input: String,
    pub temperature: f64,
    pub deployment: Deployment,
    /// Restricts retrieval to one uploaded document. Sent as `null` when unset.
    #[serde(rename = "sourceFilename")]
    pub source_filename: Option<String>,
}

// -- Embedding endpoint types -----------------------------------------------

/// Result count used by similarity search when none is given.
pub const DEFAULT_SEARCH_LIMIT: u32 = 3;

/// Body shared by the build, build-and-store and search endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub text: String,
    pub limit: u32,
}

/// One embedding vector as returned by the build endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddingItem {
    pub embedding: Vec<f32>,
    #[serde(rename = "promptIndex", default)]
    pub prompt_index: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingReply {
    #[serde(default)]
    pub embedding: Option<Vec<EmbeddingItem>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One stored vector close to the query text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub uuid: String,
    #[serde(rename = "embeddingPoints", default)]
    pub embedding_points: Vec<f32>,
}
