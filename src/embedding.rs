//! Embedding build, store and similarity search.
//!
//! Text is checked locally before a request is made; the server applies the
//! same rule and answers 400 with the same message.

use tracing::info;

use crate::client::ChatClient;
use crate::error::CompareError;
use crate::providers::{EmbeddingItem, SearchResult};

pub const EMPTY_TEXT_MESSAGE: &str = "Input text cannot be empty.";
pub const INVALID_LIMIT_MESSAGE: &str = "Search limit must be at least 1.";

fn check_text(text: &str) -> Result<(), CompareError> {
    if text.trim().is_empty() {
        return Err(CompareError::Validation(EMPTY_TEXT_MESSAGE.to_string()));
    }
    Ok(())
}

pub async fn build(client: &ChatClient, text: &str) -> Result<Vec<EmbeddingItem>, CompareError> {
    check_text(text)?;
    let items = client.build_embedding(text).await?;
    info!(
        vectors = items.len(),
        dimensions = items.first().map_or(0, |i| i.embedding.len()),
        "embedding built"
    );
    Ok(items)
}

pub async fn store(client: &ChatClient, text: &str) -> Result<String, CompareError> {
    check_text(text)?;
    let status = client.store_embedding(text).await?;
    info!(status = %status, "embedding stored");
    Ok(status)
}

pub async fn search(client: &ChatClient, text: &str, limit: u32) -> Result<Vec<SearchResult>, CompareError> {
    check_text(text)?;
    if limit == 0 {
        return Err(CompareError::Validation(INVALID_LIMIT_MESSAGE.to_string()));
    }
    let results = client.search_embeddings(text, limit).await?;
    info!(limit, hits = results.len(), "similarity search finished");
    Ok(results)
}
