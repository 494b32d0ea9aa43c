use crate::models::Listing;
use crate::render;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

/// Maximum characters a chat message may carry
pub const MESSAGE_LIMIT: usize = 2000;

/// Channel that receives new listings and status lines
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a titled table of listings
    async fn send_listings(&self, title: &str, listings: &[Listing]) -> Result<()>;

    /// Send a plain status line
    async fn send_status(&self, text: &str) -> Result<()>;
}

/// Writes notifications to stdout
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_listings(&self, title: &str, listings: &[Listing]) -> Result<()> {
        info!(count = listings.len(), "{}", title);
        println!("{}\n{}", title, render::table(listings));
        Ok(())
    }

    async fn send_status(&self, text: &str) -> Result<()> {
        info!("{}", text);
        println!("{}", text);
        Ok(())
    }
}

/// Posts notifications to a chat webhook (Discord-compatible `{"content": ...}` payload)
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn post(&self, content: &str) -> Result<()> {
        debug!(len = content.len(), "Posting webhook message");
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "content": content }))
            .send()
            .await
            .context("Failed to reach webhook")?;

        if !response.status().is_success() {
            anyhow::bail!("Webhook rejected message: {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_listings(&self, title: &str, listings: &[Listing]) -> Result<()> {
        self.post(title).await?;
        // room for the fences
        for chunk in split_lines(&render::table(listings), MESSAGE_LIMIT - 8) {
            self.post(&format!("```\n{}\n```", chunk)).await?;
        }
        Ok(())
    }

    async fn send_status(&self, text: &str) -> Result<()> {
        for chunk in split_lines(text, MESSAGE_LIMIT) {
            self.post(&chunk).await?;
        }
        Ok(())
    }
}

/// Split `text` into chunks of at most `limit` characters, breaking between
/// lines where possible and inside a line only when it alone is too long.
pub fn split_lines(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { current_len + 1 + line_len };

        if needed <= limit {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_lines("a\nb", 10), vec!["a\nb"]);
        assert!(split_lines("", 10).is_empty());
    }

    #[test]
    fn breaks_between_lines() {
        assert_eq!(split_lines("aaaa\nbbbb\ncc", 9), vec!["aaaa\nbbbb", "cc"]);
    }

    #[test]
    fn long_line_is_cut() {
        assert_eq!(split_lines("ab\nabcdefg\nx", 3), vec!["ab", "abc", "def", "g", "x"]);
    }

    #[test]
    fn chunks_respect_the_limit() {
        let text = (0..500).map(|i| format!("row {i:04}")).collect::<Vec<_>>().join("\n");
        let chunks = split_lines(&text, MESSAGE_LIMIT);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MESSAGE_LIMIT));
        assert_eq!(chunks.join("\n"), text);
    }
}
