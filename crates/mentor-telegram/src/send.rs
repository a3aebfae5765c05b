//! Message sending helpers for the Telegram adapter.
//!
//! Telegram's message limit is 4096 characters; we use 4090 for safety.
//! Each chunk tries MarkdownV2 first and falls back to plain text if
//! Telegram rejects the parse mode.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};

use crate::error::TelegramError;

/// Maximum characters per Telegram message (limit is 4096; we use 4090 for safety).
pub const CHUNK_MAX: usize = 4090;

/// Split `text` into chunks under [`CHUNK_MAX`], preferring line boundaries
/// and falling back to spaces, then hard cuts for pathological single lines.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let cost = if current.is_empty() {
            line.len()
        } else {
            1 + line.len()
        };
        if !current.is_empty() && current.len() + cost > CHUNK_MAX {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    // A single line longer than CHUNK_MAX still needs force-splitting.
    let mut result = Vec::new();
    for chunk in chunks {
        if chunk.len() <= CHUNK_MAX {
            result.push(chunk);
            continue;
        }
        let mut remaining = chunk.as_str();
        while remaining.len() > CHUNK_MAX {
            let mut cut = CHUNK_MAX;
            while cut > 0 && !remaining.is_char_boundary(cut) {
                cut -= 1;
            }
            let split_at = remaining[..cut]
                .rfind(' ')
                .filter(|at| *at > 0)
                .unwrap_or(cut);
            result.push(remaining[..split_at].to_string());
            remaining = remaining[split_at..].trim_start();
        }
        if !remaining.is_empty() {
            result.push(remaining.to_string());
        }
    }

    result
}

/// Escape special characters for Telegram MarkdownV2.
///
/// MarkdownV2 requires escaping: `_ * [ ] ( ) ~ ` # + - = | { } . !`
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '#' | '+' | '-' | '=' | '|' | '{'
            | '}' | '.' | '!' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Send `text` to `chat_id` in chunks, attaching `keyboard` to the last one.
///
/// Each chunk tries MarkdownV2 first; if Telegram rejects it, retries as
/// plain text. A failure of the plain-text attempt propagates — the caller
/// must not treat the message as delivered. A 100ms delay between chunks
/// avoids rate limits.
pub async fn send_chunked(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<(), TelegramError> {
    let chunks = split_chunks(text);
    let last = chunks.len() - 1;

    for (i, chunk) in chunks.iter().enumerate() {
        let markup = if i == last { keyboard.clone() } else { None };

        let escaped = escape_markdown_v2(chunk);
        let mut request = bot
            .send_message(chat_id, &escaped)
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(ref markup) = markup {
            request = request.reply_markup(markup.clone());
        }

        if request.await.is_err() {
            // MarkdownV2 rejected — fall back to plain text for this chunk.
            let mut plain = bot.send_message(chat_id, chunk);
            if let Some(markup) = markup {
                plain = plain.reply_markup(markup);
            }
            plain.await?;
        }

        if i < last {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_single_chunk() {
        let chunks = split_chunks("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn exactly_chunk_max_is_single_chunk() {
        let text = "a".repeat(CHUNK_MAX);
        assert_eq!(split_chunks(&text).len(), 1);
    }

    #[test]
    fn over_limit_splits_on_newline() {
        let line = "a".repeat(2000);
        let text = format!("{line}\n{line}\n{line}");
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX, "chunk too large: {}", c.len());
        }
    }

    #[test]
    fn very_long_single_line_force_splits() {
        let text = "x".repeat(9000);
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
        }
    }

    #[test]
    fn force_split_prefers_spaces() {
        let word = "word ".repeat(2000); // ~10000 chars of short words
        let chunks = split_chunks(word.trim_end());
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
            assert!(!c.starts_with(' '));
        }
    }

    #[test]
    fn escape_markdown_v2_escapes_specials() {
        let input = "Hello. World! (test) [link] ~strike~";
        let escaped = escape_markdown_v2(input);
        assert!(escaped.contains("\\."));
        assert!(escaped.contains("\\!"));
        assert!(escaped.contains("\\("));
        assert!(escaped.contains("\\)"));
        assert!(escaped.contains("\\["));
        assert!(escaped.contains("\\]"));
        assert!(escaped.contains("\\~"));
    }

    #[test]
    fn escape_markdown_v2_leaves_normal_chars() {
        let input = "Hello world 123 abc";
        assert_eq!(escape_markdown_v2(input), input);
    }
}
