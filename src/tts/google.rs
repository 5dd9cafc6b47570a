use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use log::{debug, error};
use reqwest::blocking::Client;

use super::{SpeechError, Synthesizer};

/// The translate endpoint refuses longer inputs.
const MAX_CHUNK_CHARS: usize = 100;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Google Translate speech endpoint, English, normal speed. Responses are
/// MP3 and chunks are appended back to back.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    endpoint: String,
    timeout: Duration,
    language: String,
}

impl GoogleTts {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            timeout,
            language: "en".to_string(),
        }
    }

    fn fetch(
        &self,
        client: &Client,
        chunk: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SpeechError> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();
        let response = client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", self.language.as_str()),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("client", "tw-ob"),
                ("ttsspeed", "1"),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            error!("TTS chunk {idx}/{total} failed with HTTP {status}");
            return Err(SpeechError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

impl Synthesizer for GoogleTts {
    fn name(&self) -> &'static str {
        "google"
    }

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let mut file = File::create(output)?;
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!("Requesting TTS chunk {}/{}", idx + 1, chunks.len());
            let audio = self.fetch(&client, chunk, idx, chunks.len())?;
            file.write_all(&audio)?;
        }
        file.flush()?;
        Ok(())
    }
}

/// Packs whitespace separated words into chunks of at most `max_chars`
/// characters; words longer than that are cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for mut word in text.split_whitespace() {
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let cut = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(idx, _)| idx);
            chunks.push(word[..cut].to_string());
            word = &word[cut..];
        }

        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
