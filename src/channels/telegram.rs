use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use super::formatting::{split_message, truncate_caption};
use crate::pipeline::{Outcome, Pipeline};
use crate::providers::{build_http_client, HTTP_TIMEOUT};
use crate::traits::{Channel, ChannelCapabilities};
use crate::types::{InboundMessage, Payload, Sender};

const MAX_MESSAGE_LEN: usize = 4096;
const MAX_CAPTION_LEN: usize = 1024;

const UNSUPPORTED_MESSAGE: &str = "Я понимаю только текстовые и голосовые сообщения.";

pub struct TelegramChannel {
    bot: Bot,
    bot_token: String,
    http: reqwest::Client,
    pipeline: Arc<Pipeline>,
}

impl Drop for TelegramChannel {
    fn drop(&mut self) {
        self.bot_token.zeroize();
    }
}

/// Split `/name@bot rest` into the bare command name and its argument text.
fn parse_command(text: &str) -> Option<(String, String)> {
    let body = text.strip_prefix('/')?;
    let (head, arg) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], body[idx..].trim_start()),
        None => (body, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, arg.to_string()))
}

/// What the pipeline should see for a message carrying `text` and/or a voice
/// note. `None` for anything else (stickers, photos, ...).
fn payload_from_parts(text: Option<&str>, voice_file_id: Option<String>) -> Option<Payload> {
    if let Some(file_id) = voice_file_id {
        return Some(Payload::Voice { file_id });
    }
    let text = text?;
    if text.trim().is_empty() {
        return None;
    }
    if let Some((name, arg)) = parse_command(text) {
        return Some(Payload::Command { name, arg });
    }
    Some(Payload::Text(text.to_string()))
}

/// Send `text` in chunks of at most `max_len` characters, stopping at the
/// first chunk that fails. Chunks sent before the failure stay in the chat,
/// but the reply as a whole counts as undelivered.
async fn send_in_chunks<F, Fut>(text: &str, max_len: usize, mut send: F) -> anyhow::Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let chunks = split_message(text, max_len);
    let total = chunks.len();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        if let Err(e) = send(chunk).await {
            warn!(part = idx + 1, total, "Failed to send message: {}", e);
            anyhow::bail!(
                "Failed to send Telegram message (part {} of {}): {}",
                idx + 1,
                total,
                e
            );
        }
    }
    Ok(())
}

/// GET a Telegram file URL. The URL embeds the bot token, so it is stripped
/// from every transport error before the error leaves this function.
async fn fetch_file(http: &reqwest::Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let redact = |e: reqwest::Error| {
        anyhow::anyhow!("Failed to download file from Telegram: {}", e.without_url())
    };

    let response = http.get(url).send().await.map_err(redact)?;
    if !response.status().is_success() {
        anyhow::bail!(
            "Failed to download file from Telegram: HTTP {}",
            response.status()
        );
    }
    let bytes = response.bytes().await.map_err(redact)?;
    Ok(bytes.to_vec())
}

impl TelegramChannel {
    pub fn new(bot_token: &str, pipeline: Arc<Pipeline>) -> Result<Self, String> {
        Ok(Self {
            bot: Bot::new(bot_token),
            bot_token: bot_token.to_string(),
            http: build_http_client(HTTP_TIMEOUT)?,
            pipeline,
        })
    }

    /// Run the dispatcher until Ctrl-C.
    pub async fn start(self: Arc<Self>) {
        match self.bot.get_me().await {
            Ok(me) => info!(name = %me.username(), "Starting Telegram channel"),
            Err(e) => warn!("Failed to fetch bot info: {}", e),
        }

        let handler = Update::filter_message().endpoint({
            let channel = Arc::clone(&self);
            move |msg: teloxide::types::Message| {
                let channel = Arc::clone(&channel);
                async move {
                    channel.handle_message(msg).await;
                    respond(())
                }
            }
        });

        // One distribution key for every update: messages are handled
        // strictly one after another, never concurrently.
        Dispatcher::builder(self.bot.clone(), handler)
            .distribution_function(|_| Some(()))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_message(&self, msg: teloxide::types::Message) {
        let Some(user) = msg.from.as_ref() else {
            debug!(chat_id = msg.chat.id.0, "Ignoring message without sender");
            return;
        };

        let voice_file_id = msg.voice().map(|v| v.file.id.to_string());
        let Some(payload) = payload_from_parts(msg.text(), voice_file_id) else {
            if let Err(e) = self.bot.send_message(msg.chat.id, UNSUPPORTED_MESSAGE).await {
                warn!(chat_id = msg.chat.id.0, error = %e, "Failed to send unsupported-message reply");
            }
            return;
        };

        let inbound = InboundMessage {
            chat_id: msg.chat.id.0,
            sender: Sender {
                user_id: user.id.0 as i64,
                username: user.username.clone().unwrap_or_default(),
            },
            payload,
        };
        info!(
            chat_id = inbound.chat_id,
            user_id = inbound.sender.user_id,
            username = %inbound.sender.username,
            kind = %inbound.input_kind(),
            "Message received"
        );

        match self.pipeline.handle(&inbound, self).await {
            Outcome::Persisted(kind) => debug!(output = %kind, "Message handled"),
            Outcome::Delivered => debug!("Message handled, nothing recorded"),
            Outcome::Rejected(e) => debug!(reason = %e, "Message rejected"),
            Outcome::Failed(e) => debug!(error = %e, "Message failed"),
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> String {
        "telegram".to_string()
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            max_message_len: MAX_MESSAGE_LEN,
            max_caption_len: MAX_CAPTION_LEN,
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let max_len = self.capabilities().max_message_len;
        send_in_chunks(text, max_len, |chunk| {
            let bot = self.bot.clone();
            async move {
                bot.send_message(ChatId(chat_id), chunk).await?;
                Ok::<(), anyhow::Error>(())
            }
        })
        .await
    }

    async fn send_voice(&self, chat_id: i64, audio: &[u8], caption: &str) -> anyhow::Result<()> {
        // Removed when `tmp` drops, whether or not the upload succeeded.
        let mut tmp = tempfile::Builder::new()
            .prefix("voice-response-")
            .suffix(".mp3")
            .tempfile()?;
        tmp.write_all(audio)?;
        tmp.flush()?;

        let voice = InputFile::file(tmp.path().to_path_buf());
        self.bot
            .send_voice(ChatId(chat_id), voice)
            .caption(truncate_caption(caption, MAX_CAPTION_LEN))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send voice: {}", e))?;
        Ok(())
    }

    async fn download_voice(&self, file_id: &str) -> anyhow::Result<Vec<u8>> {
        let file = self.bot.get_file(file_id.to_string()).await?;

        // Download via HTTP (simpler than teloxide's Download trait)
        let download_url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token, file.path
        );
        let bytes = fetch_file(&self.http, &download_url).await?;
        debug!(size = bytes.len(), "Downloaded voice message");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_argument() {
        assert_eq!(
            parse_command("/voice Привет, мир"),
            Some(("voice".to_string(), "Привет, мир".to_string()))
        );
    }

    #[test]
    fn test_parse_command_strips_bot_mention() {
        assert_eq!(
            parse_command("/Help@voxlog_bot"),
            Some(("help".to_string(), String::new()))
        );
    }

    #[test]
    fn test_parse_command_rejects_bare_slash() {
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("hello"), None);
    }

    #[test]
    fn test_voice_wins_over_caption() {
        let payload = payload_from_parts(Some("caption"), Some("file-1".to_string()));
        assert!(matches!(payload, Some(Payload::Voice { file_id }) if file_id == "file-1"));
    }

    #[test]
    fn test_plain_text_payload() {
        let payload = payload_from_parts(Some("база сколько сообщений"), None);
        assert!(matches!(payload, Some(Payload::Text(t)) if t == "база сколько сообщений"));
    }

    #[test]
    fn test_command_payload() {
        let payload = payload_from_parts(Some("/start"), None);
        assert!(matches!(payload, Some(Payload::Command { name, .. }) if name == "start"));
    }

    #[tokio::test]
    async fn test_chunked_send_stops_at_first_failure() {
        let attempts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let text = "a".repeat(25);

        let result = send_in_chunks(&text, 10, |chunk| {
            let attempts = Arc::clone(&attempts);
            async move {
                let mut attempts = attempts.lock().unwrap();
                attempts.push(chunk);
                if attempts.len() == 2 {
                    anyhow::bail!("Bad Request: message is too long");
                }
                Ok::<(), anyhow::Error>(())
            }
        })
        .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("part 2 of 3"), "{}", err);
        assert_eq!(attempts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_chunked_send_delivers_every_part() {
        let attempts = Arc::new(std::sync::Mutex::new(Vec::new()));
        send_in_chunks(&"б".repeat(25), 10, |chunk| {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.lock().unwrap().push(chunk);
                Ok::<(), anyhow::Error>(())
            }
        })
        .await
        .unwrap();

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts.concat(), "б".repeat(25));
    }

    #[tokio::test]
    async fn test_download_error_does_not_leak_token() {
        let http = build_http_client(std::time::Duration::from_secs(5)).unwrap();
        // Nothing listens on port 1; the connection is refused.
        let url = "http://127.0.0.1:1/file/bot123456:SECRET-TOKEN/voice/file_0.oga";

        let err = fetch_file(&http, url).await.unwrap_err();
        let text = format!("{:#}", err);
        assert!(!text.contains("SECRET-TOKEN"), "{}", text);
        assert!(text.starts_with("Failed to download file from Telegram"));
    }

    #[test]
    fn test_unsupported_payload() {
        assert!(payload_from_parts(None, None).is_none());
        assert!(payload_from_parts(Some("   "), None).is_none());
    }
}
