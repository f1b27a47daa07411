use crate::utils::plural_ru;

/// Byte offset of the `n`-th character, or the string length if shorter.
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// Split plain text into chunks of at most `max_chars` characters, preferring
/// paragraph and line boundaries.
pub(crate) fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.chars().count() <= max_chars {
            chunks.push(remaining.to_string());
            break;
        }

        let boundary = byte_offset_of_char(remaining, max_chars);
        let search_region = &remaining[..boundary];

        // Paragraph boundary first, then line boundary, then hard cut.
        let split_at = search_region
            .rfind("\n\n")
            .map(|p| p + 1)
            .or_else(|| search_region.rfind('\n'))
            .unwrap_or(boundary);

        // max_chars == 0 or a leading newline: always make progress.
        let split_at = if split_at == 0 {
            byte_offset_of_char(remaining, 1)
        } else {
            split_at
        };

        let (chunk, rest) = remaining.split_at(split_at);
        let chunk = chunk.trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = rest.trim_start_matches('\n');
    }

    chunks
}

/// Cut a caption to `max_chars` characters, marking the cut with an ellipsis.
pub(crate) fn truncate_caption(caption: &str, max_chars: usize) -> String {
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = caption.chars().take(keep).collect();
    out.push('…');
    out
}

pub(crate) fn build_start_text() -> String {
    "🎙️ Привет! Я голосовой бот с ChatGPT и ElevenLabs!\n\n\
     ✨ Что я умею:\n\
     🎤 Голос → GPT → Голос\n\
     📝 Текст → GPT → Голос\n\
     🔊 /voice [текст] → Голос\n\n\
     Команды:\n\
     /voice [текст] - просто озвучить текст\n\
     /help - помощь\n\n\
     💡 Попробуйте задать любой вопрос!\n\n\
     Пишите или говорите - я отвечу голосом! 🤖🔊"
        .to_string()
}

pub(crate) fn build_help_text(model: &str, daily_limit: u32) -> String {
    format!(
        "🎙️ Как я работаю:\n\n\
         1️⃣ 🎤 ГОЛОСОВОЕ сообщение:\n\
         \u{20}  → ElevenLabs STT → ChatGPT → ElevenLabs TTS\n\n\
         2️⃣ 📝 ТЕКСТ:\n\
         \u{20}  → ChatGPT → ElevenLabs TTS\n\n\
         3️⃣ 🔊 /voice [текст]:\n\
         \u{20}  → Просто озвучивает текст\n\n\
         Ключевые слова:\n\
         💾 «база …» - вопрос по истории сообщений и мыслей\n\
         💭 «мысль …» - сохранить мысль (только для владельца)\n\n\
         Технологии:\n\
         🤖 ChatGPT ({})\n\
         🎤 ElevenLabs STT (scribe_v2)\n\
         🔊 ElevenLabs TTS (multilingual_v2)\n\n\
         ⏳ Лимит: {} в день",
        model,
        requests_phrase(daily_limit)
    )
}

fn requests_phrase(n: u32) -> String {
    format!("{} {}", n, plural_ru(n, "запрос", "запроса", "запросов"))
}
