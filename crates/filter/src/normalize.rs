//! Message normalization.
//!
//! Produces the comparable forms every rule works on. Pure: the same event
//! always yields the same [`NormalizedMessage`].

use chatsieve_core::{ChatEvent, FilterError};
use unicode_normalization::UnicodeNormalization;

/// Emote tokens that contribute to a signature.
pub const SIGNATURE_MAX_EMOTES: usize = 12;

/// Joins emote codes in a signature. Never part of an emote code.
pub const SIGNATURE_SEPARATOR: &str = "|";

/// Shorter tokens are dropped from the repeat form.
pub const REPEAT_MIN_TOKEN_LEN: usize = 3;

/// Derived view of a [`ChatEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// Lowercased letters, digits and single spaces; used for fuzzy matching.
    pub cleaned_for_similarity: String,
    /// `cleaned_for_similarity` without tokens shorter than three characters;
    /// used for exact and near duplicate detection.
    pub cleaned_for_repeat: String,
    pub word_count: usize,
    pub emote_count: usize,
    /// Trimmed, non-blank emote codes in message order.
    pub emote_tokens: Vec<String>,
    pub emote_signature: String,
}

/// Normalize an event.
///
/// Returns `Ok(None)` when the event carries neither text nor emotes: such an
/// event is not a candidate and must not touch any state.
pub fn normalize(event: &ChatEvent) -> Result<Option<NormalizedMessage>, FilterError> {
    if event.sender_id.trim().is_empty() {
        return Err(FilterError::MalformedEvent("blank sender id".into()));
    }

    let emote_tokens: Vec<String> = event
        .emote_tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    if event.raw_text.trim().is_empty() && emote_tokens.is_empty() {
        return Ok(None);
    }

    let cleaned_for_similarity = clean_for_similarity(&event.raw_text);
    let cleaned_for_repeat = drop_short_tokens(&cleaned_for_similarity);
    let word_count = cleaned_for_similarity.split_whitespace().count();

    Ok(Some(NormalizedMessage {
        word_count,
        emote_count: emote_tokens.len(),
        emote_signature: emote_signature(&emote_tokens),
        emote_tokens,
        cleaned_for_similarity,
        cleaned_for_repeat,
    }))
}

/// NFKC-normalize, keep only letters, digits and whitespace, drop pictographs,
/// collapse whitespace, lowercase.
pub fn clean_for_similarity(raw: &str) -> String {
    let kept: String = raw
        .nfkc()
        .filter(|c| (c.is_alphanumeric() || c.is_whitespace()) && !is_pictograph(*c))
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Repeat form of raw text: the similarity form minus short tokens.
pub fn clean_for_repeat(raw: &str) -> String {
    drop_short_tokens(&clean_for_similarity(raw))
}

fn drop_short_tokens(cleaned: &str) -> String {
    cleaned
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() >= REPEAT_MIN_TOKEN_LEN)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Order-sensitive signature of the first twelve emote codes.
pub fn emote_signature<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .take(SIGNATURE_MAX_EMOTES)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(SIGNATURE_SEPARATOR)
}

/// Emoji, pictograph and decorative symbol blocks.
fn is_pictograph(c: char) -> bool {
    matches!(
        c as u32,
        0x200D                      // zero width joiner
            | 0x20E3                // combining enclosing keycap
            | 0x2190..=0x21FF       // arrows
            | 0x2300..=0x23FF       // misc technical
            | 0x2460..=0x24FF       // enclosed alphanumerics
            | 0x2600..=0x27BF       // misc symbols, dingbats
            | 0x2B00..=0x2BFF       // misc symbols and arrows
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0xFE00..=0xFE0F       // variation selectors
            | 0x1F000..=0x1FAFF     // mahjong .. symbols and pictographs ext-A
            | 0xE0000..=0xE007F // tags
    )
}
