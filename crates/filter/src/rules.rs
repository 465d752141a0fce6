//! The rules, one type per heuristic.
//!
//! Each rule is a predicate over the normalized message, the event and the
//! state store. Rules carry their own thresholds, copied from
//! [`FilterConfig`] when the chain is built.
//!
//! Content rules never touch the store. The redundancy rules follow a strict
//! observe/record order:
//! - [`ExactRepeat`] appends the current message to the sender history
//!   *before* counting, so a message counts toward its own threshold.
//! - [`SimilarCopyPaste`] appends to the duplicate window only when neither
//!   copy-paste rule fired.
//! - [`EmoteTrain`] appends its signature only when it did not fire.

use std::collections::HashSet;
use std::time::Duration;

use chatsieve_config::FilterConfig;
use chatsieve_core::{ChatEvent, RuleTag, Verdict};
use chrono::{DateTime, Utc};

use crate::normalize::NormalizedMessage;
use crate::similarity::similarity;
use crate::store::{EmoteSignatureEntry, GlobalDuplicateEntry, StateStore, UserHistoryEntry};

/// Messages with fewer letters are never all-caps.
pub const ALL_CAPS_MIN_LETTERS: usize = 3;

/// Texts shorter than this are never checked for character runs.
pub const CHAR_REPETITION_MIN_LENGTH: usize = 3;

/// Emote density is only meaningful with at least this many tokens.
pub const DENSITY_MIN_TOKENS: usize = 3;

/// Cleaned repeat text shorter than this is not recorded in sender history.
pub const HISTORY_MIN_LENGTH: usize = 3;

/// Everything a rule may look at for one event.
pub struct RuleContext<'a> {
    pub event: &'a ChatEvent,
    pub message: &'a NormalizedMessage,
    pub store: &'a mut StateStore,
    /// Reference time for every window.
    pub now: DateTime<Utc>,
}

impl RuleContext<'_> {
    fn sender(&self) -> &str {
        &self.event.sender_id
    }

    fn repeat_len(&self) -> usize {
        self.message.cleaned_for_repeat.chars().count()
    }
}

/// A single heuristic in the chain.
pub trait Rule: Send + Sync {
    fn tag(&self) -> RuleTag;

    /// Return a verdict when the rule fires.
    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict>;
}

/// Length of the longest run of equal consecutive items; 0 when empty.
pub fn longest_run<T, I>(items: I) -> usize
where
    T: PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut best = 0;
    let mut current = 0;
    let mut previous: Option<T> = None;
    for item in items {
        current = match &previous {
            Some(p) if *p == item => current + 1,
            _ => 1,
        };
        best = best.max(current);
        previous = Some(item);
    }
    best
}

/// Longest run of one identical character, whitespace included.
pub fn longest_char_run(text: &str) -> usize {
    longest_run(text.chars())
}

/// Ratio as whole percent, for verdict reporting.
pub fn percent(ratio: f64) -> u64 {
    (ratio * 100.0).round() as u64
}

/// Code points typical of text art: Braille, box drawing, blocks, combining
/// marks and mathematical symbol blocks.
pub fn is_art_char(c: char) -> bool {
    matches!(
        c as u32,
        0x0300..=0x036F           // combining diacritical marks
            | 0x1AB0..=0x1AFF     // combining diacritical marks extended
            | 0x1DC0..=0x1DFF     // combining diacritical marks supplement
            | 0x20D0..=0x20FF     // combining marks for symbols
            | 0xFE20..=0xFE2F     // combining half marks
            | 0x2200..=0x22FF     // mathematical operators
            | 0x27C0..=0x27EF     // misc mathematical symbols-A
            | 0x2980..=0x29FF     // misc mathematical symbols-B
            | 0x2A00..=0x2AFF     // supplemental mathematical operators
            | 0x2500..=0x257F     // box drawing
            | 0x2580..=0x259F     // block elements
            | 0x25A0..=0x25FF     // geometric shapes
            | 0x2800..=0x28FF     // braille patterns
            | 0x1D400..=0x1D7FF // mathematical alphanumeric symbols
    )
}

// ── Content rules ──────────────────────────────────────────────────

pub struct EmoteCount {
    pub max_emotes: usize,
}

impl Rule for EmoteCount {
    fn tag(&self) -> RuleTag {
        RuleTag::EmoteCount
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let count = ctx.message.emote_count;
        (count > self.max_emotes)
            .then(|| Verdict::new(self.tag(), self.max_emotes as u64, count as u64))
    }
}

pub struct EmoteDensity {
    pub threshold: f64,
}

impl Rule for EmoteDensity {
    fn tag(&self) -> RuleTag {
        RuleTag::EmoteDensity
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let total = ctx.message.word_count + ctx.message.emote_count;
        if total < DENSITY_MIN_TOKENS {
            return None;
        }
        let density = ctx.message.emote_count as f64 / total as f64;
        (density > self.threshold)
            .then(|| Verdict::new(self.tag(), percent(self.threshold), percent(density)))
    }
}

pub struct SameEmoteRun {
    pub max_run: usize,
}

impl Rule for SameEmoteRun {
    fn tag(&self) -> RuleTag {
        RuleTag::SameEmoteRun
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let run = longest_run(ctx.message.emote_tokens.iter());
        (run > self.max_run).then(|| Verdict::new(self.tag(), self.max_run as u64, run as u64))
    }
}

pub struct AllCaps;

impl Rule for AllCaps {
    fn tag(&self) -> RuleTag {
        RuleTag::AllCaps
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let letters: String = ctx.event.raw_text.chars().filter(|c| c.is_alphabetic()).collect();
        let count = letters.chars().count();
        if count < ALL_CAPS_MIN_LETTERS {
            return None;
        }
        // Uncased scripts equal their own uppercase form too; require case.
        let shouting = letters == letters.to_uppercase() && letters != letters.to_lowercase();
        shouting.then(|| Verdict::new(self.tag(), ALL_CAPS_MIN_LETTERS as u64, count as u64))
    }
}

pub struct CharRepetition {
    pub max_repetition: usize,
}

impl Rule for CharRepetition {
    fn tag(&self) -> RuleTag {
        RuleTag::CharRepetition
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let text = &ctx.event.raw_text;
        if text.chars().count() < CHAR_REPETITION_MIN_LENGTH {
            return None;
        }
        let run = longest_char_run(text);
        (run > self.max_repetition)
            .then(|| Verdict::new(self.tag(), self.max_repetition as u64, run as u64))
    }
}

pub struct AsciiArt {
    pub min_length: usize,
    pub min_lines: usize,
    pub min_ratio: f64,
    pub min_ratio_multiline: f64,
}

impl Rule for AsciiArt {
    fn tag(&self) -> RuleTag {
        RuleTag::AsciiArt
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let raw = &ctx.event.raw_text;
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let length = collapsed.chars().count();
        if length < self.min_length {
            return None;
        }

        let art = collapsed.chars().filter(|c| is_art_char(*c)).count();
        let ratio = art as f64 / length as f64;
        let lines = raw.matches('\n').count() + 1;
        let threshold = if lines >= self.min_lines {
            self.min_ratio_multiline
        } else {
            self.min_ratio
        };

        (ratio >= threshold).then(|| Verdict::new(self.tag(), percent(threshold), percent(ratio)))
    }
}

// ── Per-sender redundancy ──────────────────────────────────────────

pub struct ExactRepeat {
    pub window: Duration,
    pub min_length: usize,
    pub threshold: usize,
}

impl Rule for ExactRepeat {
    fn tag(&self) -> RuleTag {
        RuleTag::ExactRepeat
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let cleaned = &ctx.message.cleaned_for_repeat;
        let length = ctx.repeat_len();

        // Record first: the current message counts toward its own total.
        if length >= HISTORY_MIN_LENGTH {
            ctx.store.record_user_message(
                &ctx.event.sender_id,
                UserHistoryEntry {
                    cleaned: cleaned.clone(),
                    raw: ctx.event.raw_text.clone(),
                    timestamp: ctx.now,
                },
            );
        }

        let count = ctx
            .store
            .recent_user_history(&ctx.event.sender_id, ctx.now, self.window)
            .iter()
            .filter(|entry| entry.cleaned == *cleaned)
            .count();

        (length >= self.min_length && count >= self.threshold)
            .then(|| Verdict::new(self.tag(), self.threshold as u64, count as u64))
    }
}

pub struct SimilarRepeat {
    pub window: Duration,
    pub min_length: usize,
    pub threshold: usize,
    pub min_similarity: f64,
}

impl Rule for SimilarRepeat {
    fn tag(&self) -> RuleTag {
        RuleTag::SimilarRepeat
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        if ctx.repeat_len() < self.min_length {
            return None;
        }
        let cleaned = &ctx.message.cleaned_for_repeat;
        let raw = &ctx.event.raw_text;
        let now = ctx.now;

        let history = ctx
            .store
            .recent_user_history(&ctx.event.sender_id, now, self.window);

        // The newest entry is the current message when ExactRepeat recorded it.
        let current = history.len().checked_sub(1).filter(|&i| {
            let e = &history[i];
            e.timestamp == now && e.raw == *raw && e.cleaned == *cleaned
        });

        let mut count = 0;
        let mut best: Option<(f64, &UserHistoryEntry)> = None;
        for (i, entry) in history.iter().enumerate() {
            let score = similarity(&entry.cleaned, cleaned);
            if score < self.min_similarity {
                continue;
            }
            count += 1;
            if Some(i) != current && best.is_none_or(|(b, _)| score > b) {
                best = Some((score, entry));
            }
        }

        if count < self.threshold {
            return None;
        }
        let verdict = Verdict::new(self.tag(), self.threshold as u64, count as u64);
        Some(match best {
            Some((_, entry)) => {
                verdict.with_evidence(ctx.event.sender_id.clone(), entry.raw.clone())
            }
            None => verdict,
        })
    }
}

// ── Cross-sender redundancy ────────────────────────────────────────

pub struct CopyPaste {
    pub window: Duration,
    pub min_length: usize,
}

impl Rule for CopyPaste {
    fn tag(&self) -> RuleTag {
        RuleTag::CopyPaste
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let eligible = ctx.repeat_len() >= self.min_length;
        let sender = ctx.event.sender_id.as_str();
        let cleaned = &ctx.message.cleaned_for_repeat;

        let duplicates = ctx.store.recent_duplicates(ctx.now, self.window);
        if !eligible {
            return None;
        }

        duplicates
            .iter()
            .find(|d| d.sender_id != sender && d.cleaned == *cleaned)
            .map(|d| {
                Verdict::new(self.tag(), 100, 100).with_evidence(d.sender_id.clone(), d.raw.clone())
            })
    }
}

pub struct SimilarCopyPaste {
    pub window: Duration,
    pub min_length: usize,
    pub min_similarity: f64,
}

impl Rule for SimilarCopyPaste {
    fn tag(&self) -> RuleTag {
        RuleTag::SimilarCopyPaste
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let eligible = ctx.repeat_len() >= self.min_length;
        let sender = ctx.sender().to_string();
        let cleaned = &ctx.message.cleaned_for_repeat;

        let duplicates = ctx.store.recent_duplicates(ctx.now, self.window);
        if !eligible {
            return None;
        }

        let best = duplicates
            .iter()
            .filter(|d| d.sender_id != sender)
            .map(|d| (similarity(&d.cleaned, cleaned), d))
            .fold(None, |best: Option<(f64, &GlobalDuplicateEntry)>, (score, d)| match best {
                Some((b, _)) if b >= score => best,
                _ => Some((score, d)),
            });

        if let Some((score, d)) = best {
            if score >= self.min_similarity {
                return Some(
                    Verdict::new(self.tag(), percent(self.min_similarity), percent(score))
                        .with_evidence(d.sender_id.clone(), d.raw.clone()),
                );
            }
        }

        // Neither copy-paste rule fired: remember this message.
        ctx.store.record_duplicate(GlobalDuplicateEntry {
            sender_id: sender,
            cleaned: cleaned.clone(),
            raw: ctx.event.raw_text.clone(),
            timestamp: ctx.now,
        });
        None
    }
}

pub struct EmoteTrain {
    pub window: Duration,
    pub threshold: usize,
}

impl Rule for EmoteTrain {
    fn tag(&self) -> RuleTag {
        RuleTag::EmoteTrain
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Option<Verdict> {
        let signature = &ctx.message.emote_signature;
        let sender = ctx.event.sender_id.as_str();

        let entries = ctx.store.recent_signatures(ctx.now, self.window);
        if ctx.message.emote_tokens.is_empty() || signature.is_empty() {
            return None;
        }

        let mut senders: HashSet<&str> = entries
            .iter()
            .filter(|e| e.signature == *signature)
            .map(|e| e.sender_id.as_str())
            .collect();
        senders.insert(sender);
        let count = senders.len();

        if count >= self.threshold {
            return Some(Verdict::new(self.tag(), self.threshold as u64, count as u64));
        }

        ctx.store.record_signature(EmoteSignatureEntry {
            sender_id: sender.to_string(),
            signature: signature.clone(),
            timestamp: ctx.now,
        });
        None
    }
}

/// Build the chain in evaluation order. Rules switched off in `config` are
/// left out.
pub fn build_chain(config: &FilterConfig) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![
        Box::new(EmoteCount {
            max_emotes: config.max_emotes,
        }),
        Box::new(EmoteDensity {
            threshold: config.emote_density_threshold,
        }),
        Box::new(SameEmoteRun {
            max_run: config.max_same_emote_run,
        }),
    ];

    if config.block_all_caps {
        rules.push(Box::new(AllCaps));
    }
    if config.block_char_repetition {
        rules.push(Box::new(CharRepetition {
            max_repetition: config.max_char_repetition,
        }));
    }
    if config.block_ascii_art {
        rules.push(Box::new(AsciiArt {
            min_length: config.art_min_length,
            min_lines: config.art_min_lines,
            min_ratio: config.art_min_ratio,
            min_ratio_multiline: config.art_min_ratio_multiline,
        }));
    }

    rules.push(Box::new(ExactRepeat {
        window: config.per_user_window(),
        min_length: config.text_min_length,
        threshold: config.exact_repeat_threshold,
    }));
    rules.push(Box::new(SimilarRepeat {
        window: config.per_user_window(),
        min_length: config.text_min_length,
        threshold: config.similar_repeat_threshold,
        min_similarity: config.similarity_threshold,
    }));
    rules.push(Box::new(CopyPaste {
        window: config.copy_paste_window(),
        min_length: config.copy_paste_min_length,
    }));
    rules.push(Box::new(SimilarCopyPaste {
        window: config.copy_paste_window(),
        min_length: config.copy_paste_min_length,
        min_similarity: config.similarity_threshold,
    }));
    rules.push(Box::new(EmoteTrain {
        window: config.train_window(),
        threshold: config.train_threshold,
    }));

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use chrono::TimeDelta;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Run a single rule against an event.
    fn run(rule: &dyn Rule, store: &mut StateStore, event: &ChatEvent) -> Option<Verdict> {
        let message = normalize(event).unwrap().unwrap();
        let mut ctx = RuleContext {
            event,
            message: &message,
            store,
            now: event.timestamp,
        };
        rule.evaluate(&mut ctx)
    }

    fn msg(sender: &str, text: &str, secs: i64) -> ChatEvent {
        ChatEvent::new(sender, text).at(t0() + TimeDelta::seconds(secs))
    }

    #[test]
    fn longest_run_bounds() {
        assert_eq!(longest_run(Vec::<u8>::new()), 0);
        assert_eq!(longest_run([1, 2, 3, 4, 5]), 1);
        assert_eq!(longest_run([7; 9]), 9);
        assert_eq!(longest_run(["a", "a", "b", "a", "a", "a"]), 3);
    }

    #[test]
    fn longest_char_run_counts_every_character() {
        assert_eq!(longest_char_run("nooooo way"), 5);
        assert_eq!(longest_char_run("a      b"), 6);
        assert_eq!(longest_char_run(""), 0);
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(percent(0.6), 60);
        assert_eq!(percent(2.0 / 3.0), 67);
        assert_eq!(percent(0.854), 85);
    }

    #[test]
    fn emote_count_boundary() {
        let rule = EmoteCount { max_emotes: 6 };
        let mut store = StateStore::new();
        let six = msg("u", "", 0).with_emotes(["A", "B", "C", "D", "E", "F"]);
        assert!(run(&rule, &mut store, &six).is_none());

        let seven = msg("u", "", 0).with_emotes(["A", "B", "C", "D", "E", "F", "G"]);
        let verdict = run(&rule, &mut store, &seven).unwrap();
        assert_eq!((verdict.limit, verdict.reached), (6, 7));
    }

    #[test]
    fn emote_density_needs_three_tokens() {
        let rule = EmoteDensity { threshold: 0.6 };
        let mut store = StateStore::new();
        // Two tokens only: not evaluated even though it is all emotes.
        assert!(run(&rule, &mut store, &msg("u", "", 0).with_emotes(["A", "B"])).is_none());

        let verdict = run(&rule, &mut store, &msg("u", "lol", 0).with_emotes(["A", "B", "C"]))
            .unwrap();
        assert_eq!((verdict.limit, verdict.reached), (60, 75));
    }

    #[test]
    fn emote_density_at_threshold_does_not_fire() {
        let rule = EmoteDensity { threshold: 0.6 };
        let mut store = StateStore::new();
        let event = msg("u", "so good", 0).with_emotes(["A", "B", "C"]);
        assert!(run(&rule, &mut store, &event).is_none());
    }

    #[test]
    fn same_emote_run_resets_on_change() {
        let rule = SameEmoteRun { max_run: 3 };
        let mut store = StateStore::new();
        let broken = msg("u", "hey", 0).with_emotes(["A", "A", "A", "B", "A", "A", "A"]);
        assert!(run(&rule, &mut store, &broken).is_none());

        let long = msg("u", "hey", 0).with_emotes(["B", "A", "A", "A", "A"]);
        let verdict = run(&rule, &mut store, &long).unwrap();
        assert_eq!(verdict.reached, 4);
    }

    #[test]
    fn all_caps() {
        let mut store = StateStore::new();
        let verdict = run(&AllCaps, &mut store, &msg("u", "HELLO WORLD", 0)).unwrap();
        assert_eq!(verdict.reached, 10);
        assert!(run(&AllCaps, &mut store, &msg("u", "Hello World", 0)).is_none());
        assert!(run(&AllCaps, &mut store, &msg("u", "OK!", 0)).is_none());
        assert!(run(&AllCaps, &mut store, &msg("u", "你好世界", 0)).is_none());
    }

    #[test]
    fn char_repetition() {
        let rule = CharRepetition { max_repetition: 4 };
        let mut store = StateStore::new();
        assert!(run(&rule, &mut store, &msg("u", "hmmmm", 0)).is_none());
        let verdict = run(&rule, &mut store, &msg("u", "hmmmmm ok", 0)).unwrap();
        assert_eq!((verdict.limit, verdict.reached), (4, 5));
    }

    #[test]
    fn char_repetition_counts_space_runs() {
        let rule = CharRepetition { max_repetition: 4 };
        let mut store = StateStore::new();
        assert!(run(&rule, &mut store, &msg("u", "hello    world", 0)).is_none());
        let verdict = run(&rule, &mut store, &msg("u", "hello      world", 0)).unwrap();
        assert_eq!((verdict.limit, verdict.reached), (4, 6));
    }

    #[test]
    fn ascii_art_single_and_multiline() {
        let rule = AsciiArt {
            min_length: 20,
            min_lines: 2,
            min_ratio: 0.35,
            min_ratio_multiline: 0.2,
        };
        let mut store = StateStore::new();

        // 10 braille + 20 letters = 33%: below the single-line threshold.
        let single = format!("{} {}", "⣿".repeat(10), "a".repeat(20));
        assert!(run(&rule, &mut store, &msg("u", &single, 0)).is_none());

        // Same content on two lines uses the lower threshold.
        let multi = format!("{}\n{}", "⣿".repeat(10), "a".repeat(20));
        let verdict = run(&rule, &mut store, &msg("u", &multi, 0)).unwrap();
        assert_eq!((verdict.limit, verdict.reached), (20, 32));

        // Too short to judge.
        assert!(run(&rule, &mut store, &msg("u", "⣿⣿⣿⣿⣿", 0)).is_none());
    }

    #[test]
    fn exact_repeat_counts_itself() {
        let rule = ExactRepeat {
            window: Duration::from_secs(60),
            min_length: 6,
            threshold: 1,
        };
        let mut store = StateStore::new();
        // With a threshold of 1 the very first message already fires: the
        // message is recorded before the count is taken.
        let verdict = run(&rule, &mut store, &msg("u", "hello there friend", 0)).unwrap();
        assert_eq!(verdict.reached, 1);
    }

    #[test]
    fn exact_repeat_ignores_short_text_but_records_it() {
        let rule = ExactRepeat {
            window: Duration::from_secs(60),
            min_length: 6,
            threshold: 1,
        };
        let mut store = StateStore::new();
        assert!(run(&rule, &mut store, &msg("u", "lol", 0)).is_none());
        assert_eq!(store.history_len("u"), 1);

        assert!(run(&rule, &mut store, &msg("u", "ok", 1)).is_none());
        assert_eq!(store.history_len("u"), 1);
    }

    #[test]
    fn similar_repeat_reports_best_prior_entry() {
        let exact = ExactRepeat {
            window: Duration::from_secs(60),
            min_length: 6,
            threshold: 3,
        };
        let similar = SimilarRepeat {
            window: Duration::from_secs(60),
            min_length: 6,
            threshold: 3,
            min_similarity: 0.85,
        };
        let mut store = StateStore::new();
        let texts = [
            "follow my channel for free stuff",
            "follow my channel for free stuf",
            "follow my channel for free stuff!!",
        ];
        let mut last = None;
        for (i, text) in texts.iter().enumerate() {
            let event = msg("spammer", text, i as i64);
            // Only two of the three clean to the same text.
            assert!(run(&exact, &mut store, &event).is_none());
            last = run(&similar, &mut store, &event);
        }
        let verdict = last.unwrap();
        assert_eq!(verdict.reached, 3);
        let evidence = verdict.evidence.unwrap();
        assert_eq!(evidence.trigger_sender_id, "spammer");
        assert_eq!(evidence.trigger_raw_text, "follow my channel for free stuff");
    }

    #[test]
    fn copy_paste_ignores_own_messages() {
        let rule = CopyPaste {
            window: Duration::from_secs(8),
            min_length: 6,
        };
        let mut store = StateStore::new();
        store.record_duplicate(GlobalDuplicateEntry {
            sender_id: "u".into(),
            cleaned: "hello there friend".into(),
            raw: "hello there friend".into(),
            timestamp: t0(),
        });
        assert!(run(&rule, &mut store, &msg("u", "Hello there, friend!", 1)).is_none());

        let verdict = run(&rule, &mut store, &msg("v", "Hello there, friend!", 1)).unwrap();
        assert_eq!(verdict.evidence.unwrap().trigger_sender_id, "u");
    }

    #[test]
    fn similar_copy_paste_records_only_when_clean() {
        let rule = SimilarCopyPaste {
            window: Duration::from_secs(8),
            min_length: 6,
            min_similarity: 0.85,
        };
        let mut store = StateStore::new();
        let first = msg("a", "free followers at example dot com", 0);
        assert!(run(&rule, &mut store, &first).is_none());
        assert_eq!(store.duplicate_count(), 1);

        let verdict =
            run(&rule, &mut store, &msg("b", "free followers at example dot comm", 1)).unwrap();
        assert_eq!(verdict.limit, 85);
        assert!(verdict.reached >= 85);
        assert_eq!(verdict.evidence.unwrap().trigger_sender_id, "a");
        // The flagged message was not recorded.
        assert_eq!(store.duplicate_count(), 1);
    }

    #[test]
    fn short_text_skips_copy_paste_window() {
        let rule = SimilarCopyPaste {
            window: Duration::from_secs(8),
            min_length: 6,
            min_similarity: 0.85,
        };
        let mut store = StateStore::new();
        assert!(run(&rule, &mut store, &msg("a", "gg wp", 0)).is_none());
        assert_eq!(store.duplicate_count(), 0);
    }

    #[test]
    fn emote_train_counts_distinct_senders() {
        let rule = EmoteTrain {
            window: Duration::from_secs(10),
            threshold: 3,
        };
        let mut store = StateStore::new();
        let combo = ["A", "A", "B"];

        assert!(run(&rule, &mut store, &msg("a", "", 0).with_emotes(combo)).is_none());
        // Same sender again does not add a second voice.
        assert!(run(&rule, &mut store, &msg("a", "", 1).with_emotes(combo)).is_none());
        assert!(run(&rule, &mut store, &msg("b", "", 2).with_emotes(combo)).is_none());

        let verdict = run(&rule, &mut store, &msg("c", "", 3).with_emotes(combo)).unwrap();
        assert_eq!(verdict.reached, 3);
    }

    #[test]
    fn emote_train_window_expires() {
        let rule = EmoteTrain {
            window: Duration::from_secs(10),
            threshold: 2,
        };
        let mut store = StateStore::new();
        assert!(run(&rule, &mut store, &msg("a", "", 0).with_emotes(["X"])).is_none());
        assert!(run(&rule, &mut store, &msg("b", "", 10).with_emotes(["X"])).is_none());
        assert!(run(&rule, &mut store, &msg("c", "", 11).with_emotes(["X"])).is_some());
    }

    #[test]
    fn chain_respects_toggles() {
        let all = build_chain(&FilterConfig::default());
        let tags: Vec<RuleTag> = all.iter().map(|r| r.tag()).collect();
        assert_eq!(tags, RuleTag::ALL.to_vec());

        let config = FilterConfig {
            block_all_caps: false,
            block_char_repetition: false,
            block_ascii_art: false,
            ..FilterConfig::default()
        };
        let tags: Vec<RuleTag> = build_chain(&config).iter().map(|r| r.tag()).collect();
        assert!(!tags.contains(&RuleTag::AllCaps));
        assert!(!tags.contains(&RuleTag::CharRepetition));
        assert!(!tags.contains(&RuleTag::AsciiArt));
        assert_eq!(tags.len(), 8);
    }
}
