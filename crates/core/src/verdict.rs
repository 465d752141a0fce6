//! Verdicts — what the classifier says about one event.

use serde::{Deserialize, Serialize};

/// Which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTag {
    EmoteCount,
    EmoteDensity,
    SameEmoteRun,
    AllCaps,
    CharRepetition,
    AsciiArt,
    ExactRepeat,
    SimilarRepeat,
    CopyPaste,
    SimilarCopyPaste,
    EmoteTrain,
}

impl RuleTag {
    /// Every tag in evaluation order.
    pub const ALL: [RuleTag; 11] = [
        RuleTag::EmoteCount,
        RuleTag::EmoteDensity,
        RuleTag::SameEmoteRun,
        RuleTag::AllCaps,
        RuleTag::CharRepetition,
        RuleTag::AsciiArt,
        RuleTag::ExactRepeat,
        RuleTag::SimilarRepeat,
        RuleTag::CopyPaste,
        RuleTag::SimilarCopyPaste,
        RuleTag::EmoteTrain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleTag::EmoteCount => "emote_count",
            RuleTag::EmoteDensity => "emote_density",
            RuleTag::SameEmoteRun => "same_emote_run",
            RuleTag::AllCaps => "all_caps",
            RuleTag::CharRepetition => "char_repetition",
            RuleTag::AsciiArt => "ascii_art",
            RuleTag::ExactRepeat => "exact_repeat",
            RuleTag::SimilarRepeat => "similar_repeat",
            RuleTag::CopyPaste => "copy_paste",
            RuleTag::SimilarCopyPaste => "similar_copy_paste",
            RuleTag::EmoteTrain => "emote_train",
        }
    }
}

impl std::fmt::Display for RuleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The earlier message that made a redundancy rule fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub trigger_sender_id: String,
    pub trigger_raw_text: String,
}

/// A positive classification.
///
/// `limit` and `reached` are the exact quantities the rule compared. Ratios
/// are expressed in whole percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub rule: RuleTag,
    pub limit: u64,
    pub reached: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl Verdict {
    pub fn new(rule: RuleTag, limit: u64, reached: u64) -> Self {
        Self {
            rule,
            limit,
            reached,
            evidence: None,
        }
    }

    pub fn with_evidence(
        mut self,
        sender_id: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        self.evidence = Some(Evidence {
            trigger_sender_id: sender_id.into(),
            trigger_raw_text: raw_text.into(),
        });
        self
    }

    /// Human-readable explanation with the literal limit/reached values.
    pub fn description(&self) -> String {
        let (limit, reached) = (self.limit, self.reached);
        match self.rule {
            RuleTag::EmoteCount => format!("too many emotes: {reached} (limit {limit})"),
            RuleTag::EmoteDensity => {
                format!("emotes make up {reached}% of the message (limit {limit}%)")
            }
            RuleTag::SameEmoteRun => {
                format!("same emote {reached} times in a row (limit {limit})")
            }
            RuleTag::AllCaps => format!("all caps: {reached} uppercase letters (minimum {limit})"),
            RuleTag::CharRepetition => {
                format!("character repeated {reached} times in a row (limit {limit})")
            }
            RuleTag::AsciiArt => {
                format!("art characters make up {reached}% of the message (threshold {limit}%)")
            }
            RuleTag::ExactRepeat => {
                format!("same message sent {reached} times (threshold {limit})")
            }
            RuleTag::SimilarRepeat => {
                format!("similar message sent {reached} times (threshold {limit})")
            }
            RuleTag::CopyPaste => {
                format!("copy of another user's message ({reached}% match, threshold {limit}%)")
            }
            RuleTag::SimilarCopyPaste => format!(
                "near copy of another user's message ({reached}% match, threshold {limit}%)"
            ),
            RuleTag::EmoteTrain => {
                format!("emote combo posted by {reached} users (threshold {limit})")
            }
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.description())
    }
}

/// Why an event was not classified at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Replies are ignored by configuration
    Reply,
    /// Privileged sender
    Exempt,
    /// No text and no emotes
    Empty,
}

/// Outcome of running one event through the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Skipped(SkipReason),
    Clean,
    Flagged(Verdict),
}

impl Classification {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Classification::Flagged(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Classification::Skipped(_))
    }
}
