//! Instruction text sent next to the uploaded video.
//!
//! `feedback` picks one of four tone presets unless `-prompt` overrides it;
//! `reverse` always uses a single fixed instruction.

use snafu::{OptionExt, Snafu};
use std::str::FromStr;
use strum::{AsRefStr, EnumString, VariantNames};

const NICE_PROMPT: &str = "You are a supportive senior motion designer and creative director mentoring a colleague. Be encouraging and constructive. Review storytelling, camera movement, visibility/legibility of key elements, timing, pacing, rhythm, transitions, typography, composition, color, and easing. Lead with what works, then frame issues as opportunities. Output format:\n1) Quick read (2-3 sentences)\n2) Strengths (4 bullets)\n3) Opportunities (4 bullets)\n4) Improvements (4 bullets, each with a concrete suggestion; include approximate timecodes if possible).";

const NORMAL_PROMPT: &str = "You are a senior motion designer and creative director. Give balanced, professional feedback. Review storytelling, camera movement, visibility/legibility of key elements, timing, and overall polish, plus pacing, rhythm, transitions, typography, composition, color, and easing. Weigh strengths and weaknesses evenly. Output format:\n1) Quick read (2-3 sentences)\n2) Strengths (3 bullets)\n3) Issues (4 bullets)\n4) Improvements (5 bullets, each with a concrete fix; include approximate timecodes if possible).";

const HARSH_PROMPT: &str = "You are a senior motion designer and creative director. Be direct and a bit harsh. Critique storytelling, camera movement, visibility/legibility of key elements, timing, and overall professional polish, plus pacing, rhythm, transitions, typography, composition, color, and easing. Call out what looks amateurish or generic. Provide more improvement ideas than praise. Output format:\n1) Quick read (2-3 sentences)\n2) Strengths (2 bullets max)\n3) Issues (6 bullets)\n4) Improvements (6 bullets, each with a concrete fix; include approximate timecodes if possible).";

const SUPER_HARSH_PROMPT: &str = "You are a demanding senior motion designer and creative director reviewing work for a top-tier studio. Be blunt and unsparing; assume the bar is award-winning work. Tear into storytelling, camera movement, visibility/legibility of key elements, timing, and professional polish, plus pacing, rhythm, transitions, typography, composition, color, and easing. Name every amateurish, generic, or lazy choice. No praise unless it is truly earned. Output format:\n1) Verdict (2 sentences)\n2) Strengths (1 bullet max, or 'None')\n3) Issues (8 bullets, worst first)\n4) Fixes (8 bullets, each a concrete change; include approximate timecodes if possible).";

/// Fixed instruction for `reverse`.
pub const REVERSE_PROMPT: &str = "You are reverse-engineering the prompt that likely produced this video. Infer subject, style, camera behavior, motion language, lighting, typography, color palette, aspect ratio, duration, and rendering style. Output only a single reconstructed prompt as one paragraph. No preamble, no bullets, no explanations.";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "unknown tone '{label}' (allowed: {})",
        Tone::VARIANTS.join(", ")
    ))]
    UnknownTone { label: String },
}

/// Which of the two user-facing operations is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CommandKind {
    Feedback,
    Reverse,
}

/// Feedback tone preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsRefStr, EnumString, VariantNames)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Tone {
    Nice,
    Normal,
    /// Matches the feedback text used before presets existed.
    #[default]
    Harsh,
    #[strum(to_string = "super-harsh", serialize = "superharsh")]
    SuperHarsh,
}

impl Tone {
    /// Parse a user supplied label, ignoring surrounding whitespace.
    pub fn parse(label: &str) -> Result<Self, Error> {
        Tone::from_str(label.trim())
            .ok()
            .context(UnknownToneSnafu { label })
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Tone::Nice => NICE_PROMPT,
            Tone::Normal => NORMAL_PROMPT,
            Tone::Harsh => HARSH_PROMPT,
            Tone::SuperHarsh => SUPER_HARSH_PROMPT,
        }
    }
}

/// Where the resolved instruction text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    /// `-prompt` was given.
    Override,
    /// A feedback tone preset, explicit or default.
    Preset(Tone),
    /// The fixed `reverse` instruction.
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub text: String,
    pub source: PromptSource,
    /// Tone label that was supplied but has no effect for this command.
    pub ignored_tone: Option<String>,
}

/// Pick the instruction text for `command`.
///
/// A non-blank `prompt` always wins and the tone is then never parsed. An empty
/// or whitespace-only prompt counts as absent.
pub fn resolve(
    command: CommandKind,
    prompt: Option<&str>,
    tone: Option<&str>,
) -> Result<ResolvedPrompt, Error> {
    let prompt = prompt.filter(|p| !p.trim().is_empty());
    let tone = tone.filter(|t| !t.trim().is_empty());

    let resolved = match (command, prompt) {
        (CommandKind::Feedback, Some(text)) => ResolvedPrompt {
            text: text.to_string(),
            source: PromptSource::Override,
            ignored_tone: None,
        },
        (CommandKind::Feedback, None) => {
            let tone = tone.map(Tone::parse).transpose()?.unwrap_or_default();
            ResolvedPrompt {
                text: tone.instruction().to_string(),
                source: PromptSource::Preset(tone),
                ignored_tone: None,
            }
        }
        (CommandKind::Reverse, prompt) => ResolvedPrompt {
            text: prompt.unwrap_or(REVERSE_PROMPT).to_string(),
            source: if prompt.is_some() {
                PromptSource::Override
            } else {
                PromptSource::Reverse
            },
            ignored_tone: tone.map(str::to_string),
        },
    };
    Ok(resolved)
}
