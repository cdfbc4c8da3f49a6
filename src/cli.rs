//! Command-line surface.
//!
//! Flags are accepted both Go style (`-video demo.mp4`, `-video=demo.mp4`) and
//! GNU style (`--video demo.mp4`); [`normalize_args`] rewrites the former into
//! the latter before clap sees them.

use clap::{Args, Parser, Subcommand};
use snafu::{OptionExt, ResultExt, Snafu};
use std::{ffi::OsString, path::PathBuf, time::Duration};
use url::Url;

use crate::{
    app::POLL_INTERVAL,
    client::{Model, DEFAULT_BASE_URL},
    prompt::{self, CommandKind, ResolvedPrompt},
};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &[
    "video", "model", "prompt", "tone", "api-key", "timeout", "base-url",
];

const EXAMPLES: &str = "\
Examples:
  video-agent-skills feedback -video ./demo/RefreshAgent-Demo-30s.mp4
  video-agent-skills feedback -video ./demo/RefreshAgent-Demo-30s.mp4 -tone super-harsh
  video-agent-skills reverse -video ./demo/RefreshAgent-Demo-30s.mp4";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("-video is required"))]
    MissingVideo,

    #[snafu(display("invalid -tone"))]
    Prompt { source: prompt::Error },
}

/// Get feedback on a video, or reverse-engineer the prompt behind it, with Gemini.
#[derive(Debug, Parser)]
#[command(
    name = "video-agent-skills",
    version,
    arg_required_else_help = true,
    after_help = EXAMPLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Critique a video as a senior motion designer would
    Feedback(FeedbackArgs),
    /// Reconstruct the prompt that likely produced a video
    Reverse(ReverseArgs),
}

#[derive(Debug, Args)]
pub struct VideoArgs {
    /// Path to a video file (required)
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub video: Option<PathBuf>,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Instruction sent with the video, replacing the built-in one
    #[arg(long, allow_hyphen_values = true)]
    pub prompt: Option<String>,

    /// Gemini API key (overrides GEMINI_API_KEY/GOOGLE_API_KEY)
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Root of the Gemini REST API
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: Url,
}

#[derive(Debug, Args)]
pub struct FeedbackArgs {
    #[command(flatten)]
    pub common: VideoArgs,

    /// Feedback tone: nice, normal, harsh or super-harsh
    #[arg(long, value_name = "TONE")]
    pub tone: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReverseArgs {
    #[command(flatten)]
    pub common: VideoArgs,

    /// Accepted for symmetry with `feedback`; has no effect
    #[arg(long, value_name = "TONE", hide = true)]
    pub tone: Option<String>,
}

/// Everything one run needs, fully validated.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandKind,
    pub video: PathBuf,
    pub model: Model,
    pub prompt: ResolvedPrompt,
    pub api_key: Option<String>,
    pub base_url: Url,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Command {
    /// Validate the parsed flags. No filesystem or network access happens here.
    pub fn into_invocation(self) -> Result<Invocation, Error> {
        let (command, common, tone) = match self {
            Command::Feedback(args) => (CommandKind::Feedback, args.common, args.tone),
            Command::Reverse(args) => (CommandKind::Reverse, args.common, args.tone),
        };

        let video = common
            .video
            .filter(|path| !path.as_os_str().is_empty())
            .context(MissingVideoSnafu)?;
        let prompt = prompt::resolve(command, common.prompt.as_deref(), tone.as_deref())
            .context(PromptSnafu)?;

        Ok(Invocation {
            command,
            video,
            model: Model::from(common.model),
            prompt,
            api_key: common.api_key,
            base_url: common.base_url,
            timeout: common.timeout.map(Duration::from_secs),
            poll_interval: POLL_INTERVAL,
        })
    }
}

/// Rewrite single-dash long flags (`-video`, `-api-key=x`) to their `--` form.
///
/// Values following a value-taking flag are passed through untouched, as is
/// everything after `--`. Single-character flags such as `-h` are unchanged.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut args = args.into_iter().map(Into::into);
    normalized.extend(args.next());

    let mut value_expected = false;
    while let Some(arg) = args.next() {
        if value_expected {
            value_expected = false;
            normalized.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        if text == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
            break;
        }

        let long = if let Some(rest) = text.strip_prefix("--") {
            Some(rest.to_string())
        } else if text.len() > 2 && text.starts_with('-') {
            Some(text[1..].to_string())
        } else {
            None
        };

        match long {
            Some(flag) => {
                value_expected = !flag.contains('=') && VALUE_FLAGS.contains(&flag.as_str());
                normalized.push(format!("--{flag}").into());
            }
            None => normalized.push(arg),
        }
    }
    normalized
}
