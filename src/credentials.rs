use snafu::{OptionExt, Snafu};

use crate::config::Environment;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "missing API key: set GEMINI_API_KEY or GOOGLE_API_KEY, or pass -api-key"
    ))]
    MissingApiKey,
}

/// Pick the API key: the `-api-key` flag, then `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
///
/// Values are trimmed and blank values are skipped.
pub fn resolve_api_key(flag: Option<&str>, env: &Environment) -> Result<String, Error> {
    flag.map(str::trim)
        .filter(|key| !key.is_empty())
        .or_else(|| env.get(GEMINI_API_KEY))
        .or_else(|| env.get(GOOGLE_API_KEY))
        .map(str::to_string)
        .context(MissingApiKeySnafu)
}
