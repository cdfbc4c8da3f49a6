//! The upload, wait, generate pipeline behind both commands.

use snafu::{ResultExt, Snafu};
use std::{io::Write, path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    cli::Invocation,
    client::{Error as ClientError, Gemini},
    config::{self, Environment},
    credentials, files, media,
};

/// Delay between two status checks of an uploaded video.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(context(false), display("no usable API key"))]
    Credentials { source: credentials::Error },

    #[snafu(display("unusable video file"))]
    Media { source: media::Error },

    #[snafu(display("failed to read video '{}'", path.display()))]
    ReadVideo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to create Gemini client"))]
    CreateClient { source: ClientError },

    #[snafu(display("failed to upload video"))]
    Upload { source: ClientError },

    #[snafu(display("uploaded video did not become active"))]
    WaitActive { source: files::Error },

    #[snafu(display("cannot reference uploaded video"))]
    Reference { source: files::Error },

    #[snafu(display("failed to generate content"))]
    Generate { source: ClientError },

    #[snafu(display("operation cancelled"))]
    Cancelled,

    #[snafu(display("failed to write result"))]
    WriteOutput { source: std::io::Error },
}

/// Process environment merged with the per-user env file, if any.
///
/// Problems with the env file are logged and otherwise ignored.
pub fn load_environment() -> Environment {
    let mut env = Environment::from_process();
    if let Some(path) = config::default_env_path() {
        if let Err(e) = env.merge_env_file(&path) {
            warn!(error = %display_error_chain::DisplayErrorChain::new(&e), "ignoring env file");
        }
    }
    env
}

/// Run one invocation and write the generated text to `out`.
///
/// Exactly one file is uploaded and one generation request is made. Every
/// remote call and the readiness wait stop early when `cancel` fires.
#[instrument(skip_all, fields(
    command = invocation.command.as_ref(),
    video = %invocation.video.display(),
    model = %invocation.model,
))]
pub async fn run<W: Write>(
    invocation: Invocation,
    env: &Environment,
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    if let Some(tone) = &invocation.prompt.ignored_tone {
        warn!(tone = %tone, "-tone is ignored for the reverse command");
    }

    let api_key = credentials::resolve_api_key(invocation.api_key.as_deref(), env)?;
    let gemini = Gemini::with_model_and_base_url(
        api_key,
        invocation.model.clone(),
        invocation.base_url.clone(),
    )
    .context(CreateClientSnafu)?;

    let mime_type = media::detect_video_mime(&invocation.video).context(MediaSnafu)?;
    let bytes = tokio::fs::read(&invocation.video)
        .await
        .context(ReadVideoSnafu {
            path: &invocation.video,
        })?;
    let display_name = invocation
        .video
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    info!(mime.type = %mime_type, size = bytes.len(), "uploading video");
    let mut builder = gemini.create_file(bytes).with_mime_type(mime_type);
    if let Some(name) = display_name {
        builder = builder.display_name(name);
    }
    let mut file = tokio::select! {
        _ = cancel.cancelled() => return CancelledSnafu.fail(),
        uploaded = builder.upload() => uploaded.context(UploadSnafu)?,
    };
    info!(file.name = file.name(), state = file.state().as_ref(), "video uploaded");

    file.wait_until_active(invocation.poll_interval, cancel)
        .await
        .context(WaitActiveSnafu)?;
    info!(file.name = file.name(), "video is active");

    let request = gemini
        .generate_content()
        .with_user_message_and_file(invocation.prompt.text.as_str(), &file)
        .context(ReferenceSnafu)?;
    let response = tokio::select! {
        _ = cancel.cancelled() => return CancelledSnafu.fail(),
        response = request.execute() => response.context(GenerateSnafu)?,
    };
    if let Some(usage) = &response.usage_metadata {
        debug!(
            prompt.tokens = usage.prompt_token_count,
            output.tokens = usage.candidates_token_count,
            total.tokens = usage.total_token_count,
            "token usage"
        );
    }

    writeln!(out, "{}", response.text()).context(WriteOutputSnafu)?;
    out.flush().context(WriteOutputSnafu)?;
    Ok(())
}
