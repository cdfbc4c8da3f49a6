use clap::{error::ErrorKind, Parser};
use display_error_chain::DisplayErrorChain;
use std::{io::IsTerminal, process::ExitCode};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use video_agent_skills::{
    app,
    cli::{self, Cli},
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = match Cli::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        // usage goes to stderr; stdout carries only generated text
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            eprint!("{}", e.render());
            return ExitCode::SUCCESS;
        }
        Err(e) => e.exit(),
    };

    match do_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_chain = DisplayErrorChain::new(e.as_ref());
            error!(error.chained = %error_chain, "execution failed");
            ExitCode::FAILURE
        }
    }
}

async fn do_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let invocation = cli.command.into_invocation()?;
    let env = app::load_environment();

    let cancel = CancellationToken::new();
    if let Some(timeout) = invocation.timeout {
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(timeout.secs = timeout.as_secs(), "deadline reached, cancelling");
            deadline.cancel();
        });
    }

    let mut stdout = std::io::stdout().lock();
    app::run(invocation, &env, &mut stdout, &cancel).await?;
    Ok(())
}
