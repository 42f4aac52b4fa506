//! get command - Download one object

use std::path::PathBuf;

use clap::Args;
use s3t_core::TransferResult;
use s3t_core::transfer::download;

use super::{Context, parse_object};
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Download an object to a local file
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object address (s3://bucket/key)
    pub source: String,

    /// Local file to write; parent directories are created
    pub target: PathBuf,
}

/// Execute the get command
pub async fn execute(args: GetArgs, ctx: &Context) -> ExitCode {
    let remote = match parse_object(&args.source) {
        Ok(remote) => remote,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let progress = ProgressBar::spinner(ctx.formatter.config(), &format!("downloading {remote}"));
    let result = download(&client, &remote, &args.target).await;
    progress.finish_and_clear();

    match result {
        Ok(bytes) => {
            let target = args.target.display().to_string();
            if ctx.formatter.is_json() {
                ctx.formatter
                    .json(&TransferResult::success(remote.to_string(), target, bytes));
            } else {
                ctx.formatter.success(&format!(
                    "Downloaded {remote} to {target} ({})",
                    humansize::format_size(bytes, humansize::BINARY)
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}
