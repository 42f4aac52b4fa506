//! put command - Upload one file

use std::path::PathBuf;

use clap::Args;
use s3t_core::TransferResult;
use s3t_core::transfer::upload;

use super::{Context, parse_object};
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Upload a local file to an object
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to read
    pub source: PathBuf,

    /// Object address (s3://bucket/key)
    pub target: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, ctx: &Context) -> ExitCode {
    let remote = match parse_object(&args.target) {
        Ok(remote) => remote,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let progress = ProgressBar::spinner(ctx.formatter.config(), &format!("uploading to {remote}"));
    let result = upload(&client, &args.source, &remote).await;
    progress.finish_and_clear();

    match result {
        Ok(bytes) => {
            let source = args.source.display().to_string();
            if ctx.formatter.is_json() {
                ctx.formatter
                    .json(&TransferResult::success(source, remote.to_string(), bytes));
            } else {
                ctx.formatter.success(&format!(
                    "Uploaded {source} to {remote} ({})",
                    humansize::format_size(bytes, humansize::BINARY)
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}
