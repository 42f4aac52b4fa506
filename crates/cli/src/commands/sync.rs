//! sync command - Mirror a local tree to S3 or an S3 prefix to disk
//!
//! The direction follows from which side is the `s3://` address. It is
//! resolved before any connection is made, so a rejected pair never
//! touches the network.

use clap::Args;
use s3t_core::{
    SyncDirection, SyncOptions, SyncReport, TransferResult, TreeSync, parse_path,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::ProgressBar;

/// Sync a directory tree
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Source: a local directory or s3://bucket[/prefix]
    pub source: String,

    /// Target: s3://bucket[/prefix] or a local directory
    pub target: String,

    /// Keep going after a failed transfer and report failures at the end
    #[arg(long)]
    pub continue_on_error: bool,
}

#[derive(Debug, Serialize)]
struct SyncOutput<'a> {
    status: &'static str,
    source: &'a str,
    target: &'a str,
    #[serde(flatten)]
    report: &'a SyncReport,
}

/// Execute the sync command
pub async fn execute(args: SyncArgs, ctx: &Context) -> ExitCode {
    let direction = match resolve(&args.source, &args.target) {
        Ok(direction) => direction,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("interrupted, stopping sync");
            cancel.cancel();

            // a second interrupt does not wait for the run to unwind
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(ExitCode::Interrupted.as_i32());
            }
        }
    });

    let transfer = &ctx.config.transfer;
    let options = SyncOptions {
        continue_on_error: args.continue_on_error || transfer.continue_on_error,
        queue_capacity: transfer.queue_capacity.max(1),
        cancel,
    };

    let progress = ProgressBar::spinner(ctx.formatter.config(), "");
    let result = TreeSync::new(&client, options)
        .run(direction, |item| report_item(ctx, &progress, item))
        .await;
    progress.finish_and_clear();
    interrupt.abort();

    match result {
        Ok(report) => print_report(ctx, &args, &report),
        Err(e) => ctx.fail(&e),
    }
}

fn resolve(source: &str, target: &str) -> s3t_core::Result<SyncDirection> {
    SyncDirection::resolve(parse_path(source)?, parse_path(target)?)
}

fn report_item(ctx: &Context, progress: &ProgressBar, item: &TransferResult) {
    if ctx.formatter.is_json() {
        ctx.formatter.json_line(item);
        return;
    }
    match &item.error {
        None => {
            progress.inc(1);
            progress.set_message(&item.target);
        }
        Some(error) => ctx
            .formatter
            .error(&format!("{} -> {}: {error}", item.source, item.target)),
    }
}

fn print_report(ctx: &Context, args: &SyncArgs, report: &SyncReport) -> ExitCode {
    let formatter = &ctx.formatter;
    if formatter.is_json() {
        formatter.json_line(&SyncOutput {
            status: if report.is_success() { "success" } else { "partial" },
            source: &args.source,
            target: &args.target,
            report,
        });
    } else {
        let size = humansize::format_size(report.bytes, humansize::BINARY);
        if report.is_success() {
            formatter.success(&format!(
                "Synced {} file(s), {size}.",
                report.transferred
            ));
        } else {
            formatter.warning(&format!(
                "Synced {} file(s), {size}; {} failed.",
                report.transferred, report.failed
            ));
        }
        if report.skipped > 0 {
            formatter.println(&format!("Created {} directory marker(s).", report.skipped));
        }
    }

    if report.is_success() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}
