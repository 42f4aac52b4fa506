//! mp command - Maintain incomplete multipart uploads
//!
//! Uploads interrupted mid-way keep their parts, and the space they use,
//! until they are aborted.

use clap::{Args, Subcommand};
use s3t_core::{
    MultipartManager, MultipartUpload, PartInfo, RemotePath, parse_remote, validate_session,
};

use super::Context;
use crate::exit_code::ExitCode;

/// Multipart upload subcommands
#[derive(Subcommand, Debug)]
pub enum MpCommands {
    /// List incomplete uploads in a bucket
    List(ListArgs),

    /// List the parts committed to an upload
    Parts(SessionArgs),

    /// Abort an upload and free its parts
    Abort(SessionArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Bucket address (s3://bucket)
    pub bucket: String,
}

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Object address the upload targets (s3://bucket/key)
    pub path: String,

    /// Upload id as shown by `mp list`
    pub upload_id: String,
}

/// Execute an mp subcommand
pub async fn execute(cmd: MpCommands, ctx: &Context) -> ExitCode {
    match cmd {
        MpCommands::List(args) => list(args, ctx).await,
        MpCommands::Parts(args) => parts(args, ctx).await,
        MpCommands::Abort(args) => abort(args, ctx).await,
    }
}

async fn list(args: ListArgs, ctx: &Context) -> ExitCode {
    let bucket = match parse_remote(&args.bucket) {
        Ok(path) => path.bucket,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    match MultipartManager::new(&client).list_uploads(&bucket).await {
        Ok(uploads) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&uploads);
            } else if uploads.is_empty() {
                ctx.formatter.println("No incomplete uploads.");
            } else {
                ctx.formatter.print_table(&uploads_table(ctx, &uploads));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

async fn parts(args: SessionArgs, ctx: &Context) -> ExitCode {
    let path = match session_path(&args) {
        Ok(path) => path,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    match MultipartManager::new(&client)
        .list_parts(&path, &args.upload_id)
        .await
    {
        Ok(parts) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&parts);
            } else {
                ctx.formatter.print_table(&parts_table(ctx, &parts));
                let total: i64 = parts.iter().map(|p| p.size).sum();
                ctx.formatter.println(&format!(
                    "{} part(s), {}",
                    parts.len(),
                    humansize::format_size(total.max(0) as u64, humansize::BINARY)
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

async fn abort(args: SessionArgs, ctx: &Context) -> ExitCode {
    let path = match session_path(&args) {
        Ok(path) => path,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    match MultipartManager::new(&client)
        .abort(&path, &args.upload_id)
        .await
    {
        Ok(()) => {
            if ctx.formatter.is_json() {
                ctx.formatter.json(&serde_json::json!({
                    "status": "aborted",
                    "url": path.to_string(),
                    "upload_id": args.upload_id,
                }));
            } else {
                ctx.formatter
                    .success(&format!("Aborted upload {} for {path}", args.upload_id));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

/// Parse and check a session address before any client is built
fn session_path(args: &SessionArgs) -> s3t_core::Result<RemotePath> {
    let path = parse_remote(&args.path)?;
    validate_session(&path, &args.upload_id)?;
    Ok(path)
}

fn format_time(time: Option<jiff::Timestamp>) -> String {
    time.map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn uploads_table(ctx: &Context, uploads: &[MultipartUpload]) -> comfy_table::Table {
    let mut table = ctx.formatter.table(&["Initiated", "Key", "Upload ID"]);
    for upload in uploads {
        table.add_row(vec![
            format_time(upload.initiated),
            upload.key.clone(),
            upload.upload_id.clone(),
        ]);
    }
    table
}

fn parts_table(ctx: &Context, parts: &[PartInfo]) -> comfy_table::Table {
    let mut table = ctx.formatter.table(&["Part", "Size", "ETag", "Last Modified"]);
    for part in parts {
        table.add_row(vec![
            part.part_number.to_string(),
            humansize::format_size(part.size.max(0) as u64, humansize::BINARY),
            part.etag.clone(),
            format_time(part.last_modified),
        ]);
    }
    table
}
