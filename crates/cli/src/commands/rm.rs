//! rm command - Remove one object

use clap::Args;
use s3t_core::ObjectStore;
use serde::Serialize;

use super::{Context, parse_object};
use crate::exit_code::ExitCode;

/// Remove an object
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object address (s3://bucket/key)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: String,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, ctx: &Context) -> ExitCode {
    let path = match parse_object(&args.path) {
        Ok(path) => path,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    if let Err(e) = client.delete_object(&path).await {
        return ctx.fail(&e);
    }

    if ctx.formatter.is_json() {
        ctx.formatter.json(&RmOutput {
            status: "success",
            deleted: path.to_string(),
        });
    } else {
        ctx.formatter.success(&format!("Removed {path}"));
    }
    ExitCode::Success
}
