//! ls command - List buckets and objects
//!
//! Lists buckets when given no address, or objects under a bucket prefix.

use clap::Args;
use s3t_core::{ListOptions, ObjectInfo, ObjectStore, RemotePath, parse_remote};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Keys requested per listing page
const PAGE_SIZE: i32 = 1000;

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote address (s3://bucket[/prefix]); lists buckets when omitted
    pub path: Option<String>,

    /// List every key under the prefix instead of one level
    #[arg(short, long)]
    pub recursive: bool,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    items: Vec<ObjectInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: i64,
    total_size_human: String,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let path = match args.path.as_deref().map(parse_remote).transpose() {
        Ok(path) => path,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let items = match &path {
        None => client.list_buckets().await,
        Some(path) => list_all(&client, path, args.recursive).await,
    };

    match items {
        Ok(items) => {
            print_items(ctx, items, args.summarize);
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

/// Collect every page of a listing
async fn list_all<S: ObjectStore + ?Sized>(
    store: &S,
    path: &RemotePath,
    recursive: bool,
) -> s3t_core::Result<Vec<ObjectInfo>> {
    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let options = ListOptions {
            recursive,
            max_keys: Some(PAGE_SIZE),
            continuation_token: continuation_token.take(),
            ..Default::default()
        };

        let page = store.list_objects(path, options).await?;
        items.extend(page.items);
        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    Ok(items)
}

fn print_items(ctx: &Context, items: Vec<ObjectInfo>, summarize: bool) {
    let total_objects = items.iter().filter(|i| !i.is_dir).count();
    let total_size: i64 = items.iter().filter_map(|i| i.size_bytes).sum();
    let total_size_human = humansize::format_size(total_size.max(0) as u64, humansize::BINARY);

    let formatter = &ctx.formatter;
    if formatter.is_json() {
        formatter.json(&LsOutput {
            items,
            summary: summarize.then(|| Summary {
                total_objects,
                total_size_bytes: total_size,
                total_size_human,
            }),
        });
        return;
    }

    for item in &items {
        formatter.println(&format_entry(item));
    }
    if summarize {
        formatter.println(&format!(
            "\nTotal: {total_objects} objects, {total_size_human}"
        ));
    }
}

fn format_entry(item: &ObjectInfo) -> String {
    let date = item
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));

    if item.is_dir {
        format!("[{date}] {:>10} {}", "PRE", item.key)
    } else {
        let size = item.size_human.as_deref().unwrap_or("0 B");
        format!("[{date}] {size:>10} {}", item.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry_file() {
        let mut info = ObjectInfo::file("backup/a.txt", 2048);
        info.last_modified = Some("2024-03-01T12:30:00Z".parse().unwrap());
        assert_eq!(
            format_entry(&info),
            "[2024-03-01 12:30:00]      2 KiB backup/a.txt"
        );
    }

    #[test]
    fn test_format_entry_prefix() {
        let info = ObjectInfo::dir("backup/sub/");
        let line = format_entry(&info);
        assert!(line.starts_with(&format!("[{}]", " ".repeat(19))));
        assert!(line.ends_with("PRE backup/sub/"));
    }
}
