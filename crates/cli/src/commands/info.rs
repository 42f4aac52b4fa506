//! info command - Show object metadata and access control
//!
//! Combines a HEAD request with the object's ACL grants.

use clap::Args;
use s3t_core::{Grant, ObjectInfo, ObjectStore};
use serde::Serialize;

use super::{Context, parse_object};
use crate::exit_code::ExitCode;

/// Show object metadata
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Object address (s3://bucket/key)
    pub path: String,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    url: String,
    #[serde(flatten)]
    object: ObjectInfo,
    grants: Vec<Grant>,
}

/// Execute the info command
pub async fn execute(args: InfoArgs, ctx: &Context) -> ExitCode {
    let path = match parse_object(&args.path) {
        Ok(path) => path,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let object = match client.head_object(&path).await {
        Ok(info) => info,
        Err(e) => return ctx.fail(&e),
    };
    let grants = match client.get_object_acl(&path).await {
        Ok(grants) => grants,
        Err(e) => return ctx.fail(&e),
    };

    let output = InfoOutput {
        url: path.to_string(),
        object,
        grants,
    };
    if ctx.formatter.is_json() {
        ctx.formatter.json(&output);
    } else {
        for line in describe(&output) {
            ctx.formatter.println(&line);
        }
    }
    ExitCode::Success
}

fn describe(output: &InfoOutput) -> Vec<String> {
    let info = &output.object;
    let mut lines = vec![format!("URL       : {}", output.url)];

    if let Some(modified) = info.last_modified {
        lines.push(format!(
            "Date      : {}",
            modified.strftime("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let (Some(size), Some(human)) = (info.size_bytes, &info.size_human) {
        lines.push(format!("Size      : {human} ({size} bytes)"));
    }
    if let Some(etag) = &info.etag {
        lines.push(format!("ETag      : {etag}"));
    }
    if let Some(ct) = &info.content_type {
        lines.push(format!("Type      : {ct}"));
    }
    if let Some(sc) = &info.storage_class {
        lines.push(format!("Class     : {sc}"));
    }
    for grant in &output.grants {
        let grantee = if grant.grantee.is_empty() {
            "*"
        } else {
            grant.grantee.as_str()
        };
        lines.push(format!("ACL       : {grantee}: {}", grant.permission));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_grants() {
        let mut object = ObjectInfo::file("a.txt", 3);
        object.etag = Some("abc".into());
        let output = InfoOutput {
            url: "s3://bucket/a.txt".into(),
            object,
            grants: vec![
                Grant {
                    grantee: "owner-id".into(),
                    permission: "FULL_CONTROL".into(),
                },
                Grant {
                    grantee: String::new(),
                    permission: "READ".into(),
                },
            ],
        };

        let lines = describe(&output);
        assert_eq!(lines[0], "URL       : s3://bucket/a.txt");
        assert!(lines.contains(&"Size      : 3 B (3 bytes)".to_string()));
        assert!(lines.contains(&"ETag      : abc".to_string()));
        assert!(lines.contains(&"ACL       : owner-id: FULL_CONTROL".to_string()));
        assert!(lines.contains(&"ACL       : *: READ".to_string()));
    }
}
