//! cp command - Server-side copy within one bucket

use clap::Args;
use s3t_core::{Error, ObjectInfo, ObjectStore, RemotePath};

use super::{Context, parse_object};
use crate::exit_code::ExitCode;

/// Copy an object to another key of the same bucket
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source object (s3://bucket/key)
    pub source: String,

    /// Target object (s3://bucket/key)
    pub target: String,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, ctx: &Context) -> ExitCode {
    let (src, dst) = match parse_pair(&args.source, &args.target) {
        Ok(pair) => pair,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    match client.copy_object(&src, &dst).await {
        Ok(info) => {
            print_copied(ctx, &src, &dst, &info);
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

/// Parse both ends of a copy; they must live in the same bucket
fn parse_pair(source: &str, target: &str) -> s3t_core::Result<(RemotePath, RemotePath)> {
    let src = parse_object(source)?;
    let dst = parse_object(target)?;
    if src.bucket != dst.bucket {
        return Err(Error::UnsupportedFeature(format!(
            "Copy between buckets ({} to {}) is not supported",
            src.bucket, dst.bucket
        )));
    }
    Ok((src, dst))
}

fn print_copied(ctx: &Context, src: &RemotePath, dst: &RemotePath, info: &ObjectInfo) {
    if ctx.formatter.is_json() {
        ctx.formatter.json(&serde_json::json!({
            "source": src.to_string(),
            "target": dst.to_string(),
            "size_bytes": info.size_bytes,
            "etag": info.etag,
        }));
    } else {
        ctx.formatter.success(&format!("Copied {src} to {dst}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bucket_pair() {
        let (src, dst) = parse_pair("s3://bucket/a.txt", "s3://bucket/backup/a.txt").unwrap();
        assert_eq!(src.key, "a.txt");
        assert_eq!(dst.key, "backup/a.txt");
    }

    #[test]
    fn test_cross_bucket_rejected() {
        let err = parse_pair("s3://one/a.txt", "s3://two/a.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
        assert_eq!(ExitCode::from_error(&err), ExitCode::UnsupportedFeature);
    }

    #[test]
    fn test_local_target_rejected() {
        let err = parse_pair("s3://bucket/a.txt", "./a.txt").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }
}
