//! setacl command - Apply a canned ACL to an object

use clap::Args;
use s3t_core::{CannedAcl, ObjectStore};

use super::{Context, parse_object};
use crate::exit_code::ExitCode;

/// Set an object's ACL
#[derive(Args, Debug)]
pub struct SetaclArgs {
    /// Object address (s3://bucket/key)
    pub path: String,

    /// Allow read access for anyone
    #[arg(long, conflicts_with = "acl_private")]
    pub acl_public: bool,

    /// Restrict access to the owner (default)
    #[arg(long)]
    pub acl_private: bool,
}

impl SetaclArgs {
    fn acl(&self) -> CannedAcl {
        if self.acl_public {
            CannedAcl::PublicRead
        } else {
            CannedAcl::Private
        }
    }
}

/// Execute the setacl command
pub async fn execute(args: SetaclArgs, ctx: &Context) -> ExitCode {
    let path = match parse_object(&args.path) {
        Ok(path) => path,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect().await {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let acl = args.acl();
    if let Err(e) = client.put_object_acl(&path, acl).await {
        return ctx.fail(&e);
    }

    if ctx.formatter.is_json() {
        ctx.formatter.json(&serde_json::json!({
            "url": path.to_string(),
            "acl": acl.as_str(),
        }));
    } else {
        ctx.formatter.success(&format!("Set ACL of {path} to {acl}"));
    }
    ExitCode::Success
}
