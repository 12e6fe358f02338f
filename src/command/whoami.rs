use std::io::Write;

use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::aws::{assumed_role, bounded, defaults, Iam, Identity, Sts};
use crate::command::Context;
use crate::prompt::Prompt;
use crate::store::section::DEFAULT_PROFILE;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct WhoamiCommand {
    #[arg(long, help = "Print as JSON")]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WhoAmI {
    account: Option<String>,
    aliases: Vec<String>,
    arn: Option<String>,
    assumed_role: Option<String>,
    profile: String,
    region: Option<String>,
    user_id: Option<String>,
}

impl WhoamiCommand {
    pub async fn execute<S, P, A>(self, ctx: &mut Context<'_, S, P>, aws: &A) -> anyhow::Result<()>
    where
        S: ProfileStore,
        P: Prompt,
        A: Sts + Iam + Sync,
    {
        let profile_name = ctx.current_profile.unwrap_or(DEFAULT_PROFILE).to_string();
        let profiles = ctx.profiles();
        let region = match profiles.get_profile(&profile_name) {
            Some(p) => p.region_name.clone(),
            None => profiles
                .get_assume_role_profile(&profile_name)
                .and_then(|p| p.region_name.clone()),
        };

        let identity = Identity::Profile(&profile_name);
        let caller = match bounded(defaults::IDENTITY_TIMEOUT, aws.get_caller_identity(identity)).await {
            Ok(caller) => caller,
            Err(e) => {
                debug!("caller identity of {}: {:?}", profile_name, e);
                anyhow::bail!("Session is expired or invalid");
            }
        };
        let aliases = bounded(defaults::IDENTITY_TIMEOUT, aws.list_account_aliases(identity))
            .await
            .unwrap_or_else(|e| {
                warn!("could not list account aliases: {}", e);
                Vec::new()
            });

        let whoami = WhoAmI {
            account: caller.account,
            aliases,
            assumed_role: caller.arn.as_deref().and_then(assumed_role).map(str::to_string),
            arn: caller.arn,
            profile: profile_name,
            region,
            user_id: caller.user_id,
        };

        if self.json {
            serde_json::to_writer_pretty(&mut *ctx.out, &whoami)?;
            writeln!(ctx.out)?;
        } else {
            render(&whoami, ctx.out)?;
        }
        Ok(())
    }
}

fn render(whoami: &WhoAmI, out: &mut dyn Write) -> anyhow::Result<()> {
    let fields = match serde_json::to_value(whoami)? {
        Value::Object(fields) => fields,
        _ => unreachable!("WhoAmI serializes to an object"),
    };
    let width = fields.keys().map(|k| k.len()).max().unwrap_or(0);

    for (key, value) in fields {
        let value = match value {
            Value::Null => "-".to_string(),
            Value::String(s) => s,
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        writeln!(out, "{:width$} -> {}", key, value, width = width)?;
    }
    Ok(())
}
