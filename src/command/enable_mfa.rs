use clap::Args;

use crate::command::add_profile::{ask_session_length, parse_session_length};
use crate::command::Context;
use crate::profile::write::save_profile;
use crate::profile::{MfaSettings, Profile, ProfileKind};
use crate::prompt::Prompt;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct EnableMfaCommand {
    #[arg(help = "Name of the profile")]
    pub profile: Option<String>,

    #[arg(long, help = "ARN of the MFA device")]
    pub mfa_arn: Option<String>,

    #[arg(long, value_parser = parse_session_length, help = "MFA session length in seconds")]
    pub mfa_expiry: Option<u32>,
}

impl EnableMfaCommand {
    pub fn execute<S: ProfileStore, P: Prompt>(self, ctx: &mut Context<'_, S, P>) -> anyhow::Result<()> {
        let profiles = ctx.profiles();
        let profile = ctx.choose_profile(&profiles, self.profile.as_deref(), |p| !p.mfa_enabled())?;
        if profile.mfa_enabled() {
            writeln!(ctx.out, "Profile '{}' already has MFA enabled", profile.name)?;
            return Ok(());
        }

        let device_arn = ctx.required("MFA device ARN", self.mfa_arn, None)?;
        let session_length = match self.mfa_expiry {
            Some(seconds) => seconds,
            None => ask_session_length(ctx.prompt)?,
        };

        let updated = Profile {
            kind: ProfileKind::Mfa(MfaSettings {
                device_arn,
                session_length,
                last_login: None,
                session_valid: false,
            }),
            ..profile.clone()
        };
        save_profile(ctx.store, &updated)?;

        writeln!(ctx.out, "Enabled MFA on profile '{}'", updated.name)?;
        Ok(())
    }
}
