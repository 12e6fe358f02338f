use clap::Args;

use crate::command::Context;
use crate::profile::write::save_profile;
use crate::profile::{Profile, ProfileKind};
use crate::prompt::Prompt;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct DisableMfaCommand {
    #[arg(help = "Name of the profile")]
    pub profile: Option<String>,
}

impl DisableMfaCommand {
    /// Puts the long-lived keys back into the credentials file in place of the session keys.
    pub fn execute<S: ProfileStore, P: Prompt>(self, ctx: &mut Context<'_, S, P>) -> anyhow::Result<()> {
        let profiles = ctx.profiles();
        let profile = ctx.choose_profile(&profiles, self.profile.as_deref(), Profile::mfa_enabled)?;
        if !profile.mfa_enabled() {
            writeln!(ctx.out, "Profile '{}' already has MFA disabled", profile.name)?;
            return Ok(());
        }

        let updated = Profile {
            kind: ProfileKind::Plain,
            ..profile.clone()
        };
        save_profile(ctx.store, &updated)?;

        writeln!(ctx.out, "Disabled MFA on profile '{}'", updated.name)?;
        Ok(())
    }
}
