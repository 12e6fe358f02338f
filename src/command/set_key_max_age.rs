use clap::Args;

use crate::command::{validate_key_max_age, Context};
use crate::error::AwsxError;
use crate::key_age::DEFAULT_KEY_MAX_AGE_DAYS;
use crate::profile::write::set_key_max_age;
use crate::prompt::Prompt;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct SetKeyMaxAgeCommand {
    #[arg(help = "Name of the profile")]
    pub profile: Option<String>,

    #[arg(help = "Maximum age of the access key in days, 0 disables key age checks")]
    pub max_age: Option<u32>,

    #[arg(short, long, help = "Replace an existing maximum age without asking")]
    pub yes: bool,
}

impl SetKeyMaxAgeCommand {
    pub fn execute<S: ProfileStore, P: Prompt>(self, ctx: &mut Context<'_, S, P>) -> anyhow::Result<()> {
        let profiles = ctx.profiles();
        let profile = ctx.choose_profile(&profiles, self.profile.as_deref(), |_| true)?;
        let name = profile.name.as_str();

        if let Some(current) = profile.key_max_age {
            let question = format!(
                "Profile '{}' already has an access key maximum age of {} days. Do you want to update it?",
                name, current
            );
            if !ctx.confirmed(&question, self.yes)? {
                writeln!(ctx.out, "Access key maximum age of '{}' was not updated", name)?;
                return Ok(());
            }
        }

        let days = match self.max_age {
            Some(days) => days,
            None => {
                let initial = profile.key_max_age.unwrap_or(DEFAULT_KEY_MAX_AGE_DAYS);
                let days = ctx.prompt.number(
                    "Access key maximum age in days (0 disables key age checks)",
                    i64::from(initial),
                    &validate_key_max_age,
                )?;
                u32::try_from(days).map_err(|e| AwsxError::InvalidInput(e.to_string()))?
            }
        };

        set_key_max_age(ctx.store, name, days)?;
        writeln!(ctx.out, "Updated access key maximum age of '{}' to {} days", name, days)?;
        Ok(())
    }
}
