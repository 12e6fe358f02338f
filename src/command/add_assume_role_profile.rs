use clap::Args;

use crate::command::Context;
use crate::error::AwsxError;
use crate::profile::write::add_assume_role_profile;
use crate::profile::AssumeRoleProfile;
use crate::prompt::{Prompt, OUTPUT_FORMATS};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct AddAssumeRoleProfileCommand {
    #[arg(help = "Name of the profile to create")]
    pub profile: Option<String>,

    #[arg(help = "Profile whose credentials assume the role")]
    pub parent_profile: Option<String>,

    #[arg(help = "ARN of the role to assume")]
    pub role_arn: Option<String>,

    #[arg(long, help = "Default region (defaults to the parent's)")]
    pub region: Option<String>,

    #[arg(long, value_parser = OUTPUT_FORMATS, help = "AWS CLI output format (defaults to the parent's)")]
    pub output: Option<String>,
}

impl AddAssumeRoleProfileCommand {
    fn is_scripted(&self) -> bool {
        self.profile.is_some() && self.parent_profile.is_some() && self.role_arn.is_some()
    }

    pub fn execute<S: ProfileStore, P: Prompt>(self, ctx: &mut Context<'_, S, P>) -> anyhow::Result<()> {
        let scripted = self.is_scripted();
        let profiles = ctx.profiles();

        let name = ctx.required("Name", self.profile, None)?;
        if profiles.contains(&name) {
            return Err(AwsxError::ProfileNameCollision(name).into());
        }
        let parent = ctx.choose_profile(&profiles, self.parent_profile.as_deref(), |_| true)?;
        let role_arn = ctx.required("Role ARN", self.role_arn, None)?;

        let (region_name, output_format) = if scripted {
            (
                self.region.or_else(|| parent.region_name.clone()),
                self.output.or_else(|| parent.output_format.clone()),
            )
        } else {
            let region = ctx.optional("Default region", self.region, parent.region_name())?;
            let output = ctx.output_format(self.output, parent.output_format())?;
            (region, Some(output))
        };

        let profile = AssumeRoleProfile {
            name,
            parent_name: parent.name.clone(),
            role_arn,
            region_name,
            output_format,
        };
        add_assume_role_profile(ctx.store, &profile, ctx.clock.now_secs())?;

        writeln!(
            ctx.out,
            "Added assume role profile '{}' under '{}'",
            profile.name, profile.parent_name
        )?;
        Ok(())
    }
}
