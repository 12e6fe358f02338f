use clap::Args;

use crate::command::Context;
use crate::error::AwsxError;
use crate::profile::write::delete_assume_role_profile;
use crate::prompt::{position_of, Choice, Prompt};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct RemoveAssumeRoleProfileCommand {
    #[arg(help = "Name of the assume role profile to remove")]
    pub profile: Option<String>,

    #[arg(short, long, help = "Do not ask for confirmation")]
    pub yes: bool,
}

impl RemoveAssumeRoleProfileCommand {
    pub fn execute<S: ProfileStore, P: Prompt>(self, ctx: &mut Context<'_, S, P>) -> anyhow::Result<()> {
        let profiles = ctx.profiles();
        let name = match self.profile {
            Some(name) => name,
            None => {
                let choices = profiles
                    .assume_role_profiles()
                    .map(|p| Choice::new(format!("{} ({})", p.name, p.parent_name), p.name.clone()))
                    .collect::<Vec<_>>();
                if choices.is_empty() {
                    writeln!(ctx.out, "No assume role profiles are configured")?;
                    return Ok(());
                }
                let initial = position_of(&choices, ctx.current_profile);
                ctx.prompt.select("Choose a profile", &choices, initial)?
            }
        };
        if profiles.get_assume_role_profile(&name).is_none() {
            return Err(AwsxError::ProfileNotFound(name).into());
        }

        let question = format!(
            "Are you sure you want to remove assume role profile '{}'?",
            name
        );
        if !ctx.confirmed(&question, self.yes)? {
            writeln!(ctx.out, "Assume role profile '{}' was not removed", name)?;
            return Ok(());
        }

        delete_assume_role_profile(ctx.store, &name)?;
        writeln!(ctx.out, "Removed assume role profile '{}'", name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fixture::*;
    use crate::profile::load::ProfileRegistry;
    use crate::profile::write::{add_assume_role_profile, add_profile};
    use crate::profile::AssumeRoleProfile;
    use crate::prompt::scripted::{Answer, ScriptedPrompt};
    use crate::store::memory::MemoryStore;

    #[test]
    fn removes_chosen_child() {
        let store = MemoryStore::default();
        add_profile(&store, &plain("prod"), NOW).unwrap();
        add_assume_role_profile(
            &store,
            &AssumeRoleProfile {
                name: "prod-admin".to_string(),
                parent_name: "prod".to_string(),
                role_arn: "arn:aws:iam::111111111111:role/admin".to_string(),
                region_name: None,
                output_format: None,
            },
            NOW,
        )
        .unwrap();
        let prompt = ScriptedPrompt::new([Answer::Select("prod-admin"), Answer::Confirm(true)]);
        let mut out = Vec::new();
        let clock = clock();
        let mut ctx = Context {
            store: &store,
            prompt: &prompt,
            clock: &clock,
            current_profile: None,
            out: &mut out,
        };

        RemoveAssumeRoleProfileCommand::default()
            .execute(&mut ctx)
            .unwrap();

        assert_eq!(output(&out), "Removed assume role profile 'prod-admin'\n");
        assert!(ProfileRegistry::new(&store)
            .list_assume_role_profiles(None)
            .is_empty());
    }

    #[test]
    fn unknown_child_is_reported() {
        let store = MemoryStore::default();
        let prompt = ScriptedPrompt::default();
        let mut out = Vec::new();
        let clock = clock();
        let mut ctx = Context {
            store: &store,
            prompt: &prompt,
            clock: &clock,
            current_profile: None,
            out: &mut out,
        };

        let err = RemoveAssumeRoleProfileCommand {
            profile: Some("nope".to_string()),
            yes: true,
        }
        .execute(&mut ctx)
        .unwrap_err();

        assert!(err.to_string().contains("nope"));
    }
}
