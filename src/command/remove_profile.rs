use clap::Args;

use crate::command::Context;
use crate::profile::write::delete_profile;
use crate::prompt::Prompt;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct RemoveProfileCommand {
    #[arg(help = "Name of the profile to remove")]
    pub profile: Option<String>,

    #[arg(short, long, help = "Do not ask for confirmation")]
    pub yes: bool,
}

impl RemoveProfileCommand {
    pub fn execute<S: ProfileStore, P: Prompt>(self, ctx: &mut Context<'_, S, P>) -> anyhow::Result<()> {
        let profiles = ctx.profiles();
        let profile = ctx.choose_profile(&profiles, self.profile.as_deref(), |_| true)?;
        let name = profile.name.as_str();

        let orphans = profiles.children_of(name).map(|c| c.name.as_str()).collect::<Vec<_>>();
        if !orphans.is_empty() {
            writeln!(
                ctx.out,
                "Assume role profiles using '{}' as their parent will stop working: {}",
                name,
                orphans.join(", ")
            )?;
        }

        let question = format!("Are you sure you want to remove profile '{}'?", name);
        if !ctx.confirmed(&question, self.yes)? {
            writeln!(ctx.out, "Profile '{}' was not removed", name)?;
            return Ok(());
        }

        delete_profile(ctx.store, name)?;
        writeln!(ctx.out, "Removed profile '{}'", name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fixture::*;
    use crate::profile::write::{add_assume_role_profile, add_profile};
    use crate::profile::AssumeRoleProfile;
    use crate::prompt::scripted::{Answer, ScriptedPrompt};
    use crate::store::memory::MemoryStore;
    use crate::store::StoreKind;

    fn run(store: &MemoryStore, prompt: &ScriptedPrompt, command: RemoveProfileCommand) -> String {
        let mut out = Vec::new();
        let clock = clock();
        let mut ctx = Context {
            store,
            prompt,
            clock: &clock,
            current_profile: Some("prod"),
            out: &mut out,
        };
        command.execute(&mut ctx).unwrap();
        output(&out)
    }

    #[test]
    fn removes_after_confirmation_and_warns_about_children() {
        let store = MemoryStore::default();
        add_profile(&store, &plain("dev"), NOW).unwrap();
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
        let prompt = ScriptedPrompt::new([Answer::Select("prod"), Answer::Confirm(true)]);

        let out = run(&store, &prompt, RemoveProfileCommand::default());

        assert!(out.contains("stop working: prod-admin"));
        assert!(out.ends_with("Removed profile 'prod'\n"));
        assert_eq!(store.get(StoreKind::AwsCredentials, "prod", "aws_access_key_id"), None);
        assert!(store
            .get(StoreKind::AwsCredentials, "dev", "aws_access_key_id")
            .is_some());
    }

    #[test]
    fn declining_keeps_profile() {
        let store = MemoryStore::default();
        add_profile(&store, &plain("dev"), NOW).unwrap();
        let writes = store.writes().len();
        let prompt = ScriptedPrompt::new([Answer::Confirm(false)]);

        let out = run(
            &store,
            &prompt,
            RemoveProfileCommand {
                profile: Some("dev".to_string()),
                yes: false,
            },
        );

        assert_eq!(out, "Profile 'dev' was not removed\n");
        assert_eq!(store.writes().len(), writes);
    }

    #[test]
    fn yes_skips_confirmation() {
        let store = MemoryStore::default();
        add_profile(&store, &plain("dev"), NOW).unwrap();
        let prompt = ScriptedPrompt::default();

        run(
            &store,
            &prompt,
            RemoveProfileCommand {
                profile: Some("dev".to_string()),
                yes: true,
            },
        );

        assert!(prompt.asked().is_empty());
        assert_eq!(store.get(StoreKind::AwsCredentials, "dev", "aws_access_key_id"), None);
    }
}
