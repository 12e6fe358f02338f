use std::env;
use std::io;

use awsx_schema::shell::Shell;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use crate::aws::aws_sdk::AwsSdkClient;
use crate::clock::{Clock, SystemClock};
use crate::command::switch::ExportScript;
use crate::command::{
    AddAssumeRoleProfileCommand, AddProfileCommand, BackupConfigCommand, CompletionsCommand,
    Context, CurrentProfileCommand, DisableMfaCommand, EnableMfaCommand,
    RemoveAssumeRoleProfileCommand, RemoveProfileCommand, SetKeyMaxAgeCommand, SwitchCommand,
    WhoamiCommand,
};
use crate::paths::Paths;
use crate::prompt::terminal::TerminalPrompt;
use crate::store::FileStore;

pub const AWS_PROFILE: &str = "AWS_PROFILE";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "awsx",
    version,
    about = "Switch between AWS CLI profiles, MFA sessions and assume role profiles",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(flatten)]
    pub switch: SwitchCommand,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Add a profile")]
    AddProfile(AddProfileCommand),
    #[command(about = "Remove a profile")]
    RemoveProfile(RemoveProfileCommand),
    #[command(about = "Add an assume role profile under an existing profile")]
    AddAssumeRoleProfile(AddAssumeRoleProfileCommand),
    #[command(about = "Remove an assume role profile")]
    RemoveAssumeRoleProfile(RemoveAssumeRoleProfileCommand),
    #[command(about = "Enable MFA on an existing profile")]
    EnableMfa(EnableMfaCommand),
    #[command(about = "Disable MFA on an existing profile")]
    DisableMfa(DisableMfaCommand),
    #[command(about = "Set the maximum age of a profile's access key in days")]
    SetKeyMaxAge(SetKeyMaxAgeCommand),
    #[command(about = "Back up the AWS CLI and awsx config files")]
    BackupConfig(BackupConfigCommand),
    #[command(alias = "status", about = "Show which AWS account and identity you are using")]
    Whoami(WhoamiCommand),
    #[command(about = "Show the current profile")]
    CurrentProfile(CurrentProfileCommand),
    #[command(about = "Generate shell completion scripts for awsx")]
    Completions(CompletionsCommand),
}

/// Process-wide inputs, read once at start-up.
#[derive(Debug, Clone)]
pub struct Environment {
    pub paths: Paths,
    pub current_profile: Option<String>,
    pub shell: Shell,
}

impl Environment {
    pub fn from_env() -> anyhow::Result<Environment> {
        let shell = env::var("SHELL")
            .ok()
            .and_then(Shell::from_process_path)
            .unwrap_or(Shell::Bash);
        Ok(Environment {
            paths: Paths::from_env()?,
            current_profile: env::var(AWS_PROFILE).ok().filter(|p| !p.is_empty()),
            shell,
        })
    }
}

/// Creates the AWS and awsx homes, then insists on both AWS files.
pub fn open_store(paths: Paths, now: DateTime<Utc>) -> anyhow::Result<FileStore> {
    let store = FileStore::new(paths);
    if store.ensure_initialized(now)? {
        info!("first run, backed up existing AWS CLI configuration");
    }
    store.require_aws_files_present()?;
    Ok(store)
}

impl Cli {
    pub async fn execute(self, environment: Environment) -> anyhow::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let command = match self.command {
            Some(Commands::Completions(cmd)) => {
                cmd.execute(&mut out);
                return Ok(());
            }
            command => command,
        };

        let Environment {
            paths,
            current_profile,
            shell,
        } = environment;
        let script = ExportScript {
            path: paths.exports_script(),
            shell,
        };

        let clock = SystemClock;
        let store = open_store(paths, clock.now())?;

        let prompt = TerminalPrompt::default();
        let aws = AwsSdkClient;
        let mut ctx = Context {
            store: &store,
            prompt: &prompt,
            clock: &clock,
            current_profile: current_profile.as_deref(),
            out: &mut out,
        };

        match command {
            None => self.switch.execute(&mut ctx, &aws, script).await,
            Some(Commands::AddProfile(cmd)) => cmd.execute(&mut ctx, &aws).await,
            Some(Commands::RemoveProfile(cmd)) => cmd.execute(&mut ctx),
            Some(Commands::AddAssumeRoleProfile(cmd)) => cmd.execute(&mut ctx),
            Some(Commands::RemoveAssumeRoleProfile(cmd)) => cmd.execute(&mut ctx),
            Some(Commands::EnableMfa(cmd)) => cmd.execute(&mut ctx),
            Some(Commands::DisableMfa(cmd)) => cmd.execute(&mut ctx),
            Some(Commands::SetKeyMaxAge(cmd)) => cmd.execute(&mut ctx),
            Some(Commands::BackupConfig(cmd)) => cmd.execute(&store, &clock, ctx.out),
            Some(Commands::Whoami(cmd)) => cmd.execute(&mut ctx, &aws).await,
            Some(Commands::CurrentProfile(cmd)) => cmd.execute(ctx.current_profile, ctx.out),
            Some(Commands::Completions(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AwsxError;

    #[test]
    fn bare_invocation_switches() {
        let cli = Cli::try_parse_from(["awsx", "prod", "prod-readonly", "-f"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.switch.profile.as_deref(), Some("prod"));
        assert_eq!(cli.switch.assume_role_profile.as_deref(), Some("prod-readonly"));
        assert!(cli.switch.force_mfa);
    }

    #[test]
    fn token_and_subshell_flags() {
        let cli = Cli::try_parse_from(["awsx", "--token", "123456", "--subshell"]).unwrap();
        assert_eq!(cli.switch.token.as_deref(), Some("123456"));
        assert!(cli.switch.subshell);
        assert_eq!(cli.switch.profile, None);
    }

    #[test]
    fn status_is_an_alias_of_whoami() {
        let cli = Cli::try_parse_from(["awsx", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Whoami(WhoamiCommand { json: true }))));
    }

    #[test]
    fn subcommands_take_their_own_arguments() {
        let cli = Cli::try_parse_from(["awsx", "set-key-max-age", "dev", "30", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::SetKeyMaxAge(cmd)) => {
                assert_eq!(cmd.profile.as_deref(), Some("dev"));
                assert_eq!(cmd.max_age, Some(30));
            }
            other => panic!("expected set-key-max-age, got {:?}", other),
        }
    }

    #[test]
    fn invalid_output_format_is_rejected() {
        assert!(Cli::try_parse_from(["awsx", "add-profile", "dev", "--output", "xml"]).is_err());
    }

    #[test]
    fn mfa_expiry_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["awsx", "enable-mfa", "dev", "--mfa-expiry", "0"]).is_err());
        assert!(Cli::try_parse_from(["awsx", "enable-mfa", "dev", "--mfa-expiry", "900"]).is_ok());
    }

    #[test]
    fn missing_aws_files_are_reported_after_creating_the_aws_home() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let e = open_store(paths.clone(), now).unwrap_err();
        assert!(matches!(
            e.downcast_ref::<AwsxError>(),
            Some(AwsxError::ConfigurationMissing { .. })
        ));
        assert!(dir.path().join(".aws").is_dir());

        std::fs::write(&paths.aws_config, "").unwrap();
        std::fs::write(&paths.aws_credentials, "").unwrap();
        assert!(open_store(paths, now).is_ok());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
