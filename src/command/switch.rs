use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use awsx_schema::shell::Shell;
use clap::Args;

use crate::aws::{Iam, Sts};
use crate::command::Context;
use crate::handler::script::ScriptCredentialsHandler;
use crate::handler::shell::{start_shell_session, ShellCredentialsHandler};
use crate::handler::{HandleCredentials, HandleCredentialsRequest};
use crate::mfa::{ReadMfaToken, StaticMfaTokenReader, TerminalMfaTokenReader};
use crate::prompt::Prompt;
use crate::session::{SessionEngine, SwitchRequest, Switched};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct SwitchCommand {
    #[arg(help = "Profile to switch to; an assume role profile switches to its parent first")]
    pub profile: Option<String>,

    #[arg(help = "Assume role profile of the chosen profile to activate")]
    pub assume_role_profile: Option<String>,

    #[arg(short, long, help = "Start a new MFA session even if the current one is still valid")]
    pub force_mfa: bool,

    #[arg(short, long, help = "MFA token code, instead of asking for it")]
    pub token: Option<String>,

    #[arg(long, help = "Start a new $SHELL with the profile exported instead of writing the export script")]
    pub subshell: bool,
}

/// Where a switch is exported to when not starting a subshell.
#[derive(Debug, Clone)]
pub struct ExportScript {
    pub path: PathBuf,
    pub shell: Shell,
}

enum MfaReader {
    Terminal(TerminalMfaTokenReader),
    Static(StaticMfaTokenReader),
}

#[async_trait]
impl ReadMfaToken for MfaReader {
    async fn read_mfa_token(&self, mfa_serial: &str) -> anyhow::Result<String> {
        use MfaReader::*;
        match self {
            Terminal(r) => r.read_mfa_token(mfa_serial).await,
            Static(r) => r.read_mfa_token(mfa_serial).await,
        }
    }
}

enum ExportHandler {
    Script(ScriptCredentialsHandler),
    Shell(ShellCredentialsHandler),
}

impl HandleCredentials for ExportHandler {
    fn handle_credentials(&self, request: HandleCredentialsRequest) -> anyhow::Result<()> {
        use ExportHandler::*;
        match self {
            Script(h) => h.handle_credentials(request),
            Shell(h) => h.handle_credentials(request),
        }
    }
}

impl SwitchCommand {
    fn mfa_reader(&self) -> MfaReader {
        match self.token.as_ref() {
            Some(token) => MfaReader::Static(StaticMfaTokenReader::from(token)),
            None => MfaReader::Terminal(TerminalMfaTokenReader),
        }
    }

    fn export_handler(&self, script: ExportScript) -> ExportHandler {
        if self.subshell {
            ExportHandler::Shell(ShellCredentialsHandler)
        } else {
            ExportHandler::Script(ScriptCredentialsHandler::new(script.path, script.shell))
        }
    }

    fn request(self, current_profile: Option<&str>) -> SwitchRequest {
        SwitchRequest {
            profile_name: self.profile,
            assume_role_profile: self.assume_role_profile,
            force_mfa: self.force_mfa,
            current_profile: current_profile.map(str::to_string),
        }
    }

    pub async fn execute<S, P, A>(
        self,
        ctx: &mut Context<'_, S, P>,
        aws: &A,
        script: ExportScript,
    ) -> anyhow::Result<()>
    where
        S: ProfileStore,
        P: Prompt,
        A: Sts + Iam + Sync,
    {
        let subshell = self.subshell;
        let engine = SessionEngine::new(
            ctx.store,
            ctx.clock,
            ctx.prompt,
            self.mfa_reader(),
            aws,
            self.export_handler(script),
        );
        let switched = engine.switch(self.request(ctx.current_profile)).await?;
        report(&switched, ctx.out)?;

        if subshell {
            start_shell_session()?;
        }
        Ok(())
    }
}

fn report(switched: &Switched, out: &mut dyn Write) -> anyhow::Result<()> {
    if switched.active_profile == switched.profile_name {
        writeln!(out, "Switched to profile {}", switched.profile_name)?;
    } else {
        writeln!(
            out,
            "Switched to profile {} -> {}",
            switched.profile_name, switched.active_profile
        )?;
    }

    if let Some(status) = &switched.key_age {
        writeln!(
            out,
            "{}: access key of profile '{}' {}",
            status.severity, switched.profile_name, status.message
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use awsx_schema::credentials::Credentials;

    use super::*;
    use crate::aws::{AccessKeyInfo, CallerIdentity, Identity, SessionTokenRequest};
    use crate::command::fixture::*;
    use crate::key_age::{KeyAgeStatus, Severity};
    use crate::profile::write::add_profile;
    use crate::prompt::scripted::ScriptedPrompt;
    use crate::store::memory::MemoryStore;

    struct OfflineAws;

    #[async_trait]
    impl Sts for OfflineAws {
        async fn mint_session_token(
            &self,
            _base: &Credentials,
            _region: Option<&str>,
            request: SessionTokenRequest,
        ) -> anyhow::Result<Credentials> {
            assert_eq!(request.token_code, "246810");
            Ok(Credentials::new("ASIASESSION", "session-secret").with_token("session-token"))
        }

        async fn get_caller_identity(&self, _identity: Identity<'_>) -> anyhow::Result<CallerIdentity> {
            anyhow::bail!("offline")
        }
    }

    #[async_trait]
    impl Iam for OfflineAws {
        async fn list_access_keys_for_user(
            &self,
            _identity: Identity<'_>,
            _user_name: &str,
        ) -> anyhow::Result<Vec<AccessKeyInfo>> {
            anyhow::bail!("offline")
        }

        async fn list_account_aliases(&self, _identity: Identity<'_>) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("offline")
        }
    }

    #[tokio::test]
    async fn static_token_switch_writes_export_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = ExportScript {
            path: dir.path().join("exports.sh"),
            shell: Shell::Fish,
        };
        let store = MemoryStore::default();
        add_profile(&store, &mfa("prod"), NOW).unwrap();
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
        let command = SwitchCommand {
            profile: Some("prod".to_string()),
            token: Some("246810".to_string()),
            ..SwitchCommand::default()
        };

        command.execute(&mut ctx, &OfflineAws, script.clone()).await.unwrap();

        assert_eq!(output(&out), "Switched to profile prod\n");
        let exported = fs::read_to_string(&script.path).unwrap();
        assert!(exported.contains("set -gx AWS_PROFILE 'prod'\n"));
        assert!(exported.contains("set -gx AWS_SESSION_TOKEN 'session-token'\n"));
        assert!(exported.contains("set -gx AWS_DEFAULT_OUTPUT 'json'\n"));
    }

    #[test]
    fn report_names_child_and_key_age() {
        let mut out = Vec::new();
        report(
            &Switched {
                profile_name: "prod".to_string(),
                active_profile: "prod-readonly".to_string(),
                key_age: Some(KeyAgeStatus::new(Severity::Warning, "expires tomorrow")),
            },
            &mut out,
        )
        .unwrap();

        assert_eq!(
            output(&out),
            "Switched to profile prod -> prod-readonly\n\
             warning: access key of profile 'prod' expires tomorrow\n"
        );
    }
}
