use awsx_schema::credentials::Credentials;
use clap::Args;
use tracing::debug;

use crate::aws::{bounded, defaults, Identity, Sts};
use crate::command::{validate_key_max_age, Context};
use crate::error::AwsxError;
use crate::key_age::DEFAULT_KEY_MAX_AGE_DAYS;
use crate::profile::write::add_profile;
use crate::profile::{
    validate_mfa_expiry, MfaSettings, Profile, ProfileKind, DEFAULT_SESSION_LENGTH_SECS,
};
use crate::prompt::{Prompt, OUTPUT_FORMATS};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct AddProfileCommand {
    #[arg(help = "Name of the profile to create")]
    pub profile: Option<String>,

    #[arg(long, help = "Access key ID")]
    pub access_key: Option<String>,

    #[arg(long, help = "Secret access key")]
    pub secret_key: Option<String>,

    #[arg(long, help = "Access key maximum age in days (0 disables key age checks)")]
    pub key_max_age: Option<u32>,

    #[arg(long, help = "Default region")]
    pub region: Option<String>,

    #[arg(long, value_parser = OUTPUT_FORMATS, help = "AWS CLI output format")]
    pub output: Option<String>,

    #[arg(long, help = "ARN of the MFA device; enables MFA")]
    pub mfa_arn: Option<String>,

    #[arg(long, value_parser = parse_session_length, help = "MFA session length in seconds")]
    pub mfa_expiry: Option<u32>,

    #[arg(long, help = "Do not check the keys with STS before saving")]
    pub skip_verify: bool,
}

pub(crate) fn parse_session_length(s: &str) -> Result<u32, String> {
    let seconds = s.parse::<i64>().map_err(|e| e.to_string())?;
    validate_mfa_expiry(seconds)?;
    u32::try_from(seconds).map_err(|e| e.to_string())
}

pub(crate) fn ask_session_length<P: Prompt>(prompt: &P) -> crate::error::Result<u32> {
    let seconds = prompt.number(
        "MFA session length (seconds)",
        i64::from(DEFAULT_SESSION_LENGTH_SECS),
        &validate_mfa_expiry,
    )?;
    u32::try_from(seconds).map_err(|e| AwsxError::InvalidInput(e.to_string()))
}

impl AddProfileCommand {
    /// Everything needed was given on the command line.
    fn is_scripted(&self) -> bool {
        self.profile.is_some() && self.access_key.is_some() && self.secret_key.is_some()
    }

    pub async fn execute<S, P, A>(self, ctx: &mut Context<'_, S, P>, aws: &A) -> anyhow::Result<()>
    where
        S: ProfileStore,
        P: Prompt,
        A: Sts + Sync,
    {
        let scripted = self.is_scripted();
        let existing = ctx.profiles();

        let name = ctx.required("Name", self.profile, None)?;
        if existing.contains(&name) {
            return Err(AwsxError::ProfileNameCollision(name).into());
        }

        let key = ctx.required("Access key", self.access_key, None)?;
        let secret = ctx.required("Secret key", self.secret_key, None)?;
        let credentials = Credentials::new(key, secret);

        let (key_max_age, region_name, output_format) = if scripted {
            (
                self.key_max_age.unwrap_or(DEFAULT_KEY_MAX_AGE_DAYS),
                self.region,
                self.output,
            )
        } else {
            let key_max_age = match self.key_max_age {
                Some(days) => days,
                None => {
                    let days = ctx.prompt.number(
                        "Access key maximum age in days (0 disables key age checks)",
                        i64::from(DEFAULT_KEY_MAX_AGE_DAYS),
                        &validate_key_max_age,
                    )?;
                    u32::try_from(days).map_err(|e| AwsxError::InvalidInput(e.to_string()))?
                }
            };
            let region = ctx.optional("Default region", self.region, None)?;
            let output = ctx.output_format(self.output, None)?;
            (key_max_age, region, Some(output))
        };

        let kind = match self.mfa_arn {
            Some(device_arn) => ProfileKind::Mfa(MfaSettings {
                device_arn,
                session_length: self.mfa_expiry.unwrap_or(DEFAULT_SESSION_LENGTH_SECS),
                last_login: None,
                session_valid: false,
            }),
            None if !scripted && ctx.prompt.confirm("Use MFA", false)? => {
                let device_arn = ctx.required("MFA device ARN", None, None)?;
                let session_length = match self.mfa_expiry {
                    Some(seconds) => seconds,
                    None => ask_session_length(ctx.prompt)?,
                };
                ProfileKind::Mfa(MfaSettings {
                    device_arn,
                    session_length,
                    last_login: None,
                    session_valid: false,
                })
            }
            None => ProfileKind::Plain,
        };

        if !self.skip_verify {
            let identity = Identity::Keys {
                credentials: &credentials,
                region: region_name.as_deref(),
            };
            let caller = bounded(defaults::IDENTITY_TIMEOUT, aws.get_caller_identity(identity))
                .await
                .map_err(|source| AwsxError::CredentialExchangeFailed {
                    profile: name.clone(),
                    source,
                })?;
            debug!("verified keys of {:?}", caller.arn);
        }

        let profile = Profile {
            name,
            credentials,
            region_name,
            output_format,
            key_max_age: Some(key_max_age),
            secret_key_expiry: None,
            kind,
        };
        add_profile(ctx.store, &profile, ctx.clock.now_secs())?;

        writeln!(ctx.out, "Added new profile '{}'", profile.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::aws::{CallerIdentity, SessionTokenRequest};
    use crate::command::fixture::*;
    use crate::profile::load::ProfileRegistry;
    use crate::prompt::scripted::{Answer, ScriptedPrompt};
    use crate::store::memory::MemoryStore;
    use crate::store::StoreKind;

    #[derive(Default)]
    struct FakeSts {
        reject: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Sts for FakeSts {
        async fn mint_session_token(
            &self,
            _base: &Credentials,
            _region: Option<&str>,
            _request: SessionTokenRequest,
        ) -> anyhow::Result<Credentials> {
            unreachable!("adding a profile never mints sessions")
        }

        async fn get_caller_identity(&self, _identity: Identity<'_>) -> anyhow::Result<CallerIdentity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                anyhow::bail!("InvalidClientTokenId");
            }
            Ok(CallerIdentity {
                account: Some("111111111111".to_string()),
                arn: Some("arn:aws:iam::111111111111:user/alice".to_string()),
                user_id: Some("AIDA".to_string()),
            })
        }
    }

    async fn run(
        store: &MemoryStore,
        prompt: &ScriptedPrompt,
        sts: &FakeSts,
        command: AddProfileCommand,
    ) -> (anyhow::Result<()>, String) {
        let mut out = Vec::new();
        let clock = clock();
        let mut ctx = Context {
            store,
            prompt,
            clock: &clock,
            current_profile: None,
            out: &mut out,
        };
        let result = command.execute(&mut ctx, sts).await;
        (result, output(&out))
    }

    #[tokio::test]
    async fn interactive_mfa_profile() {
        let store = MemoryStore::default();
        let prompt = ScriptedPrompt::new([
            Answer::Text("prod"),
            Answer::Text(" AKIAPROD "),
            Answer::Text("secret"),
            Answer::Number(30),
            Answer::Text("us-east-1"),
            Answer::Select("yaml"),
            Answer::Confirm(true),
            Answer::Text("arn:aws:iam::111111111111:mfa/alice"),
            Answer::Number(7200),
        ]);
        let sts = FakeSts::default();

        let (result, out) = run(&store, &prompt, &sts, AddProfileCommand::default()).await;

        result.unwrap();
        assert_eq!(out, "Added new profile 'prod'\n");
        assert_eq!(sts.calls.load(Ordering::SeqCst), 1);

        let profile = ProfileRegistry::new(&store)
            .load(NOW)
            .get_profile("prod")
            .cloned()
            .unwrap();
        assert_eq!(profile.credentials.key, "AKIAPROD");
        assert_eq!(profile.key_max_age, Some(30));
        assert_eq!(profile.output_format.as_deref(), Some("yaml"));
        let mfa = profile.mfa().unwrap();
        assert_eq!(mfa.session_length, 7200);
        assert_eq!(mfa.last_login, None);
    }

    #[tokio::test]
    async fn scripted_plain_profile_asks_nothing() {
        let store = MemoryStore::default();
        let prompt = ScriptedPrompt::default();
        let sts = FakeSts::default();
        let command = AddProfileCommand {
            profile: Some("dev".to_string()),
            access_key: Some("AKIADEV".to_string()),
            secret_key: Some("secret".to_string()),
            skip_verify: true,
            ..AddProfileCommand::default()
        };

        let (result, _) = run(&store, &prompt, &sts, command).await;

        result.unwrap();
        assert!(prompt.asked().is_empty());
        assert_eq!(sts.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            store.get(StoreKind::AwsCredentials, "dev", "aws_access_key_id"),
            Some("AKIADEV".to_string())
        );
        assert_eq!(
            store.get(StoreKind::Metadata, "dev", "awsAccessKeyMaxAge"),
            Some(DEFAULT_KEY_MAX_AGE_DAYS.to_string())
        );
    }

    #[tokio::test]
    async fn rejected_keys_are_not_saved() {
        let store = MemoryStore::default();
        let prompt = ScriptedPrompt::default();
        let sts = FakeSts {
            reject: true,
            ..FakeSts::default()
        };
        let command = AddProfileCommand {
            profile: Some("dev".to_string()),
            access_key: Some("AKIADEV".to_string()),
            secret_key: Some("wrong".to_string()),
            ..AddProfileCommand::default()
        };

        let (result, _) = run(&store, &prompt, &sts, command).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AwsxError>(),
            Some(AwsxError::CredentialExchangeFailed { .. })
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn existing_name_is_rejected_before_asking_for_keys() {
        let store = MemoryStore::default();
        add_profile(&store, &plain("dev"), NOW).unwrap();
        let writes = store.writes().len();
        let prompt = ScriptedPrompt::new([Answer::Text("dev")]);
        let sts = FakeSts::default();

        let (result, _) = run(&store, &prompt, &sts, AddProfileCommand::default()).await;

        assert!(matches!(
            result.unwrap_err().downcast_ref::<AwsxError>(),
            Some(AwsxError::ProfileNameCollision(name)) if name == "dev"
        ));
        assert_eq!(prompt.asked(), vec!["Name"]);
        assert_eq!(store.writes().len(), writes);
    }

    #[test]
    fn session_length_flag_is_bounded() {
        assert_eq!(parse_session_length("3600"), Ok(3600));
        assert_eq!(
            parse_session_length("0"),
            Err("mfaExpiry must be greater than 0".to_string())
        );
        assert!(parse_session_length("129601").is_err());
        assert!(parse_session_length("soon").is_err());
    }
}
