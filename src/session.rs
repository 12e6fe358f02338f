use awsx_schema::credentials::{Credentials, TemporaryCredentials};
use tracing::{debug, info, warn};

use crate::aws::{access_key_created_at, bounded, defaults, Iam, Identity, SessionTokenRequest, Sts};
use crate::clock::Clock;
use crate::error::{AwsxError, Result};
use crate::handler::{HandleCredentials, HandleCredentialsRequest};
use crate::key_age::{self, KeyAgeStatus, DEFAULT_AGE_THRESHOLDS};
use crate::mfa::ReadMfaToken;
use crate::profile::load::ProfileRegistry;
use crate::profile::write::record_mfa_login;
use crate::profile::{AssumeRoleProfile, MfaSettings, Profile, ProfileSet};
use crate::prompt::{position_of, Choice, Prompt};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Default)]
pub struct SwitchRequest {
    /// A plain, MFA or assume-role profile. Asked interactively when absent.
    pub profile_name: Option<String>,
    pub assume_role_profile: Option<String>,
    pub force_mfa: bool,
    /// Preselected in the profile prompt.
    pub current_profile: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Switched {
    pub profile_name: String,
    /// What `AWS_PROFILE` now names: the profile or one of its assume-role children.
    pub active_profile: String,
    pub key_age: Option<KeyAgeStatus>,
}

/// Activates profiles: resolves the name, reuses or renews the MFA session,
/// picks an assume-role child and hands the result to the export handler.
pub struct SessionEngine<'a, S, C, P, R, A, H> {
    store: &'a S,
    clock: C,
    prompt: P,
    mfa_reader: R,
    aws: A,
    handler: H,
}

impl<'a, S, C, P, R, A, H> SessionEngine<'a, S, C, P, R, A, H>
where
    S: ProfileStore,
    C: Clock,
    P: Prompt,
    R: ReadMfaToken,
    A: Sts + Iam + Sync,
    H: HandleCredentials,
{
    pub fn new(store: &'a S, clock: C, prompt: P, mfa_reader: R, aws: A, handler: H) -> Self {
        Self {
            store,
            clock,
            prompt,
            mfa_reader,
            aws,
            handler,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub async fn switch(&self, request: SwitchRequest) -> Result<Switched> {
        let now = self.clock.now_secs();
        let profiles = ProfileRegistry::new(self.store).load(now);

        let (profile, requested_child) = self.resolve_profile(&profiles, &request)?;
        debug!("target profile:{}", profile.name);

        let credentials = match profile.mfa() {
            None => profile.credentials.clone(),
            Some(mfa) => match self.reuse_session(profile, request.force_mfa) {
                Some(cached) => cached,
                None => self.challenge_mfa(profile, mfa, now).await?,
            },
        };

        let child = self.resolve_assume_role(&profiles, profile, requested_child.as_deref())?;
        let active_profile = self.export(profile, child, &credentials)?;

        let key_age = self.check_key_age(profile, &credentials).await;

        Ok(Switched {
            profile_name: profile.name.clone(),
            active_profile,
            key_age,
        })
    }

    /// Returns the profile to activate and, when an assume-role name was given
    /// in place of a profile, the child to activate under it.
    fn resolve_profile<'p>(
        &self,
        profiles: &'p ProfileSet,
        request: &SwitchRequest,
    ) -> Result<(&'p Profile, Option<String>)> {
        let requested_child = request.assume_role_profile.clone();

        let name = match request.profile_name.as_deref() {
            Some(name) => name.to_string(),
            None => {
                if profiles.is_empty() {
                    return Err(AwsxError::NoProfilesConfigured);
                }
                let choices = profiles.names().map(Choice::plain).collect::<Vec<_>>();
                let initial = position_of(&choices, request.current_profile.as_deref());
                self.prompt.select("Choose a profile", &choices, initial)?
            }
        };

        if let Some(profile) = profiles.get_profile(&name) {
            return Ok((profile, requested_child));
        }

        match profiles.get_assume_role_profile(&name) {
            Some(child) => {
                let parent = profiles
                    .get_profile(&child.parent_name)
                    .ok_or_else(|| AwsxError::ProfileNotFound(child.parent_name.clone()))?;
                debug!("{} is an assume role profile of {}", name, parent.name);
                Ok((parent, requested_child.or(Some(name))))
            }
            None => Err(AwsxError::ProfileNotFound(name)),
        }
    }

    fn reuse_session(&self, profile: &Profile, force_mfa: bool) -> Option<Credentials> {
        if force_mfa {
            debug!("{}: mfa challenge forced", profile.name);
            return None;
        }
        if !profile.mfa_session_valid() {
            debug!("{}: mfa session expired", profile.name);
            return None;
        }

        let cached = ProfileRegistry::new(self.store)
            .cached_credentials(&profile.name)
            .map(|t| t.credentials)
            .filter(Credentials::is_session);
        if cached.is_some() {
            debug!("{}: reusing cached session", profile.name);
        }
        cached
    }

    async fn challenge_mfa(
        &self,
        profile: &Profile,
        mfa: &MfaSettings,
        now: i64,
    ) -> Result<Credentials> {
        let token_code = self
            .mfa_reader
            .read_mfa_token(&mfa.device_arn)
            .await
            .map_err(|e| match e.downcast::<AwsxError>() {
                Ok(e) => e,
                Err(e) => AwsxError::Prompt(e.to_string()),
            })?;

        let request = SessionTokenRequest {
            duration_seconds: mfa.session_length,
            serial_number: mfa.device_arn.clone(),
            token_code,
        };
        let credentials = bounded(
            defaults::SESSION_TOKEN_TIMEOUT,
            self.aws
                .mint_session_token(&profile.credentials, profile.region_name(), request),
        )
        .await
        .map_err(|source| AwsxError::CredentialExchangeFailed {
            profile: profile.name.clone(),
            source,
        })?;

        let temporary = TemporaryCredentials::new(profile.name.clone(), credentials);
        record_mfa_login(self.store, &temporary, now)?;
        Ok(temporary.credentials)
    }

    fn resolve_assume_role<'p>(
        &self,
        profiles: &'p ProfileSet,
        profile: &Profile,
        requested: Option<&str>,
    ) -> Result<Option<&'p AssumeRoleProfile>> {
        let children = profiles.children_of(&profile.name).collect::<Vec<_>>();

        if let Some(name) = requested {
            return children
                .into_iter()
                .find(|c| c.name == name)
                .map(Some)
                .ok_or_else(|| AwsxError::AssumeRoleProfileNotFound {
                    name: name.to_string(),
                    parent: profile.name.clone(),
                });
        }
        if children.is_empty() {
            return Ok(None);
        }

        let mut choices = vec![Choice::new(
            format!("{} (stay on parent)", profile.name),
            profile.name.clone(),
        )];
        choices.extend(children.iter().map(|c| Choice::plain(c.name.clone())));
        let selected = self
            .prompt
            .select("Choose an assume role profile", &choices, Some(0))?;

        Ok(children.into_iter().find(|c| c.name == selected))
    }

    fn export(
        &self,
        profile: &Profile,
        child: Option<&AssumeRoleProfile>,
        credentials: &Credentials,
    ) -> Result<String> {
        let request = match child {
            // The AWS CLI assumes the role itself through `source_profile`.
            Some(child) => HandleCredentialsRequest {
                profile_name: &child.name,
                region_name: child.region_name.as_deref().or(profile.region_name()),
                output_format: child.output_format.as_deref().or(profile.output_format()),
                credentials: None,
            },
            None => HandleCredentialsRequest {
                profile_name: &profile.name,
                region_name: profile.region_name(),
                output_format: profile.output_format(),
                credentials: Some(credentials),
            },
        };
        let active_profile = request.profile_name.to_string();

        self.handler
            .handle_credentials(request)
            .map_err(AwsxError::Export)?;
        info!("switched to {}", active_profile);
        Ok(active_profile)
    }

    /// Never fails: lookup errors and timeouts are logged and yield no status.
    async fn check_key_age(
        &self,
        profile: &Profile,
        credentials: &Credentials,
    ) -> Option<KeyAgeStatus> {
        if profile.key_max_age == Some(0) {
            return None;
        }

        let identity = Identity::Keys {
            credentials,
            region: profile.region_name(),
        };
        let lookup = access_key_created_at(&self.aws, identity, profile.credentials.key());
        match bounded(defaults::IDENTITY_TIMEOUT, lookup).await {
            Ok(Some(created_at)) => {
                let age = key_age::age_in_days(created_at, self.clock.now());
                key_age::evaluate(age, profile.key_max_age, &DEFAULT_AGE_THRESHOLDS)
            }
            Ok(None) => {
                debug!("{}: access key not listed for its user", profile.name);
                None
            }
            Err(e) => {
                warn!("{}: could not check access key age: {}", profile.name, e);
                None
            }
        }
    }
}
