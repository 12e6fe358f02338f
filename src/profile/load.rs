use awsx_schema::credentials::{Credentials, TemporaryCredentials};
use ini::Properties;
use tracing::debug;

use crate::profile::{
    keys, mfa_session_valid, AssumeRoleProfile, MfaSettings, Profile, ProfileKind, ProfileSet,
    DEFAULT_SESSION_LENGTH_SECS,
};
use crate::store::section::{config_section_candidates, parse_config_section_name};
use crate::store::{named_sections, section, ProfileStore, Sections, StoreKind};

/// Builds the unified profile view by joining the three stores on profile name.
#[derive(Debug)]
pub struct ProfileRegistry<'a, S> {
    store: &'a S,
}

impl<'a, S: ProfileStore> ProfileRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every plain and MFA profile, in credentials-file order.
    pub fn list_profiles(&self, now: i64) -> Vec<Profile> {
        profiles_from(
            &self.store.read_store(StoreKind::AwsCredentials),
            &self.store.read_store(StoreKind::AwsConfig),
            &self.store.read_store(StoreKind::Metadata),
            now,
        )
    }

    /// Assume-role profiles, optionally restricted to children of `parent`.
    pub fn list_assume_role_profiles(&self, parent: Option<&str>) -> Vec<AssumeRoleProfile> {
        assume_role_profiles_from(&self.store.read_store(StoreKind::AwsConfig))
            .into_iter()
            .filter(|p| parent.map(|name| p.parent_name == name).unwrap_or(true))
            .collect()
    }

    pub fn load(&self, now: i64) -> ProfileSet {
        let profiles = self
            .list_profiles(now)
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        let assume_role_profiles = self
            .list_assume_role_profiles(None)
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();

        ProfileSet {
            profiles,
            assume_role_profiles,
        }
    }

    /// Whatever the credentials file currently holds for `profile_name`.
    pub fn cached_credentials(&self, profile_name: &str) -> Option<TemporaryCredentials> {
        let credentials = self.store.read_store(StoreKind::AwsCredentials);
        let props = section(&credentials, profile_name)?;
        let key = non_empty(props, keys::AWS_ACCESS_KEY_ID)?;
        let secret = non_empty(props, keys::AWS_SECRET_ACCESS_KEY)?;

        let mut creds = Credentials::new(key, secret);
        creds.token = non_empty(props, keys::AWS_SESSION_TOKEN);
        Some(TemporaryCredentials::new(profile_name, creds))
    }
}

pub(crate) fn profiles_from(
    credentials: &Sections,
    config: &Sections,
    metadata: &Sections,
    now: i64,
) -> Vec<Profile> {
    named_sections(credentials)
        .map(|(name, creds)| {
            let config_props = config_section(config, name);
            let meta = section(metadata, name);
            profile_from(name, creds, config_props, meta, now)
        })
        .collect()
}

fn profile_from(
    name: &str,
    creds: &Properties,
    config: Option<&Properties>,
    meta: Option<&Properties>,
    now: i64,
) -> Profile {
    let region_name = config.and_then(|c| non_empty(c, keys::REGION));
    let output_format = config.and_then(|c| non_empty(c, keys::OUTPUT));
    let key_max_age = meta.and_then(|m| number::<u32>(m, keys::KEY_MAX_AGE));
    let secret_key_expiry = meta.and_then(|m| number::<i64>(m, keys::SECRET_KEY_EXPIRY));

    match meta.filter(|m| flag(m, keys::MFA_ENABLED)) {
        Some(meta) => {
            // The credentials file holds rotating session keys for MFA profiles;
            // the long-lived keys live in the metadata store.
            let credentials = Credentials::new(
                non_empty(meta, keys::ACCESS_KEY_ID).unwrap_or_default(),
                non_empty(meta, keys::SECRET_ACCESS_KEY).unwrap_or_default(),
            );
            let stored_length = number::<u32>(meta, keys::SESSION_LENGTH);
            let session_length = stored_length.unwrap_or(DEFAULT_SESSION_LENGTH_SECS);
            let last_login = number::<i64>(meta, keys::LAST_LOGIN);
            // Without a stored length there is no known expiry to reuse against.
            let session_valid = match (last_login, stored_length) {
                (Some(t), Some(length)) => mfa_session_valid(t, length, now),
                _ => false,
            };
            debug!("profile {}: mfa session valid={}", name, session_valid);

            Profile {
                name: name.to_string(),
                credentials,
                region_name,
                output_format,
                key_max_age,
                secret_key_expiry,
                kind: ProfileKind::Mfa(MfaSettings {
                    device_arn: non_empty(meta, keys::MFA_DEVICE_ARN).unwrap_or_default(),
                    session_length,
                    last_login,
                    session_valid,
                }),
            }
        }
        None => Profile {
            name: name.to_string(),
            credentials: Credentials::new(
                non_empty(creds, keys::AWS_ACCESS_KEY_ID).unwrap_or_default(),
                non_empty(creds, keys::AWS_SECRET_ACCESS_KEY).unwrap_or_default(),
            ),
            region_name,
            output_format,
            key_max_age,
            secret_key_expiry,
            kind: ProfileKind::Plain,
        },
    }
}

pub(crate) fn assume_role_profiles_from(config: &Sections) -> Vec<AssumeRoleProfile> {
    named_sections(config)
        .filter_map(|(section_name, props)| {
            let role_arn = non_empty(props, keys::ROLE_ARN)?;
            Some(AssumeRoleProfile {
                name: parse_config_section_name(section_name).to_string(),
                parent_name: non_empty(props, keys::SOURCE_PROFILE).unwrap_or_default(),
                role_arn,
                region_name: non_empty(props, keys::REGION),
                output_format: non_empty(props, keys::OUTPUT),
            })
        })
        .collect()
}

/// Finds the config section for `profile_name` in either header form.
pub(crate) fn config_section<'s>(config: &'s Sections, profile_name: &str) -> Option<&'s Properties> {
    config_section_candidates(profile_name)
        .iter()
        .find_map(|candidate| section(config, candidate))
}

fn non_empty(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn flag(props: &Properties, key: &str) -> bool {
    props
        .get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn number<N: TryFrom<i64>>(props: &Properties, key: &str) -> Option<N> {
    let raw = props.get(key)?.trim();
    // Older files may carry fractional seconds.
    let whole = raw
        .parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f.floor() as i64))?;
    N::try_from(whole).ok()
}
