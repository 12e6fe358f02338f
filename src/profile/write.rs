use awsx_schema::credentials::TemporaryCredentials;
use ini::Properties;
use tracing::{info, warn};

use crate::error::{AwsxError, Result};
use crate::profile::load::{config_section, ProfileRegistry};
use crate::profile::{keys, AssumeRoleProfile, Profile, ProfileKind};
use crate::store::section::{config_section_candidates, config_section_name};
use crate::store::{replace_section, section, ProfileStore, Sections, StoreKind};

struct Change {
    kind: StoreKind,
    original: Sections,
    updated: Sections,
}

impl Change {
    fn new<S: ProfileStore>(store: &S, kind: StoreKind) -> Change {
        let original = store.read_store(kind);
        Change {
            kind,
            updated: original.clone(),
            original,
        }
    }
}

/// Writes every change in order. If one fails, stores already written are put back.
fn commit<S: ProfileStore>(store: &S, changes: Vec<Change>) -> Result<()> {
    for (i, change) in changes.iter().enumerate() {
        if let Err(e) = store.write_store(change.kind, &change.updated) {
            for done in changes.iter().take(i).rev() {
                if let Err(restore) = store.write_store(done.kind, &done.original) {
                    warn!("failed to restore {} store: {}", done.kind, restore);
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Metadata fields derived from a `Profile`. Any other field in the section is kept.
const MANAGED_METADATA: [&str; 11] = [
    keys::PROFILE_NAME,
    keys::ACCESS_KEY_ID,
    keys::SECRET_ACCESS_KEY,
    keys::DEFAULT_REGION,
    keys::OUTPUT_FORMAT,
    keys::MFA_ENABLED,
    keys::MFA_DEVICE_ARN,
    keys::LAST_LOGIN,
    keys::SESSION_LENGTH,
    keys::KEY_MAX_AGE,
    keys::SECRET_KEY_EXPIRY,
];

const MANAGED_CONFIG: [&str; 2] = [keys::REGION, keys::OUTPUT];

fn unmanaged(props: Option<&Properties>, managed: &[&str]) -> Vec<(String, String)> {
    props
        .map(|props| {
            props
                .iter()
                .filter(|(key, _)| !managed.contains(key))
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Like `replace_section`, then restores `kept` verbatim, empty values included.
fn rewrite_section<'a, I>(
    sections: &mut Sections,
    name: &str,
    kept: Vec<(String, String)>,
    entries: I,
) where
    I: IntoIterator<Item = (&'a str, Option<String>)>,
{
    replace_section(sections, name, entries);
    for (key, value) in kept {
        sections.set_to(Some(name), key, value);
    }
}

fn metadata_entries(profile: &Profile) -> Option<Vec<(&'static str, Option<String>)>> {
    let common = vec![
        (keys::PROFILE_NAME, Some(profile.name.clone())),
        (keys::KEY_MAX_AGE, profile.key_max_age.map(|d| d.to_string())),
        (
            keys::SECRET_KEY_EXPIRY,
            profile.secret_key_expiry.map(|d| d.to_string()),
        ),
    ];

    match &profile.kind {
        ProfileKind::Mfa(mfa) => {
            let mut entries = common;
            entries.extend([
                (keys::ACCESS_KEY_ID, Some(profile.credentials.key.clone())),
                (keys::SECRET_ACCESS_KEY, Some(profile.credentials.secret.clone())),
                (keys::DEFAULT_REGION, profile.region_name.clone()),
                (keys::OUTPUT_FORMAT, profile.output_format.clone()),
                (keys::MFA_ENABLED, Some("true".to_string())),
                (keys::MFA_DEVICE_ARN, Some(mfa.device_arn.clone())),
                (keys::SESSION_LENGTH, Some(mfa.session_length.to_string())),
                (keys::LAST_LOGIN, mfa.last_login.map(|t| t.to_string())),
            ]);
            Some(entries)
        }
        ProfileKind::Plain if profile.key_max_age.is_some() || profile.secret_key_expiry.is_some() => {
            let mut entries = common;
            entries.push((keys::MFA_ENABLED, Some("false".to_string())));
            Some(entries)
        }
        ProfileKind::Plain => None,
    }
}

fn remove_config_sections(config: &mut Sections, profile_name: &str) {
    for candidate in config_section_candidates(profile_name) {
        config.delete(Some(candidate.as_str()));
    }
}

/// Adds a new plain or MFA profile. Fails if the name is already taken.
pub fn add_profile<S: ProfileStore>(store: &S, profile: &Profile, now: i64) -> Result<()> {
    let existing = ProfileRegistry::new(store).load(now);
    if existing.contains(&profile.name) {
        return Err(AwsxError::ProfileNameCollision(profile.name.clone()));
    }

    save_profile(store, profile)?;
    info!("added profile {}", profile.name);
    Ok(())
}

/// Writes `profile` across all three stores. Fields awsx does not manage are kept.
///
/// The credentials file receives the long-lived keys; for MFA profiles those are
/// swapped for session keys on the next login.
pub fn save_profile<S: ProfileStore>(store: &S, profile: &Profile) -> Result<()> {
    let mut metadata = Change::new(store, StoreKind::Metadata);
    let kept = unmanaged(section(&metadata.updated, &profile.name), &MANAGED_METADATA);
    match metadata_entries(profile) {
        None if kept.is_empty() => {
            metadata.updated.delete(Some(profile.name.as_str()));
        }
        entries => rewrite_section(
            &mut metadata.updated,
            &profile.name,
            kept,
            entries.unwrap_or_default(),
        ),
    }

    let mut config = Change::new(store, StoreKind::AwsConfig);
    let kept = unmanaged(config_section(&config.updated, &profile.name), &MANAGED_CONFIG);
    remove_config_sections(&mut config.updated, &profile.name);
    rewrite_section(
        &mut config.updated,
        &config_section_name(&profile.name),
        kept,
        [
            (keys::REGION, profile.region_name.clone()),
            (keys::OUTPUT, profile.output_format.clone()),
        ],
    );

    let mut credentials = Change::new(store, StoreKind::AwsCredentials);
    replace_section(
        &mut credentials.updated,
        &profile.name,
        [
            (keys::AWS_ACCESS_KEY_ID, Some(profile.credentials.key.clone())),
            (keys::AWS_SECRET_ACCESS_KEY, Some(profile.credentials.secret.clone())),
        ],
    );

    commit(store, vec![metadata, config, credentials])
}

/// Removes a plain or MFA profile from every store.
pub fn delete_profile<S: ProfileStore>(store: &S, profile_name: &str) -> Result<()> {
    let mut metadata = Change::new(store, StoreKind::Metadata);
    metadata.updated.delete(Some(profile_name));

    let mut config = Change::new(store, StoreKind::AwsConfig);
    remove_config_sections(&mut config.updated, profile_name);

    let mut credentials = Change::new(store, StoreKind::AwsCredentials);
    credentials.updated.delete(Some(profile_name));

    commit(store, vec![metadata, config, credentials])?;
    info!("removed profile {}", profile_name);
    Ok(())
}

/// Persists a successful MFA login: the session keys and the login time.
///
/// Both stores are written or neither is.
pub fn record_mfa_login<S: ProfileStore>(
    store: &S,
    temporary: &TemporaryCredentials,
    now: i64,
) -> Result<()> {
    let name = temporary.profile_name.as_str();

    let mut metadata = Change::new(store, StoreKind::Metadata);
    if section(&metadata.updated, name).is_none() {
        return Err(AwsxError::ProfileNotFound(name.to_string()));
    }
    metadata
        .updated
        .set_to(Some(name), keys::LAST_LOGIN.to_string(), now.to_string());

    let mut credentials = Change::new(store, StoreKind::AwsCredentials);
    let creds = &temporary.credentials;
    replace_section(
        &mut credentials.updated,
        name,
        [
            (keys::AWS_ACCESS_KEY_ID, Some(creds.key.clone())),
            (keys::AWS_SECRET_ACCESS_KEY, Some(creds.secret.clone())),
            (keys::AWS_SESSION_TOKEN, creds.token.clone()),
        ],
    );

    commit(store, vec![credentials, metadata])?;
    info!("stored new session credentials for {}", name);
    Ok(())
}

/// Sets the access key maximum age (days, `0` disables monitoring).
pub fn set_key_max_age<S: ProfileStore>(store: &S, profile_name: &str, days: u32) -> Result<()> {
    let mut metadata = Change::new(store, StoreKind::Metadata);
    if section(&metadata.updated, profile_name).is_none() {
        replace_section(
            &mut metadata.updated,
            profile_name,
            [
                (keys::PROFILE_NAME, Some(profile_name.to_string())),
                (keys::MFA_ENABLED, Some("false".to_string())),
            ],
        );
    }
    metadata.updated.set_to(
        Some(profile_name),
        keys::KEY_MAX_AGE.to_string(),
        days.to_string(),
    );

    commit(store, vec![metadata])?;
    info!("set key max age of {} to {} days", profile_name, days);
    Ok(())
}

/// Adds an assume-role profile under an existing parent.
pub fn add_assume_role_profile<S: ProfileStore>(
    store: &S,
    profile: &AssumeRoleProfile,
    now: i64,
) -> Result<()> {
    let existing = ProfileRegistry::new(store).load(now);
    if existing.contains(&profile.name) {
        return Err(AwsxError::ProfileNameCollision(profile.name.clone()));
    }
    if existing.get_profile(&profile.parent_name).is_none() {
        return Err(AwsxError::ProfileNotFound(profile.parent_name.clone()));
    }

    let mut config = Change::new(store, StoreKind::AwsConfig);
    replace_section(
        &mut config.updated,
        &config_section_name(&profile.name),
        [
            (keys::ROLE_ARN, Some(profile.role_arn.clone())),
            (keys::SOURCE_PROFILE, Some(profile.parent_name.clone())),
            (keys::REGION, profile.region_name.clone()),
            (keys::OUTPUT, profile.output_format.clone()),
        ],
    );

    commit(store, vec![config])?;
    info!(
        "added assume role profile {} under {}",
        profile.name, profile.parent_name
    );
    Ok(())
}

/// Removes an assume-role profile. Returns whether anything was removed.
pub fn delete_assume_role_profile<S: ProfileStore>(store: &S, profile_name: &str) -> Result<bool> {
    let mut config = Change::new(store, StoreKind::AwsConfig);
    let mut removed = false;
    for candidate in config_section_candidates(profile_name) {
        let is_role = section(&config.updated, &candidate)
            .map(|props| props.contains_key(keys::ROLE_ARN))
            .unwrap_or(false);
        if is_role {
            config.updated.delete(Some(candidate.as_str()));
            removed = true;
        }
    }

    if removed {
        commit(store, vec![config])?;
        info!("removed assume role profile {}", profile_name);
    }
    Ok(removed)
}
