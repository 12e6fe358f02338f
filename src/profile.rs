use std::collections::BTreeMap;

use awsx_schema::credentials::Credentials;

pub mod load;
pub mod write;

/// Field names used in the three stores.
pub mod keys {
    pub const AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
    pub const AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
    pub const AWS_SESSION_TOKEN: &str = "aws_session_token";

    pub const REGION: &str = "region";
    pub const OUTPUT: &str = "output";
    pub const ROLE_ARN: &str = "role_arn";
    pub const SOURCE_PROFILE: &str = "source_profile";

    pub const PROFILE_NAME: &str = "profileName";
    pub const ACCESS_KEY_ID: &str = "awsAccessKeyId";
    pub const SECRET_ACCESS_KEY: &str = "awsSecretAccessKey";
    pub const DEFAULT_REGION: &str = "awsDefaultRegion";
    pub const OUTPUT_FORMAT: &str = "awsOutputFormat";
    pub const MFA_ENABLED: &str = "mfaEnabled";
    pub const MFA_DEVICE_ARN: &str = "mfaDeviceArn";
    pub const LAST_LOGIN: &str = "lastLoginTimeInSeconds";
    pub const SESSION_LENGTH: &str = "sessionLengthInSeconds";
    pub const KEY_MAX_AGE: &str = "awsAccessKeyMaxAge";
    pub const SECRET_KEY_EXPIRY: &str = "awsSecretAccessKeyExpiry";
}

/// Seconds before the real expiry at which an MFA session stops being reused.
pub const MFA_SESSION_MARGIN_SECS: i64 = 30;
pub const MAX_SESSION_LENGTH_SECS: u32 = 129_600;
pub const DEFAULT_SESSION_LENGTH_SECS: u32 = 3_600;

/// Returns whether a session started at `last_login` is still usable at `now`.
pub fn mfa_session_valid(last_login: i64, session_length: u32, now: i64) -> bool {
    last_login
        .checked_add(i64::from(session_length) - MFA_SESSION_MARGIN_SECS)
        .map_or(false, |end| end > now)
}

/// Checks an MFA session length against the bounds accepted by STS.
pub fn validate_mfa_expiry(session_length: i64) -> Result<(), String> {
    if session_length <= 0 {
        Err("mfaExpiry must be greater than 0".to_string())
    } else if session_length > i64::from(MAX_SESSION_LENGTH_SECS) {
        Err(format!(
            "mfaExpiry must be less than or equal to {}",
            MAX_SESSION_LENGTH_SECS
        ))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MfaSettings {
    pub device_arn: String,
    pub session_length: u32,
    pub last_login: Option<i64>,
    /// Derived when the registry is loaded; never persisted.
    pub session_valid: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ProfileKind {
    Plain,
    Mfa(MfaSettings),
}

/// A plain or MFA-protected profile, merged from the three stores.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Profile {
    pub name: String,
    /// Long-lived keys. For MFA profiles these only mint session tokens.
    pub credentials: Credentials,
    pub region_name: Option<String>,
    pub output_format: Option<String>,
    /// Days; `Some(0)` disables key-age monitoring.
    pub key_max_age: Option<u32>,
    pub secret_key_expiry: Option<i64>,
    pub kind: ProfileKind,
}

impl Profile {
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    pub fn output_format(&self) -> Option<&str> {
        self.output_format.as_deref()
    }

    pub fn mfa(&self) -> Option<&MfaSettings> {
        match &self.kind {
            ProfileKind::Mfa(mfa) => Some(mfa),
            ProfileKind::Plain => None,
        }
    }

    pub fn mfa_enabled(&self) -> bool {
        self.mfa().is_some()
    }

    pub fn mfa_session_valid(&self) -> bool {
        self.mfa().map(|m| m.session_valid).unwrap_or(false)
    }
}

/// A profile that assumes `role_arn` using its parent's identity.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AssumeRoleProfile {
    pub name: String,
    pub parent_name: String,
    pub role_arn: String,
    pub region_name: Option<String>,
    pub output_format: Option<String>,
}

/// Snapshot of every profile. Rebuilt from the stores, never patched in place.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    pub profiles: BTreeMap<String, Profile>,
    pub assume_role_profiles: BTreeMap<String, AssumeRoleProfile>,
}

impl ProfileSet {
    pub fn get_profile(&self, profile_name: &str) -> Option<&Profile> {
        self.profiles.get(profile_name)
    }

    pub fn get_assume_role_profile(&self, profile_name: &str) -> Option<&AssumeRoleProfile> {
        self.assume_role_profiles.get(profile_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn assume_role_profiles(&self) -> impl Iterator<Item = &AssumeRoleProfile> {
        self.assume_role_profiles.values()
    }

    /// Assume-role profiles whose `source_profile` is `parent_name`.
    pub fn children_of<'a>(
        &'a self,
        parent_name: &str,
    ) -> impl Iterator<Item = &'a AssumeRoleProfile> + 'a {
        let parent_name = parent_name.to_string();
        self.assume_role_profiles()
            .filter(move |p| p.parent_name == parent_name)
    }

    /// Whether `name` is taken by either kind of profile.
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name) || self.assume_role_profiles.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
