use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use awsx_schema::credentials::Credentials;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod aws_sdk;

pub mod defaults {
    use std::time::Duration;

    /// Identity and IAM lookups race this timeout; losing means "no information".
    pub const IDENTITY_TIMEOUT: Duration = Duration::from_millis(1500);
    pub const SESSION_TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
    /// STS and IAM are global; any region works when the profile has none.
    pub const REGION: &str = "us-east-1";
}

/// Whose identity an AWS call runs under.
#[derive(Debug, Clone, Copy)]
pub enum Identity<'a> {
    /// Explicit keys, as stored in a profile.
    Keys {
        credentials: &'a Credentials,
        region: Option<&'a str>,
    },
    /// A named profile resolved by the AWS SDK itself, including role assumption.
    Profile(&'a str),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SessionTokenRequest {
    pub duration_seconds: u32,
    pub serial_number: String,
    pub token_code: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AccessKeyInfo {
    pub access_key_id: String,
    pub create_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait Sts {
    /// Exchanges long-lived keys plus an MFA code for session credentials.
    async fn mint_session_token(
        &self,
        base: &Credentials,
        region: Option<&str>,
        request: SessionTokenRequest,
    ) -> anyhow::Result<Credentials>;

    async fn get_caller_identity(&self, identity: Identity<'_>) -> anyhow::Result<CallerIdentity>;
}

#[async_trait]
pub trait Iam {
    async fn list_access_keys_for_user(
        &self,
        identity: Identity<'_>,
        user_name: &str,
    ) -> anyhow::Result<Vec<AccessKeyInfo>>;

    async fn list_account_aliases(&self, identity: Identity<'_>) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
impl<T: Sts + Sync + ?Sized> Sts for &T {
    async fn mint_session_token(
        &self,
        base: &Credentials,
        region: Option<&str>,
        request: SessionTokenRequest,
    ) -> anyhow::Result<Credentials> {
        (**self).mint_session_token(base, region, request).await
    }

    async fn get_caller_identity(&self, identity: Identity<'_>) -> anyhow::Result<CallerIdentity> {
        (**self).get_caller_identity(identity).await
    }
}

#[async_trait]
impl<T: Iam + Sync + ?Sized> Iam for &T {
    async fn list_access_keys_for_user(
        &self,
        identity: Identity<'_>,
        user_name: &str,
    ) -> anyhow::Result<Vec<AccessKeyInfo>> {
        (**self).list_access_keys_for_user(identity, user_name).await
    }

    async fn list_account_aliases(&self, identity: Identity<'_>) -> anyhow::Result<Vec<String>> {
        (**self).list_account_aliases(identity).await
    }
}

/// Runs `future`, failing if it takes longer than `limit`.
pub async fn bounded<T, F>(limit: Duration, future: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("timed out after {}ms", limit.as_millis())),
    }
}

/// `arn:aws:iam::123:user/path/name` -> `name`.
pub fn user_name_from_arn(arn: &str) -> Option<&str> {
    let (_, resource) = arn.split_once(":user/")?;
    resource.rsplit('/').next().filter(|n| !n.is_empty())
}

/// `arn:aws:sts::123:assumed-role/role-name/session` -> `role-name`.
pub fn assumed_role(arn: &str) -> Option<&str> {
    arn.split('/').nth(1)
}

/// Looks up when the IAM user behind `identity` created `access_key_id`.
pub async fn access_key_created_at<A>(
    aws: &A,
    identity: Identity<'_>,
    access_key_id: &str,
) -> anyhow::Result<Option<DateTime<Utc>>>
where
    A: Sts + Iam + Sync,
{
    let caller = aws.get_caller_identity(identity).await?;
    let arn = caller
        .arn
        .ok_or_else(|| anyhow::anyhow!("caller identity has no ARN"))?;
    let user_name = user_name_from_arn(&arn)
        .ok_or_else(|| anyhow::anyhow!("{} is not an IAM user", arn))?;

    let keys = aws.list_access_keys_for_user(identity, user_name).await?;
    Ok(keys
        .into_iter()
        .find(|k| k.access_key_id == access_key_id)
        .and_then(|k| k.create_date))
}
