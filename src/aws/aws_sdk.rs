use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_types::region::Region;
use awsx_schema::credentials::Credentials;
use chrono::DateTime;
use tracing::debug;

use crate::aws::{
    defaults, AccessKeyInfo, CallerIdentity, Iam, Identity, SessionTokenRequest, Sts,
};

const PROVIDER_NAME: &str = "awsx";

/// STS and IAM through the AWS SDK for Rust.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsSdkClient;

async fn sdk_config(identity: Identity<'_>) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    match identity {
        Identity::Keys {
            credentials,
            region,
        } => {
            let provider = aws_sdk_sts::config::Credentials::new(
                credentials.key(),
                credentials.secret(),
                credentials.token().map(|t| t.to_string()),
                None,
                PROVIDER_NAME,
            );
            let region = region.unwrap_or(defaults::REGION).to_string();
            loader
                .credentials_provider(provider)
                .region(Region::new(region))
                .load()
                .await
        }
        Identity::Profile(name) => {
            let config = loader.profile_name(name).load().await;
            if config.region().is_some() {
                config
            } else {
                debug!("no region configured for {}, using {}", name, defaults::REGION);
                aws_config::defaults(BehaviorVersion::latest())
                    .profile_name(name)
                    .region(Region::new(defaults::REGION))
                    .load()
                    .await
            }
        }
    }
}

#[async_trait]
impl Sts for AwsSdkClient {
    async fn mint_session_token(
        &self,
        base: &Credentials,
        region: Option<&str>,
        request: SessionTokenRequest,
    ) -> anyhow::Result<Credentials> {
        let config = sdk_config(Identity::Keys {
            credentials: base,
            region,
        })
        .await;
        let client = aws_sdk_sts::Client::new(&config);

        let output = client
            .get_session_token()
            .duration_seconds(i32::try_from(request.duration_seconds)?)
            .serial_number(request.serial_number)
            .token_code(request.token_code)
            .send()
            .await
            .context("get-session-token failed")?;

        let creds = output
            .credentials()
            .ok_or_else(|| anyhow::anyhow!("get-session-token didn't return a credential"))?;

        Ok(Credentials::new(creds.access_key_id(), creds.secret_access_key())
            .with_token(creds.session_token()))
    }

    async fn get_caller_identity(&self, identity: Identity<'_>) -> anyhow::Result<CallerIdentity> {
        let config = sdk_config(identity).await;
        let output = aws_sdk_sts::Client::new(&config)
            .get_caller_identity()
            .send()
            .await
            .context("get-caller-identity failed")?;

        Ok(CallerIdentity {
            account: output.account().map(|s| s.to_string()),
            arn: output.arn().map(|s| s.to_string()),
            user_id: output.user_id().map(|s| s.to_string()),
        })
    }
}

#[async_trait]
impl Iam for AwsSdkClient {
    async fn list_access_keys_for_user(
        &self,
        identity: Identity<'_>,
        user_name: &str,
    ) -> anyhow::Result<Vec<AccessKeyInfo>> {
        let config = sdk_config(identity).await;
        let output = aws_sdk_iam::Client::new(&config)
            .list_access_keys()
            .user_name(user_name)
            .send()
            .await
            .context("list-access-keys failed")?;

        Ok(output
            .access_key_metadata()
            .iter()
            .filter_map(|meta| {
                let access_key_id = meta.access_key_id()?.to_string();
                let create_date = meta
                    .create_date()
                    .and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()));
                Some(AccessKeyInfo {
                    access_key_id,
                    create_date,
                })
            })
            .collect())
    }

    async fn list_account_aliases(&self, identity: Identity<'_>) -> anyhow::Result<Vec<String>> {
        let config = sdk_config(identity).await;
        let output = aws_sdk_iam::Client::new(&config)
            .list_account_aliases()
            .send()
            .await
            .context("list-account-aliases failed")?;

        Ok(output.account_aliases().to_vec())
    }
}
