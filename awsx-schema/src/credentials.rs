/// A set of AWS keys. `token` is only present for session credentials.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
    pub token: Option<String>,
}

impl Credentials {
    pub fn new<K: Into<String>, S: Into<String>>(key: K, secret: S) -> Credentials {
        Credentials {
            key: key.into(),
            secret: secret.into(),
            token: None,
        }
    }

    pub fn with_token<T: Into<String>>(mut self, token: T) -> Credentials {
        self.token = Some(token.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_session(&self) -> bool {
        self.token.is_some()
    }
}

/// Session credentials minted for a profile, as stored in the AWS credentials file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TemporaryCredentials {
    pub profile_name: String,
    pub credentials: Credentials,
}

impl TemporaryCredentials {
    pub fn new<S: Into<String>>(profile_name: S, credentials: Credentials) -> TemporaryCredentials {
        TemporaryCredentials {
            profile_name: profile_name.into(),
            credentials,
        }
    }
}
