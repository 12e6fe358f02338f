use awsx_schema::credentials::Credentials;

pub mod script;
pub mod shell;

pub struct HandleCredentialsRequest<'a> {
    pub profile_name: &'a str,
    pub region_name: Option<&'a str>,
    pub output_format: Option<&'a str>,
    /// Key material to export. `None` leaves resolution to the AWS CLI via `AWS_PROFILE`.
    pub credentials: Option<&'a Credentials>,
}

pub trait HandleCredentials {
    fn handle_credentials(&self, request: HandleCredentialsRequest) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Variable<'a> {
    pub name: &'static str,
    pub value: Option<&'a str>,
}

/// Every variable the broker manages. A `None` value must be unset so a
/// previous switch never leaks into the next one.
pub fn into_variables(request: HandleCredentialsRequest) -> Vec<Variable> {
    fn v<'a>(name: &'static str, value: Option<&'a str>) -> Variable<'a> {
        Variable { name, value }
    }

    let credentials = request.credentials;
    vec![
        v("AWS_PROFILE", Some(request.profile_name)),
        v("AWS_ACCESS_KEY_ID", credentials.map(|c| c.key())),
        v("AWS_SECRET_ACCESS_KEY", credentials.map(|c| c.secret())),
        v("AWS_SESSION_TOKEN", credentials.and_then(|c| c.token())),
        v("AWS_DEFAULT_REGION", request.region_name),
        v("AWS_DEFAULT_OUTPUT", request.output_format),
    ]
}
