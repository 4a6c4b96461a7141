mod defaults;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use defaults::*;
use poem::http::uri;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uri::Scheme;
use url::Url;

use crate::{MembergateError, Secret};

/// Which field identifies an account at the login form. The two modes are
/// mutually exclusive: the login form renders either a username input or an
/// email input, never both.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
pub enum LoginMode {
    #[serde(rename = "username")]
    Username,
    #[default]
    #[serde(rename = "email")]
    Email,
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct HttpConfig {
    #[serde(default = "_default_http_listen")]
    pub listen: SocketAddr,

    #[serde(default)]
    pub external_port: Option<u16>,

    #[serde(default)]
    pub trust_x_forwarded_headers: bool,

    #[serde(default = "_default_session_max_age", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub session_max_age: Duration,

    #[serde(default = "_default_cookie_max_age", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub cookie_max_age: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen: _default_http_listen(),
            external_port: None,
            trust_x_forwarded_headers: false,
            session_max_age: _default_session_max_age(),
            cookie_max_age: _default_cookie_max_age(),
        }
    }
}

impl HttpConfig {
    pub fn external_port(&self) -> u16 {
        self.external_port.unwrap_or_else(|| self.listen.port())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "_default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub password: Option<Secret<String>>,

    #[serde(default = "_default_true")]
    pub tls: bool,

    pub from_address: String,

    #[serde(default = "_default_sender_name")]
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        SmtpConfig {
            host: "localhost".to_owned(),
            port: _default_smtp_port(),
            username: None,
            password: None,
            tls: true,
            from_address: "noreply@localhost".to_owned(),
            from_name: _default_sender_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct AccountsConfig {
    #[serde(default)]
    pub login_mode: LoginMode,

    /// Service-wide switch for the email two-factor step.
    #[serde(default = "_default_false")]
    pub two_factor: bool,

    #[serde(default = "_default_two_factor_code_ttl", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub two_factor_code_ttl: Duration,

    /// 0 means "use the built-in fallback threshold of 5 attempts".
    #[serde(default = "_default_zero")]
    pub max_login_attempts: u32,

    /// Days after registration before a pending account gets reminded.
    #[serde(default = "_default_remind_days")]
    pub remind_days: u32,

    /// Day offset fed into the deletion-deadline arithmetic.
    #[serde(default = "_default_delete_days")]
    pub delete_days: u32,

    #[serde(default = "_default_delete_code_ttl", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub delete_code_ttl: Duration,

    #[serde(default = "_default_false")]
    pub suppress_deletion_confirmation: bool,

    #[serde(default = "_default_locale")]
    pub default_locale: String,

    #[serde(default)]
    pub redirect_after_login: Option<String>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        AccountsConfig {
            login_mode: <_>::default(),
            two_factor: false,
            two_factor_code_ttl: _default_two_factor_code_ttl(),
            max_login_attempts: 0,
            remind_days: _default_remind_days(),
            delete_days: _default_delete_days(),
            delete_code_ttl: _default_delete_code_ttl(),
            suppress_deletion_confirmation: false,
            default_locale: _default_locale(),
            redirect_after_login: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct MembergateConfigStore {
    #[serde(default)]
    pub external_host: Option<String>,

    #[serde(default = "_default_database_url")]
    #[schemars(with = "String")]
    pub database_url: Secret<String>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub accounts: AccountsConfig,
}

impl Default for MembergateConfigStore {
    fn default() -> Self {
        Self {
            external_host: None,
            database_url: _default_database_url(),
            http: <_>::default(),
            smtp: <_>::default(),
            accounts: <_>::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MembergateConfig {
    pub store: MembergateConfigStore,
    pub paths_relative_to: PathBuf,
}

impl MembergateConfig {
    pub fn external_host_from_config(&self) -> Option<(Scheme, String, Option<u16>)> {
        self.store.external_host.as_ref().map(|external_host| {
            #[allow(clippy::unwrap_used)]
            let external_host = external_host.split(':').next().unwrap();
            (
                Scheme::HTTPS,
                external_host.to_owned(),
                Some(self.store.http.external_port()),
            )
        })
    }

    /// Extract external host:port from request headers
    pub fn external_host_from_request(
        &self,
        request: &poem::Request,
    ) -> Option<(Scheme, String, Option<u16>)> {
        let (mut scheme, mut host, mut port) = (Scheme::HTTPS, None, None);
        let trust_forwarded_headers = self.store.http.trust_x_forwarded_headers;

        // Try the Host header first
        scheme = request.uri().scheme().cloned().unwrap_or(scheme);

        let original_url = request.original_uri();
        if let Some(original_host) = original_url.host() {
            host = Some(original_host.to_string());
            port = original_url.port().map(|x| x.as_u16());
        }

        // But prefer X-Forwarded-* headers if enabled
        if trust_forwarded_headers {
            scheme = request
                .header("x-forwarded-proto")
                .and_then(|x| Scheme::try_from(x).ok())
                .unwrap_or(scheme);

            if let Some(xfh) = request.header("x-forwarded-host") {
                // XFH can contain both host and port
                let parts = xfh.split(':').collect::<Vec<_>>();
                host = parts.first().map(|x| x.to_string()).or(host);
                port = parts.get(1).and_then(|x| x.parse::<u16>().ok());
            }

            port = request
                .header("x-forwarded-port")
                .and_then(|x| x.parse::<u16>().ok())
                .or(port);
        }

        host.map(|host| (scheme, host, port))
    }

    /// Base URL that emailed links are built against.
    pub fn construct_external_url(
        &self,
        for_request: Option<&poem::Request>,
    ) -> Result<Url, MembergateError> {
        let Some((scheme, host, port)) = for_request
            .and_then(|r| self.external_host_from_request(r))
            .or(self.external_host_from_config())
        else {
            return Err(MembergateError::ExternalHostUnknown);
        };

        let mut url = format!("{scheme}://{host}");
        if let Some(port) = port {
            // can't `match` `Scheme`
            if scheme == Scheme::HTTP && port != 80 || scheme == Scheme::HTTPS && port != 443 {
                url = format!("{url}:{port}");
            }
        };
        Url::parse(&url).map_err(MembergateError::UrlParse)
    }

    pub fn validate(&self) {
        if let Some(ref ext) = self.store.external_host {
            if ext.contains(':') {
                warn!("Looks like your `external_host` config option contains a port - it will be ignored.");
                warn!("Set the external port via the `http.external_port` option.");
            }
        }
        if self.store.accounts.remind_days == 0 {
            warn!("`accounts.remind_days` is 0 - pending accounts will be reminded on their first login attempt.");
        }
    }
}
