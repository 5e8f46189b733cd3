use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ApplicationError;

/// Outgoing mail relay, present only when SMTP_HOST is configured
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Requests per minute per client on the public auth endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub login_per_minute: u32,
    pub check_session_per_minute: u32,
    pub reset_request_per_minute: u32,
    pub reset_verify_per_minute: u32,
    pub reset_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            login_per_minute: 10,
            check_session_per_minute: 20,
            reset_request_per_minute: 5,
            reset_verify_per_minute: 10,
            reset_per_minute: 5,
        }
    }
}

/// Startup settings for infrastructure and collaborators
pub struct BootstrapSettings {
    database_url: String,
    server_host: String,
    server_port: u16,
    storage_dir: PathBuf,
    storage_public_url: String,
    jwt_ttl_minutes: u32,
    otp_ttl_minutes: u32,
    mail_from: String,
    smtp: Option<SmtpSettings>,
    cors_allowed_origins: Vec<String>,
    trust_proxy_headers: bool,
    rate_limits: RateLimitSettings,
}

impl BootstrapSettings {
    /// Load settings from the given environment provider using ConfigSpec
    pub fn from_env_provider(
        env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    ) -> Result<Self, ApplicationError> {
        let spec = |name: &str| ConfigSpec::new(env_provider.clone()).env_override(name);

        let database_url = spec("DATABASE_URL")
            .default_value("sqlite://orgchart.db?mode=rwc")
            .min_length(1)
            .load()?;

        let server_host = spec("HOST")
            .default_value("0.0.0.0")
            .validator(ConfigSpec::validate_host_address)
            .load()?;

        let server_port = ConfigSpec::parse_port(&spec("PORT").default_value("3000").load()?, "PORT")?;

        let storage_dir = PathBuf::from(spec("STORAGE_DIR").default_value("storage").min_length(1).load()?);

        let storage_public_url = spec("STORAGE_PUBLIC_URL").default_value("/storage").load()?;

        let jwt_ttl_minutes = ConfigSpec::parse_positive(
            &spec("JWT_TTL_MINUTES").default_value("1440").load()?,
            "JWT_TTL_MINUTES",
        )?;

        let otp_ttl_minutes = ConfigSpec::parse_positive(
            &spec("OTP_TTL_MINUTES").default_value("10").load()?,
            "OTP_TTL_MINUTES",
        )?;

        let mail_from = spec("MAIL_FROM").default_value("no-reply@localhost").load()?;

        let smtp = match spec("SMTP_HOST").load_optional()? {
            Some(host) if !host.trim().is_empty() => Some(SmtpSettings {
                host,
                port: ConfigSpec::parse_port(&spec("SMTP_PORT").default_value("587").load()?, "SMTP_PORT")?,
                username: spec("SMTP_USERNAME").load_optional()?,
                password: spec("SMTP_PASSWORD").load_optional()?,
            }),
            _ => None,
        };

        let cors_allowed_origins = spec("CORS_ALLOWED_ORIGINS")
            .load()?
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let trust_proxy_headers = ConfigSpec::parse_bool(
            &spec("TRUST_PROXY_HEADERS").default_value("false").load()?,
            "TRUST_PROXY_HEADERS",
        )?;

        let defaults = RateLimitSettings::default();
        let limit = |name: &str, default: u32| -> Result<u32, ApplicationError> {
            match spec(name).load_optional()? {
                Some(value) => ConfigSpec::parse_positive(&value, name),
                None => Ok(default),
            }
        };
        let rate_limits = RateLimitSettings {
            login_per_minute: limit("RATE_LIMIT_LOGIN", defaults.login_per_minute)?,
            check_session_per_minute: limit("RATE_LIMIT_CHECK_SESSION", defaults.check_session_per_minute)?,
            reset_request_per_minute: limit("RATE_LIMIT_RESET_REQUEST", defaults.reset_request_per_minute)?,
            reset_verify_per_minute: limit("RATE_LIMIT_RESET_VERIFY", defaults.reset_verify_per_minute)?,
            reset_per_minute: limit("RATE_LIMIT_RESET", defaults.reset_per_minute)?,
        };

        Ok(Self {
            database_url,
            server_host,
            server_port,
            storage_dir,
            storage_public_url,
            jwt_ttl_minutes,
            otp_ttl_minutes,
            mail_from,
            smtp,
            cors_allowed_origins,
            trust_proxy_headers,
            rate_limits,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ApplicationError> {
        use crate::config::SystemEnvironment;
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn server_host(&self) -> &str {
        &self.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    pub fn storage_public_url(&self) -> &str {
        &self.storage_public_url
    }

    pub fn jwt_ttl_minutes(&self) -> u32 {
        self.jwt_ttl_minutes
    }

    pub fn otp_ttl_minutes(&self) -> u32 {
        self.otp_ttl_minutes
    }

    pub fn mail_from(&self) -> &str {
        &self.mail_from
    }

    pub fn smtp(&self) -> Option<&SmtpSettings> {
        self.smtp.as_ref()
    }

    pub fn cors_allowed_origins(&self) -> &[String] {
        &self.cors_allowed_origins
    }

    /// Whether X-Forwarded-For / X-Real-IP identify the client
    ///
    /// Only enable behind a reverse proxy that overwrites these headers.
    pub fn trust_proxy_headers(&self) -> bool {
        self.trust_proxy_headers
    }

    pub fn rate_limits(&self) -> RateLimitSettings {
        self.rate_limits
    }
}

impl fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("database_url", &self.database_url)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("storage_dir", &self.storage_dir)
            .field("jwt_ttl_minutes", &self.jwt_ttl_minutes)
            .field("otp_ttl_minutes", &self.otp_ttl_minutes)
            .field("smtp", &self.smtp)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .finish()
    }
}
