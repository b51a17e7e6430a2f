use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub frontend_url: String,
    pub log_level: String,
    pub verification_ttl: chrono::Duration,
    pub reset_ttl: chrono::Duration,
    pub sweep_interval: Duration,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("GYMPRO_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid GYMPRO_HOST: {e}"))?;

        let port: u16 = env_or("GYMPRO_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid GYMPRO_PORT: {e}"))?;

        let frontend_url = env_or("GYMPRO_FRONTEND_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let log_level = env_or("GYMPRO_LOG_LEVEL", "info");

        let verification_ttl = chrono::Duration::minutes(env_parse(
            "GYMPRO_VERIFICATION_TTL_MINUTES",
            "1440",
        )?);
        let reset_ttl = chrono::Duration::minutes(env_parse("GYMPRO_RESET_TTL_MINUTES", "60")?);
        let sweep_interval = Duration::from_secs(env_parse("GYMPRO_SWEEP_INTERVAL_SECS", "300")?);

        let smtp = match (
            std::env::var("GYMPRO_SMTP_HOST").ok(),
            std::env::var("GYMPRO_SMTP_PORT").ok(),
            std::env::var("GYMPRO_SMTP_USER").ok(),
            std::env::var("GYMPRO_SMTP_PASS").ok(),
            std::env::var("GYMPRO_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid GYMPRO_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            frontend_url,
            log_level,
            verification_ttl,
            reset_ttl,
            sweep_interval,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))
}
