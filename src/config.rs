use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

/// Which total to grade against when an attempt is finished.
///
/// `Snapshot` uses the total captured when the attempt was started;
/// `Recompute` sums the points of the questions currently linked to the
/// assessment. The two disagree when questions are edited mid-attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePolicy {
    SnapshotAtStart,
    RecomputeAtFinish,
}

impl std::str::FromStr for ScorePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "snapshot" => Ok(ScorePolicy::SnapshotAtStart),
            "recompute" => Ok(ScorePolicy::RecomputeAtFinish),
            other => Err(format!(
                "expected 'snapshot' or 'recompute', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub mail_gateway_url: Option<String>,
    pub score_policy: ScorePolicy,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_expires_hours: get_env_or_parse("JWT_ACCESS_EXPIRES_HOURS", 24)?,
            mail_gateway_url: env::var("MAIL_GATEWAY_URL").ok(),
            score_policy: get_env_or_parse("SCORE_TOTAL_POLICY", ScorePolicy::SnapshotAtStart)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
