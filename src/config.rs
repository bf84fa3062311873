use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    pub static_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: env::var("DEEDBOOK_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("DEEDBOOK_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7070),
            database_path: env::var("DEEDBOOK_DATABASE_URL")
                .map(|v| parse_database_url(&v))
                .unwrap_or_else(|_| PathBuf::from("data/deedbook.db")),
            migrations_path: env::var("DEEDBOOK_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("migrations")),
            static_path: env::var("DEEDBOOK_STATIC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts `sqlite://path`, `sqlite:path` or a bare path.
fn parse_database_url(value: &str) -> PathBuf {
    PathBuf::from(
        value
            .strip_prefix("sqlite://")
            .or_else(|| value.strip_prefix("sqlite:"))
            .unwrap_or(value),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_prefixes() {
        assert_eq!(
            parse_database_url("sqlite://data/x.db"),
            PathBuf::from("data/x.db")
        );
        assert_eq!(parse_database_url("sqlite:x.db"), PathBuf::from("x.db"));
        assert_eq!(parse_database_url("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_address() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 8080,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            static_path: PathBuf::from("static"),
        };
        assert_eq!(config.address(), "127.0.0.1:8080");
    }
}
