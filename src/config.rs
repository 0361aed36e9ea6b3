use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

pub const STORED_FILE_NAME: &str = "uploaded_file.csv";

/// Browser front end for plotting CSV data logs.
#[derive(Debug, Clone, Parser)]
#[command(name = "logplot", version)]
pub struct Config {
    /// Address to bind; defaults to this machine's local network address
    #[arg(long, env = "LOGPLOT_HOST")]
    pub host: Option<IpAddr>,

    #[arg(long, env = "LOGPLOT_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding the most recently uploaded CSV
    #[arg(long, env = "LOGPLOT_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Header of the timestamp column
    #[arg(long, env = "LOGPLOT_TIME_COLUMN", default_value = "Time")]
    pub time_column: String,

    /// Rows shown in the preview table, 0 for all
    #[arg(long, env = "LOGPLOT_MAX_TABLE_ROWS", default_value_t = 1000)]
    pub max_table_rows: usize,

    #[arg(long, env = "LOGPLOT_MAX_UPLOAD_MB", default_value_t = 64)]
    pub max_upload_mb: usize,

    /// Plot known columns and ignore unknown ones instead of rejecting the request
    #[arg(long)]
    pub lenient_columns: bool,

    /// Serve without opening the launcher window
    #[arg(long)]
    pub headless: bool,
}

impl Config {
    pub fn stored_file(&self) -> PathBuf {
        self.upload_dir.join(STORED_FILE_NAME)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            time_column: "Time".to_string(),
            max_table_rows: 1000,
            max_upload_mb: 64,
            lenient_columns: false,
            headless: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parser() {
        let parsed = Config::try_parse_from(["logplot"]).unwrap();
        let default = Config::default();
        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.upload_dir, default.upload_dir);
        assert_eq!(parsed.time_column, default.time_column);
        assert_eq!(parsed.max_table_rows, default.max_table_rows);
        assert!(!parsed.lenient_columns);
    }

    #[test]
    fn flags() {
        let parsed = Config::try_parse_from([
            "logplot",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--lenient-columns",
            "--headless",
        ])
        .unwrap();
        assert_eq!(parsed.port, 8080);
        assert_eq!(parsed.host, Some("127.0.0.1".parse().unwrap()));
        assert!(parsed.lenient_columns && parsed.headless);
        assert_eq!(parsed.stored_file(), PathBuf::from("uploads/uploaded_file.csv"));
    }
}
