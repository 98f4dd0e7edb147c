//! Config file loading.

use std::path::Path;

use anyhow::Context;
use spool_core::SpoolConfig;

/// Load `SpoolConfig` from a TOML file, or defaults when no file is given.
pub fn load(path: Option<&Path>) -> anyhow::Result<SpoolConfig> {
    let Some(path) = path else {
        return Ok(SpoolConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid config file {}", path.display()))
}

pub fn parse(text: &str) -> anyhow::Result<SpoolConfig> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(load(None).unwrap(), SpoolConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse(
            r#"
            db_path = "/var/lib/spool/queue.sqlite"

            [worker]
            poll_interval_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/spool/queue.sqlite"));
        assert_eq!(config.worker.poll_interval_ms, 50);

        let config = parse("[worker]\npoll_interval_ms = 5\n").unwrap();
        assert_eq!(config.db_path, SpoolConfig::default().db_path);
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_path = \"other.sqlite\"").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.db_path, PathBuf::from("other.sqlite"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(parse("[worker]\npoll_interval_ms = \"soon\"\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
