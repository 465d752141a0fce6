pub mod check;
pub mod config_cmd;
pub mod run;
pub mod similarity;

use std::path::Path;

use chatsieve_config::AppConfig;
use chatsieve_core::Error;

/// Load from `--config` / `CHATSIEVE_CONFIG` when given, else the default path.
pub fn load_config(path: Option<&Path>) -> chatsieve_core::Result<AppConfig> {
    let loaded = match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    loaded.map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingest]\nbatch_size = 5").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.ingest.batch_size, 5);
    }

    #[test]
    fn bad_file_becomes_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[filter\nmax_emotes = ").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().starts_with("Configuration error:"), "{err}");
    }
}
