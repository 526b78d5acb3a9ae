use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::config::AppConfig;

/// Supplies the bearer token attached to every request. `None` means the
/// request goes out unauthenticated and the server decides what to do.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token fixed at start-up (config file or `BEEHIVE_TOKEN`).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|token| !token.trim().is_empty()))
    }
}

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Modification time and size of the token file when it was last read.
type Stamp = (SystemTime, u64);

#[derive(Debug)]
struct CachedToken {
    stamp: Stamp,
    token: Option<String>,
}

/// Token kept in a file by the session provider. The file is only re-read
/// when its modification time or size changes, so a rotated token is picked
/// up without a restart and without reading the file on every request.
#[derive(Debug)]
pub struct TokenFile {
    path: PathBuf,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    fn stamp(&self) -> std::io::Result<Stamp> {
        let metadata = fs::metadata(&self.path)?;
        Ok((metadata.modified()?, metadata.len()))
    }

    fn read(&self) -> std::io::Result<Option<String>> {
        let content = fs::read_to_string(&self.path)?;
        let token = content.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn unreadable(&self, err: std::io::Error) -> Option<String> {
        log::warn!(
            "Cannot read token file {} ({err}); sending unauthenticated",
            self.path.display()
        );
        None
    }
}

impl TokenSource for TokenFile {
    fn bearer_token(&self) -> Option<String> {
        let stamp = match self.stamp() {
            Ok(stamp) => stamp,
            Err(err) => return self.unreadable(err),
        };
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = cache.as_ref().filter(|cached| cached.stamp == stamp) {
            return cached.token.clone();
        }

        let token = match self.read() {
            Ok(token) => token,
            Err(err) => return self.unreadable(err),
        };
        log::debug!("Loaded bearer token from {}", self.path.display());
        *cache = Some(CachedToken {
            stamp,
            token: token.clone(),
        });
        token
    }
}

/// A token file takes precedence over an inline token.
pub fn token_source(config: &AppConfig) -> Arc<dyn TokenSource> {
    match &config.token_file {
        Some(path) => Arc::new(TokenFile::new(path)),
        None => Arc::new(StaticToken::new(config.token.clone())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn blank_static_token_is_absent() {
        assert_eq!(StaticToken::new(Some("  ".into())).bearer_token(), None);
        assert_eq!(
            StaticToken::new(Some("abc".into())).bearer_token().as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn rotated_token_file_is_picked_up() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first-token").unwrap();
        let source = TokenFile::new(file.path());
        assert_eq!(source.bearer_token().as_deref(), Some("first-token"));

        fs::write(file.path(), "rotated-longer-token\n").unwrap();
        assert_eq!(
            source.bearer_token().as_deref(),
            Some("rotated-longer-token")
        );
    }

    #[test]
    fn unchanged_token_file_is_served_from_cache() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "cached-token").unwrap();
        let source = TokenFile::new(file.path());
        assert_eq!(source.bearer_token().as_deref(), Some("cached-token"));

        let stamp = source.stamp().unwrap();
        assert_eq!(
            source.cache.lock().unwrap().as_ref().map(|cached| cached.stamp),
            Some(stamp)
        );
        assert_eq!(source.bearer_token().as_deref(), Some("cached-token"));
    }

    #[test]
    fn removed_token_file_stops_sending_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "short-lived").unwrap();
        let source = TokenFile::new(&path);
        assert_eq!(source.bearer_token().as_deref(), Some("short-lived"));

        fs::remove_file(&path).unwrap();
        assert_eq!(source.bearer_token(), None);
    }

    #[test]
    fn missing_token_file_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = TokenFile::new(dir.path().join("absent"));
        assert_eq!(source.bearer_token(), None);
    }

    #[test]
    fn file_wins_over_inline_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from-file").unwrap();
        let config = AppConfig {
            token: Some("inline".into()),
            token_file: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };
        assert_eq!(
            token_source(&config).bearer_token().as_deref(),
            Some("from-file")
        );
    }
}
