//! Page fetching for the scraping pipeline.
//!
//! Downloads are simulated: `FsFetcher` serves pages from files saved under a
//! root directory, one file per locator.

use std::path::PathBuf;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no saved page for {locator} (expected {})", path.display())]
    Missing { locator: String, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, locator: &str) -> PathBuf {
        self.root.join(page_file_name(locator))
    }
}

#[async_trait]
impl Fetcher for FsFetcher {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        let path = self.path_for(locator);
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(html),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::Missing {
                    locator: locator.to_string(),
                    path,
                })
            }
            Err(source) => Err(FetchError::Io { path, source }),
        }
    }
}

/// File name a locator is saved under.
///
/// `https://www.imdb.com/title/tt0111161/` → `www.imdb.com_title_tt0111161.html`
pub fn page_file_name(locator: &str) -> String {
    let rest = locator
        .split_once("://")
        .map_or(locator, |(_, rest)| rest);

    let mut name = String::with_capacity(rest.len() + 5);
    for c in rest.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c
        } else {
            '_'
        };
        // collapse runs
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }

    let trimmed = name.trim_matches('_');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{trimmed}.html")
    }
}
