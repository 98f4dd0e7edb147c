//! Web scraping パイプライン
//!
//! ScrapeGenres（ジャンル一覧）
//!   → ScrapeGenrePage（ジャンルごとの検索結果、ページ送りあり）
//!     → ScrapeMovie（作品ページからタイトルを取り出す）
//!
//! 各コマンドは自分の後続を Outcome で返すだけで、キューには触らない。

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use spool_core::{
    AppBuilder, Command, CommandContext, CommandError, Handler, Outcome, RegistryError,
};
use tracing::debug;

use crate::fetch::Fetcher;
use crate::transcript::Transcript;

pub const IMDB_ORIGIN: &str = "https://www.imdb.com";
pub const GENRES_URL: &str = "https://www.imdb.com/feature/genre/";

static GENRE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(https://www\.imdb\.com/search/title/?\?genres=[^"]*)""#)
        .expect("genre link pattern is valid")
});

static MOVIE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(/title/[^"/?]+/)"#).expect("movie link pattern is valid")
});

static MOVIE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h1[^>]*itemprop="name"[^>]*>(.*?)</h1>"#)
        .expect("movie title pattern is valid")
});

const NEXT_PAGE_MARKER: &str = "Next &#187;</a>";

/// Scrape the genre index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeGenres {
    pub url: String,
}

impl ScrapeGenres {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Scrape one page of a genre's search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeGenrePage {
    pub url: String,
    pub page: u32,
}

impl ScrapeGenrePage {
    pub fn first(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page: 1,
        }
    }

    pub fn next(&self) -> Self {
        Self {
            url: self.url.clone(),
            page: self.page + 1,
        }
    }

    /// `url?page=N`, or `url&page=N` when the url already has a query.
    pub fn locator(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}page={}", self.url, self.page)
    }
}

/// Scrape one movie page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeMovie {
    pub url: String,
}

impl Command for ScrapeGenres {
    const KIND: &'static str = "scrape.genres.v1";
}

impl Command for ScrapeGenrePage {
    const KIND: &'static str = "scrape.genre_page.v1";
}

impl Command for ScrapeMovie {
    const KIND: &'static str = "scrape.movie.v1";
}

pub const KINDS: [&str; 3] = [ScrapeGenres::KIND, ScrapeGenrePage::KIND, ScrapeMovie::KIND];

/// Genre search links, in page order, without duplicates.
pub fn genre_links(html: &str) -> Vec<String> {
    unique(GENRE_LINK.captures_iter(html).map(|c| c[1].to_string()))
}

/// Absolute movie links, in page order, without duplicates.
pub fn movie_links(html: &str) -> Vec<String> {
    unique(
        MOVIE_LINK
            .captures_iter(html)
            .map(|c| format!("{IMDB_ORIGIN}{}", &c[1])),
    )
}

pub fn has_next_page(html: &str) -> bool {
    html.contains(NEXT_PAGE_MARKER)
}

pub fn movie_title(html: &str) -> Option<String> {
    let inner = MOVIE_TITLE.captures(html)?.get(1)?.as_str();
    // markup after the title (year, badges) is dropped
    let text = inner.split('<').next().unwrap_or_default();
    let title = text.replace("&nbsp;", " ").trim().to_string();
    (!title.is_empty()).then_some(title)
}

fn unique(links: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for link in links {
        if seen.insert(link.clone()) {
            ordered.push(link);
        }
    }
    ordered
}

/// Runs all three scrape commands against a shared fetcher.
#[derive(Clone)]
pub struct Scraper {
    fetcher: Arc<dyn Fetcher>,
    transcript: Transcript,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn Fetcher>, transcript: Transcript) -> Self {
        Self {
            fetcher,
            transcript,
        }
    }

    async fn download(&self, locator: &str) -> Result<String, CommandError> {
        let html = self
            .fetcher
            .fetch(locator)
            .await
            .map_err(|e| CommandError::work_failed(e.to_string()))?;
        self.transcript.say(format!("Downloaded {locator}"));
        Ok(html)
    }
}

#[async_trait]
impl Handler<ScrapeGenres> for Scraper {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: ScrapeGenres,
    ) -> Result<Outcome, CommandError> {
        let html = self.download(&command.url).await?;
        let genres = genre_links(&html);
        debug!(command_id = %ctx.id(), genres = genres.len(), "parsed genre index");
        self.transcript
            .say(format!("Discovered {} genres.", genres.len()));

        let mut outcome = Outcome::done();
        for url in genres {
            outcome = outcome.enqueue(&ScrapeGenrePage::first(url))?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Handler<ScrapeGenrePage> for Scraper {
    async fn handle(
        &self,
        ctx: &CommandContext,
        command: ScrapeGenrePage,
    ) -> Result<Outcome, CommandError> {
        let html = self.download(&command.locator()).await?;
        let movies = movie_links(&html);
        let next = has_next_page(&html);
        debug!(
            command_id = %ctx.id(),
            page = command.page,
            movies = movies.len(),
            next,
            "parsed genre page"
        );
        self.transcript.say(format!(
            "Discovered {} movies on page {}.",
            movies.len(),
            command.page
        ));

        let mut outcome = Outcome::done();
        for url in movies {
            outcome = outcome.enqueue(&ScrapeMovie { url })?;
        }
        if next {
            outcome = outcome.enqueue(&command.next())?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Handler<ScrapeMovie> for Scraper {
    async fn handle(
        &self,
        _ctx: &CommandContext,
        command: ScrapeMovie,
    ) -> Result<Outcome, CommandError> {
        let html = self.download(&command.url).await?;
        let title = movie_title(&html).ok_or_else(|| {
            CommandError::work_failed(format!("no movie title in {}", command.url))
        })?;
        self.transcript.say(format!("Parsed movie {title}."));
        Ok(Outcome::done())
    }
}

pub fn register(builder: AppBuilder, scraper: Scraper) -> Result<AppBuilder, RegistryError> {
    builder
        .register::<ScrapeGenres, _>(scraper.clone())?
        .register::<ScrapeGenrePage, _>(scraper.clone())?
        .register::<ScrapeMovie, _>(scraper)
}
