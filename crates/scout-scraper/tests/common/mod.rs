//! In-memory browser fixtures. Selectors are evaluated against fixture HTML
//! with the `scraper` crate, so definitions are exercised with real CSS.

#![allow(dead_code)]

use scout_browser::{
    BrowserError, BrowserSession, FingerprintConfig, PageActions, SessionLauncher, WaitUntil,
};
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::SelectorError {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

fn select_text(html: &str, selector: &str) -> Result<Vec<String>, BrowserError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .collect())
}

fn select_attr(html: &str, selector: &str, name: &str) -> Result<Vec<String>, BrowserError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr(name).map(str::to_string))
        .collect())
}

/// Page serving fixture HTML by URL.
#[derive(Default)]
pub struct FixturePage {
    pages: HashMap<String, String>,
    timeouts: HashSet<String>,
    current: Mutex<String>,
    visits: Mutex<Vec<String>>,
    scrolls: AtomicUsize,
}

impl FixturePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Fail navigation to `url` with a timeout.
    pub fn with_timeout(mut self, url: &str) -> Self {
        self.timeouts.insert(url.to_string());
        self
    }

    /// Navigate directly, for tests that drive a component without the orchestrator.
    pub async fn load(&self, url: &str) {
        self.goto(url, WaitUntil::NetworkIdle, Duration::from_secs(1))
            .await
            .unwrap();
    }

    /// Every URL passed to `goto`, in order.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    fn html(&self) -> String {
        self.current.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PageActions for FixturePage {
    async fn goto(&self, url: &str, _wait: WaitUntil, timeout: Duration) -> scout_browser::Result<()> {
        self.visits.lock().unwrap().push(url.to_string());

        if self.timeouts.contains(url) {
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap(),
            });
        }

        // Unknown URLs load as an empty document, like a bare 404 page
        let html = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        *self.current.lock().unwrap() = html;
        Ok(())
    }

    async fn query_text(&self, selector: &str) -> scout_browser::Result<Option<String>> {
        Ok(select_text(&self.html(), selector)?.into_iter().next())
    }

    async fn query_all_text(&self, selector: &str) -> scout_browser::Result<Vec<String>> {
        select_text(&self.html(), selector)
    }

    async fn query_all_attr(&self, selector: &str, name: &str) -> scout_browser::Result<Vec<String>> {
        select_attr(&self.html(), selector, name)
    }

    async fn exists(&self, selector: &str) -> scout_browser::Result<bool> {
        Ok(!select_text(&self.html(), selector)?.is_empty())
    }

    async fn content(&self) -> scout_browser::Result<String> {
        Ok(self.html())
    }

    async fn scroll_to_end(&self) -> scout_browser::Result<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FixtureSession {
    page: Arc<FixturePage>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl BrowserSession for FixtureSession {
    fn page(&self) -> &dyn PageActions {
        self.page.as_ref()
    }

    async fn close(self: Box<Self>) -> scout_browser::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Launcher handing out sessions over one shared [`FixturePage`].
pub struct FixtureLauncher {
    pub page: Arc<FixturePage>,
    fail_launch: bool,
    launches: Mutex<Vec<FingerprintConfig>>,
    closes: Arc<AtomicUsize>,
}

impl FixtureLauncher {
    pub fn new(page: FixturePage) -> Self {
        Self {
            page: Arc::new(page),
            fail_launch: false,
            launches: Mutex::new(Vec::new()),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Launcher whose every launch fails.
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(FixturePage::new())
        }
    }

    pub fn launches(&self) -> Vec<FingerprintConfig> {
        self.launches.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionLauncher for FixtureLauncher {
    async fn launch(
        &self,
        fingerprint: &FingerprintConfig,
    ) -> scout_browser::Result<Box<dyn BrowserSession>> {
        self.launches.lock().unwrap().push(fingerprint.clone());
        if self.fail_launch {
            return Err(BrowserError::LaunchFailed("no chrome in fixture".to_string()));
        }
        Ok(Box::new(FixtureSession {
            page: Arc::clone(&self.page),
            closes: Arc::clone(&self.closes),
        }))
    }
}

/// GitHub profile page with the name in the primary slot.
pub fn github_profile(name: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="vcard-names"><span class="p-name">{name}</span><span class="p-nickname">{login}</span></h1>
            <div class="p-note">Builds things for the web</div>
            <span itemprop="homeLocation">Bengaluru</span>
            <span itemprop="programmingLanguage">Rust</span>
            <span itemprop="programmingLanguage">TypeScript</span>
            <span itemprop="programmingLanguage">Rust</span>
        </body></html>"#,
        login = name.to_lowercase()
    )
}

/// GitHub search results page linking each login.
pub fn github_listing(logins: &[&str]) -> String {
    let links: String = logins
        .iter()
        .map(|login| {
            format!(r#"<div class="user"><a data-hovercard-type="user" href="/{login}">{login}</a></div>"#)
        })
        .collect();
    format!("<html><body><nav><a href=\"/features\">Features</a></nav>{links}</body></html>")
}
