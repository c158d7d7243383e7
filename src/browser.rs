//! Browser lifecycle: launch on first use, pages, storage state, teardown

use anyhow::anyhow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api_client::{HttpApiClient, ResolutionService};
use crate::config::Config;
use crate::downloads;
use crate::driver::BrowserSession;
use crate::errors::{Error, Result};
use crate::page::Page;
use crate::page_manager::PageManager;
use crate::session_store::SessionStore;
use crate::types::{AuthSession, StorageState, StoredCookie};
use crate::webdriver::WebDriverSession;

/// A page of an [`AgentBrowser`]
pub type BrowserPage<S = HttpApiClient, B = WebDriverSession> =
    Page<<B as BrowserSession>::Page, S>;

/// Options for [`AgentBrowser::goto`]
#[derive(Debug, Clone, Default)]
pub struct GotoOptions {
    /// Open the URL in a new tab instead of the active one
    pub new_page: bool,
    /// Navigation timeout; the configured default when `None`
    pub timeout: Option<Duration>,
    /// Description of the page we expect to land on, checked with `ask`
    pub expected_page: Option<String>,
}

impl GotoOptions {
    pub fn new_page() -> Self {
        Self {
            new_page: true,
            ..Self::default()
        }
    }

    pub fn expecting(description: impl Into<String>) -> Self {
        Self {
            expected_page: Some(description.into()),
            ..Self::default()
        }
    }
}

struct Launched<S: ResolutionService, B: BrowserSession> {
    session: B,
    pages: PageManager<BrowserPage<S, B>>,
    /// Downloads already handed out by `wait_for_download`
    claimed_downloads: HashSet<PathBuf>,
}

enum Lifecycle<S: ResolutionService, B: BrowserSession> {
    Idle,
    Launched(Launched<S, B>),
}

/// A browser whose pages resolve prompts through a [`ResolutionService`]
///
/// Nothing is started until the first operation that needs a page.
pub struct AgentBrowser<S: ResolutionService = HttpApiClient, B: BrowserSession = WebDriverSession>
{
    id: Uuid,
    config: Config,
    service: Arc<S>,
    auth: Option<AuthSession>,
    state: Lifecycle<S, B>,
}

impl AgentBrowser<HttpApiClient> {
    /// Browser talking to the configured HTTP resolution service
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let id = Uuid::new_v4();
        let service = HttpApiClient::new(&config, id.to_string())?;
        Ok(Self::build(id, config, service))
    }
}

impl<S: ResolutionService, B: BrowserSession> AgentBrowser<S, B> {
    pub fn with_service(config: Config, service: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(Uuid::new_v4(), config, service))
    }

    fn build(id: Uuid, config: Config, service: S) -> Self {
        Self {
            id,
            config,
            service: Arc::new(service),
            auth: None,
            state: Lifecycle::Idle,
        }
    }

    /// Identifier sent to the service as `X-Browser-Id`
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn auth_session(&self) -> Option<&AuthSession> {
        self.auth.as_ref()
    }

    pub fn is_launched(&self) -> bool {
        matches!(self.state, Lifecycle::Launched(_))
    }

    /// Number of open pages, zero before launch
    pub fn page_count(&self) -> usize {
        match &self.state {
            Lifecycle::Idle => 0,
            Lifecycle::Launched(launched) => launched.pages.len(),
        }
    }

    /// Index of the active page, `None` before launch
    pub fn active_page_index(&self) -> Option<usize> {
        match &self.state {
            Lifecycle::Idle => None,
            Lifecycle::Launched(launched) => launched.pages.active_index(),
        }
    }

    /// Where the running browser saves downloads
    pub fn download_dir(&self) -> Option<&Path> {
        match &self.state {
            Lifecycle::Idle => None,
            Lifecycle::Launched(launched) => Some(launched.session.download_dir()),
        }
    }

    fn wrap(&self, driver: B::Page) -> BrowserPage<S, B> {
        Page::new(
            driver,
            self.service.clone(),
            self.config.llm.clone(),
            self.config.retry,
        )
    }

    /// Start the browser and restore any saved state; no-op once launched
    pub async fn launch(&mut self) -> Result<()> {
        if self.is_launched() {
            return Ok(());
        }

        let user_agent = self.auth.as_ref().map(|a| a.user_agent.as_str());
        let session = B::connect(&self.config.browser, user_agent).await?;
        self.attach(session).await
    }

    /// Adopt an already running session as this browser
    ///
    /// Saved state is restored into it exactly as [`AgentBrowser::launch`] does.
    pub async fn attach(&mut self, session: B) -> Result<()> {
        if self.is_launched() {
            return Err(Error::Other(anyhow!("Browser {} is already running", self.id)));
        }

        if let Some(state) = self.initial_storage_state()? {
            session.restore_storage_state(&state).await?;
        }

        let mut pages = PageManager::new();
        pages.add(self.wrap(session.initial_page().await?));

        self.state = Lifecycle::Launched(Launched {
            session,
            pages,
            claimed_downloads: HashSet::new(),
        });
        info!("Browser {} launched", self.id);
        Ok(())
    }

    fn session_store(&self) -> Result<SessionStore> {
        match &self.config.browser.session_dir {
            Some(dir) => SessionStore::at(dir.clone()),
            None => SessionStore::new(),
        }
    }

    /// Backend auth session first, then the local session store
    fn initial_storage_state(&self) -> Result<Option<StorageState>> {
        if let Some(auth) = &self.auth {
            debug!("Restoring auth session for {}", auth.domains.join(", "));
            return Ok(Some(auth.storage_state.clone()));
        }
        match &self.config.browser.session_name {
            Some(name) => self.session_store()?.load(name),
            None => Ok(None),
        }
    }

    async fn launched(&mut self) -> Result<&mut Launched<S, B>> {
        self.launch().await?;
        match &mut self.state {
            Lifecycle::Launched(launched) => Ok(launched),
            Lifecycle::Idle => Err(Error::NotLaunched),
        }
    }

    fn running(&mut self) -> Result<&mut Launched<S, B>> {
        match &mut self.state {
            Lifecycle::Launched(launched) => Ok(launched),
            Lifecycle::Idle => Err(Error::NotLaunched),
        }
    }

    /// The active page, launching the browser if needed
    pub async fn active_page(&mut self) -> Result<BrowserPage<S, B>> {
        let active = self.launched().await?.pages.active().cloned();
        match active {
            Some(page) => Ok(page),
            None => self.new_page().await,
        }
    }

    /// Open a new tab and make it active
    pub async fn new_page(&mut self) -> Result<BrowserPage<S, B>> {
        let driver = self.launched().await?.session.open_page().await?;
        let page = self.wrap(driver);
        self.running()?.pages.add(page.clone());
        Ok(page)
    }

    /// Make the page at `index` the one later operations act on
    pub fn set_active_page(&mut self, index: usize) -> Result<BrowserPage<S, B>> {
        let pages = &mut self.running()?.pages;
        if !pages.set_active(index) {
            return Err(Error::NoSuchPage(index));
        }
        pages.active().cloned().ok_or(Error::NoSuchPage(index))
    }

    /// Close the tab at `index`
    ///
    /// The page before it becomes active when it was. Closing the last page
    /// opens a blank one first so the browser keeps running.
    pub async fn close_page(&mut self, index: usize) -> Result<()> {
        let page_count = self.running()?.pages.len();
        if index >= page_count {
            return Err(Error::NoSuchPage(index));
        }
        if page_count == 1 {
            self.new_page().await?;
        }

        let launched = self.running()?;
        let page = launched
            .pages
            .pages()
            .get(index)
            .cloned()
            .ok_or(Error::NoSuchPage(index))?;
        launched.session.close_page(page.driver()).await?;
        launched.pages.remove(index);
        debug!("Closed page {}", index);
        Ok(())
    }

    /// Navigate and return the page that was navigated
    ///
    /// Load failures and timeouts are logged and ignored. With
    /// `expected_page`, the service is asked whether the page matches and a
    /// negative answer fails with [`Error::Navigation`].
    pub async fn goto(&mut self, url: &str, options: GotoOptions) -> Result<BrowserPage<S, B>> {
        let page = if options.new_page {
            self.new_page().await?
        } else {
            self.active_page().await?
        };

        let timeout = options
            .timeout
            .unwrap_or(self.config.browser.navigation_timeout);
        info!("Going to {}", url);
        if let Err(e) = page.navigate(url, timeout).await {
            debug!("Problem loading {}, continuing anyway: {}", url, e);
        }

        if let Some(expected) = options.expected_page.as_deref() {
            page.check_expected_page(expected).await?;
        }

        Ok(page)
    }

    /// Fetch a backend auth session for `domains`
    ///
    /// Before launch it is applied when the browser starts, user agent
    /// included; afterwards its cookies and localStorage are loaded right away.
    pub async fn authenticate(&mut self, domains: &[String]) -> Result<()> {
        let auth = self.service.authenticate(domains).await?;
        if let Lifecycle::Launched(launched) = &self.state {
            launched
                .session
                .restore_storage_state(&auth.storage_state)
                .await?;
        }
        self.auth = Some(auth);
        Ok(())
    }

    pub async fn add_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        match &self.state {
            Lifecycle::Idle => Err(Error::NotLaunched),
            Lifecycle::Launched(launched) => {
                launched
                    .session
                    .restore_storage_state(&StorageState {
                        cookies: cookies.to_vec(),
                        origins: Vec::new(),
                    })
                    .await
            }
        }
    }

    pub async fn storage_state(&self) -> Result<StorageState> {
        match &self.state {
            Lifecycle::Idle => Err(Error::NotLaunched),
            Lifecycle::Launched(launched) => launched.session.storage_state().await,
        }
    }

    /// Wait for the next download not yet returned by this method
    ///
    /// Files that finished before the call count, so clicking a link and
    /// then waiting does not race.
    pub async fn wait_for_download(&mut self, timeout: Duration) -> Result<PathBuf> {
        let launched = self.running()?;
        let path = downloads::wait_for_new_file(
            launched.session.download_dir(),
            &launched.claimed_downloads,
            timeout,
        )
        .await?;
        launched.claimed_downloads.insert(path.clone());
        Ok(path)
    }

    /// Persist storage state where configured and shut the browser down
    pub async fn close(&mut self) -> Result<()> {
        let Lifecycle::Launched(launched) = std::mem::replace(&mut self.state, Lifecycle::Idle)
        else {
            return Ok(());
        };
        let Launched { session, pages, .. } = launched;
        drop(pages);

        let needs_state = self.auth.is_some() || self.config.browser.session_name.is_some();
        let persisted = if needs_state {
            match session.storage_state().await {
                Ok(state) => self.persist(&state).await,
                Err(e) => {
                    warn!("Could not read storage state before closing: {}", e);
                    Ok(())
                }
            }
        } else {
            Ok(())
        };

        // The browser goes away even when saving its state failed
        session.close().await?;
        info!("Browser {} closed", self.id);
        persisted
    }

    /// Upload to the backend and save locally; a failed upload still saves
    async fn persist(&self, state: &StorageState) -> Result<()> {
        let uploaded = match &self.auth {
            Some(auth) => self.service.upload_auth_session(auth, state).await,
            None => Ok(()),
        };
        if let Some(name) = &self.config.browser.session_name {
            self.session_store()?.save(name, state)?;
            debug!("Saved storage state as session '{}'", name);
        }
        uploaded
    }
}
