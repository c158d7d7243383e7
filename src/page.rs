//! A browser page that resolves natural-language prompts to elements and data

use anyhow::anyhow;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api_client::{AskAnswer, QueryKind, ResolutionService, ResolveRequest};
use crate::config::LlmConfig;
use crate::driver::PageDriver;
use crate::errors::{Error, Result};
use crate::identifier::{self, GenerationReport};
use crate::retry::{RetryPolicy, run_with_retry};
use crate::snapshot::{self, HtmlMode};
use crate::types::{ElementId, PageSnapshot, Resolution};
use crate::visibility;

pub const SCROLL_POSITION_SCRIPT: &str = "return window.scrollY;";
pub const SCROLL_TO_SCRIPT: &str = "window.scrollTo(0, arguments[0]);";

const SCROLL_STEP: u64 = 20_000;
const SCROLL_STALL: Duration = Duration::from_secs(2);
const SCROLL_PROGRESS: f64 = 1000.0;
const SCROLL_PAUSE: Duration = Duration::from_millis(500);

/// An element found by identifier, with its live handle
///
/// Acting on `handle` directly goes to whichever tab WebDriver has focused.
/// With several pages open, use [`Page::click`], [`Page::fill`] and
/// [`Page::upload_files`], which focus the element's own page first.
#[derive(Debug, Clone)]
pub struct ResolvedElement<E> {
    pub id: ElementId,
    pub handle: E,
}

/// Elements matched by a selector the service produced
#[derive(Debug, Clone)]
pub struct SelectorMatch<E> {
    pub selector: String,
    pub elements: Vec<E>,
}

/// Optional inputs to [`Page::scrape`]
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// JSON schema the returned data must follow
    pub return_data_json_schema: Option<Value>,
    /// Plain description of what the data should look like
    pub expected_return_data: Option<String>,
}

/// One page of a launched browser
pub struct Page<D: PageDriver, S: ResolutionService> {
    driver: Arc<D>,
    service: Arc<S>,
    llm: LlmConfig,
    retry: RetryPolicy,
}

impl<D: PageDriver, S: ResolutionService> Clone for Page<D, S> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
            service: self.service.clone(),
            llm: self.llm.clone(),
            retry: self.retry,
        }
    }
}

impl<D: PageDriver, S: ResolutionService> Page<D, S> {
    pub fn new(driver: D, service: Arc<S>, llm: LlmConfig, retry: RetryPolicy) -> Self {
        Self {
            driver: Arc::new(driver),
            service,
            llm,
            retry,
        }
    }

    /// The underlying engine page, for operations this type does not wrap
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn url(&self) -> Result<String> {
        self.driver.url().await
    }

    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.driver.navigate(url, timeout).await
    }

    /// Tag every element with its `d-id`; `None` if generation gave up
    pub async fn generate_element_ids(&self) -> Option<GenerationReport> {
        identifier::generate_ids(&*self.driver).await
    }

    pub async fn get_invisible_ids(&self) -> Result<HashSet<ElementId>> {
        visibility::invisible_ids(&*self.driver).await
    }

    pub async fn get_page_information(&self, mode: HtmlMode) -> Result<PageSnapshot> {
        snapshot::build(&*self.driver, mode).await
    }

    /// Live handle of the element carrying `id`
    pub async fn get_element_from_id(&self, id: &ElementId) -> Result<D::Element> {
        self.generate_element_ids().await;
        self.find_by_id(id).await
    }

    /// Live handles for `ids`, in order; fails on the first one missing
    pub async fn get_elements_from_ids(&self, ids: &[ElementId]) -> Result<Vec<D::Element>> {
        self.generate_element_ids().await;
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            handles.push(self.find_by_id(id).await?);
        }
        Ok(handles)
    }

    async fn find_by_id(&self, id: &ElementId) -> Result<D::Element> {
        self.lookup_handle(id)
            .await?
            .ok_or_else(|| Error::ElementNotFound(id.to_string()))
    }

    /// `None` when the element did not show up within the lookup timeout
    async fn lookup_handle(&self, id: &ElementId) -> Result<Option<D::Element>> {
        match self
            .driver
            .wait_for_xpath(&id.xpath(), self.retry.lookup_timeout)
            .await
        {
            Ok(handle) => Ok(Some(handle)),
            Err(Error::Timeout(_)) | Err(Error::ElementNotFound(_)) => {
                debug!("No element with id {} on the page", id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The single element best matching `prompt`
    pub async fn get_interactable_element(
        &self,
        prompt: &str,
    ) -> Result<ResolvedElement<D::Element>> {
        self.resolve_with_retry(QueryKind::Element, prompt, move |resolution| async move {
            let id = match resolution {
                Resolution::Element(id) => id,
                other => return Err(unexpected(QueryKind::Element, &other)),
            };
            Ok(self
                .lookup_handle(&id)
                .await?
                .map(|handle| ResolvedElement { id, handle }))
        })
        .await
    }

    /// Every element matching `prompt`
    pub async fn get_interactable_elements(
        &self,
        prompt: &str,
    ) -> Result<Vec<ResolvedElement<D::Element>>> {
        self.resolve_with_retry(QueryKind::Elements, prompt, move |resolution| async move {
            let ids = match resolution {
                Resolution::Elements(ids) => ids,
                other => return Err(unexpected(QueryKind::Elements, &other)),
            };
            let mut found = Vec::with_capacity(ids.len());
            for id in ids {
                match self.lookup_handle(&id).await? {
                    Some(handle) => found.push(ResolvedElement { id, handle }),
                    None => return Ok(None),
                }
            }
            Ok(Some(found))
        })
        .await
    }

    /// Elements matched by a CSS selector the service derives from `prompt`
    pub async fn get_interactions_selector(
        &self,
        prompt: &str,
    ) -> Result<SelectorMatch<D::Element>> {
        self.resolve_with_retry(QueryKind::Selector, prompt, move |resolution| async move {
            let selector = match resolution {
                Resolution::Selector(selector) => selector,
                other => return Err(unexpected(QueryKind::Selector, &other)),
            };
            debug!("Selector for '{}': {}", prompt, selector);
            match self
                .driver
                .wait_for_selector(&selector, self.retry.lookup_timeout)
                .await
            {
                Ok(elements) if !elements.is_empty() => {
                    Ok(Some(SelectorMatch { selector, elements }))
                }
                Ok(_) | Err(Error::Timeout(_)) | Err(Error::ElementNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    /// Snapshot, ask the service, look the answer up; repeat per the retry policy
    async fn resolve_with_retry<T, L, LFut>(
        &self,
        kind: QueryKind,
        prompt: &str,
        lookup: L,
    ) -> Result<T>
    where
        L: Fn(Resolution) -> LFut,
        LFut: Future<Output = Result<Option<T>>>,
    {
        let lookup = &lookup;
        run_with_retry(
            &self.retry,
            prompt,
            move |attempt| async move {
                let snapshot = self.get_page_information(HtmlMode::VisibleOnly).await?;
                let request = ResolveRequest::new(kind, snapshot, self.llm.clone(), prompt);
                match self.service.resolve(request).await? {
                    Some(resolution) => lookup(resolution).await,
                    None => {
                        debug!("Service found no {:?} on attempt {}", kind, attempt);
                        Ok(None)
                    }
                }
            },
            move || async move {
                let snapshot = self.get_page_information(HtmlMode::Raw).await?;
                Ok::<_, Error>(snapshot.screenshot_base64)
            },
        )
        .await
    }

    /// Extract data from the page; `Value::Null` when the service found none
    pub async fn scrape(&self, prompt: &str, options: ScrapeOptions) -> Result<Value> {
        let snapshot = self.get_page_information(HtmlMode::Raw).await?;
        let request = ResolveRequest::new(QueryKind::Scrape, snapshot, self.llm.clone(), prompt)
            .with_schema(options.return_data_json_schema)
            .with_expected_return_data(options.expected_return_data);

        match self.service.resolve(request).await? {
            Some(Resolution::Data(value)) => Ok(value),
            Some(other) => Err(unexpected(QueryKind::Scrape, &other)),
            None => Ok(Value::Null),
        }
    }

    /// Extract data shaped like `T`, sending its JSON schema along
    pub async fn scrape_into<T>(&self, prompt: &str, expected: Option<String>) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        let value = self
            .scrape(
                prompt,
                ScrapeOptions {
                    return_data_json_schema: Some(schema),
                    expected_return_data: expected,
                },
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Ask a question about the page
    pub async fn ask(&self, prompt: &str, schema: Option<Value>) -> Result<AskAnswer> {
        let snapshot = self.get_page_information(HtmlMode::Raw).await?;
        let screenshot_base64 = snapshot.screenshot_base64.clone();
        let request = ResolveRequest::new(QueryKind::Ask, snapshot, self.llm.clone(), prompt)
            .with_schema(schema);

        match self.service.resolve(request).await? {
            Some(Resolution::Data(value)) => Ok(serde_json::from_value(value)?),
            Some(other) => Err(unexpected(QueryKind::Ask, &other)),
            None => Err(Error::Resolution {
                message: format!("No answer to '{}'", prompt),
                screenshot_base64,
            }),
        }
    }

    /// Ask a question whose answer deserializes into `T`
    pub async fn ask_as<T>(&self, prompt: &str) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        let answer = self.ask(prompt, Some(schema)).await?;
        Ok(serde_json::from_value(answer.return_data)?)
    }

    /// Fail with [`Error::Navigation`] unless the service agrees this page matches `expected`
    pub async fn check_expected_page(&self, expected: &str) -> Result<()> {
        match self.ask_as::<bool>(&expected_page_prompt(expected)).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::Navigation(format!(
                "landed on a page that is not '{}'",
                expected
            ))),
            Err(e) => Err(Error::Navigation(e.to_string())),
        }
    }

    /// Scroll until the page stops growing
    pub async fn scroll_to_bottom(&self) -> Result<()> {
        let mut offset: u64 = 0;
        let mut last_position = 0.0;
        let mut progress_at = Instant::now();

        loop {
            let position = self
                .driver
                .evaluate(SCROLL_POSITION_SCRIPT, vec![])
                .await?
                .as_f64()
                .unwrap_or(0.0);

            self.driver
                .evaluate(SCROLL_TO_SCRIPT, vec![json!(offset)])
                .await?;
            offset += SCROLL_STEP;

            if progress_at.elapsed() > SCROLL_STALL {
                break;
            }
            if position - last_position > SCROLL_PROGRESS {
                progress_at = Instant::now();
            }
            last_position = position;

            tokio::time::sleep(SCROLL_PAUSE).await;
        }

        debug!("Scrolled to {}px", last_position);
        Ok(())
    }

    /// Click an element of this page
    pub async fn click(&self, element: &ResolvedElement<D::Element>) -> Result<()> {
        debug!("Clicking {}", element.id);
        self.driver.click(&element.handle).await
    }

    /// Replace the value of a text field on this page
    pub async fn fill(&self, element: &ResolvedElement<D::Element>, text: &str) -> Result<()> {
        debug!("Filling {}", element.id);
        self.driver.type_text(&element.handle, text).await
    }

    /// Select local files in a file input of this page
    pub async fn upload_files<P: AsRef<Path>>(
        &self,
        element: &ResolvedElement<D::Element>,
        paths: &[P],
    ) -> Result<()> {
        if paths.is_empty() {
            return Err(Error::Other(anyhow!("No files given for {}", element.id)));
        }
        let mut absolute: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            absolute.push(tokio::fs::canonicalize(path.as_ref()).await?);
        }
        info!("Uploading {} file(s) through {}", absolute.len(), element.id);
        self.driver.set_input_files(&element.handle, &absolute).await
    }

    /// Write the current page source to `path`
    pub async fn dump_html(&self, path: impl AsRef<Path>) -> Result<()> {
        let html = self.driver.content().await?;
        tokio::fs::write(path.as_ref(), html).await?;
        info!("Wrote page HTML to {}", path.as_ref().display());
        Ok(())
    }
}

/// Question asked to confirm a navigation landed where expected
pub fn expected_page_prompt(expected: &str) -> String {
    format!(
        "We are checking if we have arrived on the expected type of page. \
         Answer false if it is apparent that we have arrived on the wrong page. \
         Here is the description: '{}'",
        expected
    )
}

fn unexpected(kind: QueryKind, resolution: &Resolution) -> Error {
    Error::Other(anyhow!(
        "Asked for {:?}, service answered {:?}",
        kind,
        resolution
    ))
}
