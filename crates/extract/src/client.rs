// ABOUTME: Client is the entry point for article extraction against supported news sites.
// ABOUTME: Drives the session pipeline: navigate, wait, snapshot, extract, clean, close.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::ExtractError;
use crate::options::{ClientBuilder, Options};
use crate::profiles::{load_builtin_profiles, ImageSource, ProfileRegistry, SiteProfile};
use crate::query::PageSnapshot;
use crate::result::{ArticleRecord, ExtractionStatus};
use crate::session::{ChromiumSessionManager, Session, SessionManager};
use crate::text::{collapse_whitespace, strip_phrases, truncate_at_first_marker};

/// The main client for extracting articles from supported news sites.
///
/// Holds the site profile registry and the session manager; one client can
/// serve any number of concurrent extractions, each in its own browser
/// session.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    registry: Arc<ProfileRegistry>,
    sessions: Arc<dyn SessionManager>,
}

impl Client {
    /// Create a builder for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with the given options. Falls back to the builtin
    /// site profiles and a real Chromium session manager where the options
    /// leave those unset.
    pub fn new(opts: Options) -> Self {
        let registry = Arc::new(opts.registry.clone().unwrap_or_else(load_builtin_profiles));
        let sessions: Arc<dyn SessionManager> = opts
            .session_manager
            .clone()
            .unwrap_or_else(|| Arc::new(ChromiumSessionManager::new(&opts)));
        Self {
            opts,
            registry,
            sessions,
        }
    }

    /// Site identifiers with a registered profile, sorted.
    pub fn site_ids(&self) -> Vec<String> {
        self.registry.site_ids()
    }

    /// Extract the article at `url` using the profile registered for
    /// `site_id`.
    ///
    /// Opens a dedicated browser session, navigates, waits out the
    /// profile's selectors, reads the rendered HTML, and assembles the
    /// cleaned [`ArticleRecord`]. The session is closed on every path out,
    /// including deadline cancellation.
    ///
    /// Missing fields degrade the record to a partial status instead of
    /// failing; only an unknown site, a launch failure, or a navigation
    /// problem produces an error.
    pub async fn extract(&self, site_id: &str, url: &str) -> Result<ArticleRecord, ExtractError> {
        let profile = self
            .registry
            .get(site_id)
            .ok_or_else(|| ExtractError::unknown_site(site_id))?;

        info!(site = %profile.site_id, url, "extracting article");
        let mut session = self.sessions.open().await?;

        let outcome = match self.opts.deadline {
            Some(deadline) => {
                match tokio::time::timeout(
                    deadline,
                    self.run_in_session(session.as_mut(), profile, url),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ExtractError::timeout(
                        url,
                        "extract",
                        Some(anyhow::anyhow!("deadline of {:?} exceeded", deadline)),
                    )),
                }
            }
            None => self.run_in_session(session.as_mut(), profile, url).await,
        };

        // The one guaranteed release for the session opened above.
        session.close().await;

        match outcome {
            Ok(record) => {
                info!(
                    site = %profile.site_id,
                    url,
                    status = ?record.extraction_status,
                    words = record.word_count(),
                    "extraction finished"
                );
                Ok(record)
            }
            Err(err) => {
                warn!(site = %profile.site_id, url, error = %err, "extraction failed");
                Err(err)
            }
        }
    }

    /// Extract from already-rendered HTML, skipping the browser entirely.
    ///
    /// `url` is only used to resolve relative image URLs. Useful for
    /// pipelines that archive page snapshots, and the only failure left is
    /// an unknown `site_id`.
    pub async fn extract_from_html(
        &self,
        site_id: &str,
        url: &str,
        html: &str,
    ) -> Result<ArticleRecord, ExtractError> {
        let profile = self
            .registry
            .get(site_id)
            .ok_or_else(|| ExtractError::unknown_site(site_id))?;
        Ok(extract_from_snapshot(
            profile,
            url,
            &PageSnapshot::parse(html),
        ))
    }

    async fn run_in_session(
        &self,
        session: &mut dyn Session,
        profile: &SiteProfile,
        url: &str,
    ) -> Result<ArticleRecord, ExtractError> {
        if let Err(err) = session.navigate(url, profile.wait_policy).await {
            self.capture_failure_screenshot(session, url).await;
            return Err(err);
        }

        for selector in &profile.wait_selectors {
            if !session
                .wait_for_selector(selector, profile.selector_timeout())
                .await
            {
                debug!(
                    site = %profile.site_id,
                    selector = %selector,
                    "selector never appeared, extracting anyway"
                );
            }
        }

        let html = match session.content().await {
            Ok(html) => html,
            Err(err) => {
                self.capture_failure_screenshot(session, url).await;
                return Err(err);
            }
        };

        Ok(extract_from_snapshot(profile, url, &PageSnapshot::parse(&html)))
    }

    /// Best effort only: a diagnostics failure never masks the error that
    /// triggered the capture.
    async fn capture_failure_screenshot(&self, session: &mut dyn Session, url: &str) {
        let Some(path) = &self.opts.failure_screenshot else {
            return;
        };
        match session.screenshot().await {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(path, &bytes) {
                    warn!(path = %path.display(), error = %err, "could not write failure screenshot");
                } else {
                    info!(path = %path.display(), url, "failure screenshot written");
                }
            }
            Err(err) => {
                warn!(url, error = %err, "failure screenshot capture failed");
            }
        }
    }
}

/// Assemble a record from a page snapshot by walking the profile's
/// selector chains and cleaning what they matched.
fn extract_from_snapshot(
    profile: &SiteProfile,
    page_url: &str,
    snapshot: &PageSnapshot,
) -> ArticleRecord {
    let title = snapshot.text_of_first_matching(&profile.title_selectors);

    let paragraphs = profile
        .body
        .selectors
        .iter()
        .map(|selector| snapshot.all_text_of(selector, profile.body.limit))
        .find(|texts| !texts.is_empty())
        .unwrap_or_default();
    let joined = paragraphs.join(" ");
    let stripped = strip_phrases(&joined, &profile.boilerplate_phrases);
    let truncated = truncate_at_first_marker(&stripped, &profile.cutoff_markers);
    let body_text = collapse_whitespace(&truncated);

    let raw_image = profile
        .image_sources
        .iter()
        .map(|source| match source {
            ImageSource::Attribute {
                selector,
                attribute,
            } => snapshot.attribute_of(selector, attribute),
            ImageSource::BackgroundStyle { style_of } => {
                snapshot.background_image_url_of(style_of)
            }
        })
        .find(|value| !value.is_empty())
        .unwrap_or_default();
    let image_url = resolve_image_url(&raw_image, profile.base_url_prefix.as_deref(), page_url);

    let extraction_status = if title.is_empty() {
        ExtractionStatus::PartialMissingTitle
    } else if body_text.is_empty() {
        ExtractionStatus::PartialMissingBody
    } else if image_url.is_empty() && profile.wants_image() {
        ExtractionStatus::PartialMissingImage
    } else {
        ExtractionStatus::Ok
    };

    ArticleRecord {
        title,
        body_text,
        image_url,
        extraction_status,
    }
}

/// Absolute image URLs pass through; relative ones are joined onto the
/// profile's base prefix, or onto the page URL when the profile has none.
/// Anything that cannot be made absolute becomes empty.
fn resolve_image_url(raw: &str, base_prefix: Option<&str>, page_url: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if Url::parse(raw).is_ok() {
        return raw.to_string();
    }
    let base = base_prefix.unwrap_or(page_url);
    match Url::parse(base).and_then(|base| base.join(raw)) {
        Ok(resolved) => resolved.to_string(),
        Err(err) => {
            debug!(raw, base, error = %err, "discarding unresolvable image url");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{BodyExtractor, WaitPolicy};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const ARTICLE_HTML: &str = r#"<!doctype html>
<html>
  <body>
    <h1 class="headline">Renuncia el secretario</h1>
    <div class="article-body">
      <p>Primera parte de la nota.</p>
      <p>Únete a nuestro canal. Segunda parte de la nota.</p>
      <p>Tercera parte. Copyright © 2024 Diario</p>
    </div>
    <img class="lead" src="/img/portada.jpg" />
  </body>
</html>"#;

    const NO_TITLE_HTML: &str = r#"<html><body>
  <div class="article-body"><p>Solo cuerpo disponible.</p></div>
  <img class="lead" src="https://cdn.example.com/abs.jpg" />
</body></html>"#;

    const NO_BODY_HTML: &str = r#"<html><body>
  <h1 class="headline">Titular sin cuerpo</h1>
  <img class="lead" src="/img/x.jpg" />
</body></html>"#;

    const NO_IMAGE_HTML: &str = r#"<html><body>
  <h1 class="headline">Titular</h1>
  <div class="article-body"><p>Cuerpo presente.</p></div>
</body></html>"#;

    const FALLBACK_TITLE_HTML: &str = r#"<html><body>
  <h1 class="fallback-headline">Titular alterno</h1>
  <div class="article-body"><p>Cuerpo.</p></div>
</body></html>"#;

    const PAGE_URL: &str = "https://pruebas.example/secciones/nota-del-dia";
    const CLEANED_BODY: &str =
        "Primera parte de la nota. Segunda parte de la nota. Tercera parte.";

    fn test_profile() -> SiteProfile {
        SiteProfile {
            site_id: "pruebas".to_string(),
            title_selectors: vec!["h1.headline".to_string(), "h1.fallback-headline".to_string()],
            body: BodyExtractor {
                selectors: vec![".article-body p".to_string()],
                limit: None,
            },
            image_sources: vec![ImageSource::Attribute {
                selector: "img.lead".to_string(),
                attribute: "src".to_string(),
            }],
            base_url_prefix: Some("https://pruebas.example".to_string()),
            boilerplate_phrases: vec!["Únete a nuestro canal.".to_string()],
            cutoff_markers: vec!["Copyright ©".to_string()],
            wait_policy: WaitPolicy::Immediate,
            wait_selectors: vec!["h1.headline".to_string()],
            selector_timeout_ms: 500,
        }
    }

    fn test_registry() -> ProfileRegistry {
        let mut registry = ProfileRegistry::new();
        registry.register(test_profile()).expect("valid profile");
        registry
    }

    #[derive(Debug, Clone, Default)]
    struct MockBehavior {
        html: String,
        fail_navigation: bool,
        hang_navigation: bool,
        missing_wait_selectors: Vec<String>,
        screenshot: Vec<u8>,
    }

    #[derive(Debug, Default)]
    struct SessionCounter {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    #[derive(Debug)]
    struct MockSessionManager {
        behavior: MockBehavior,
        counter: Arc<SessionCounter>,
    }

    struct MockSession {
        behavior: MockBehavior,
        counter: Arc<SessionCounter>,
    }

    #[async_trait]
    impl SessionManager for MockSessionManager {
        async fn open(&self) -> Result<Box<dyn Session>, ExtractError> {
            self.counter.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockSession {
                behavior: self.behavior.clone(),
                counter: Arc::clone(&self.counter),
            }))
        }
    }

    #[async_trait]
    impl Session for MockSession {
        async fn navigate(&mut self, url: &str, _policy: WaitPolicy) -> Result<(), ExtractError> {
            if self.behavior.hang_navigation {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.behavior.fail_navigation {
                return Err(ExtractError::navigation(
                    url,
                    "navigate",
                    Some(anyhow::anyhow!("net::ERR_NAME_NOT_RESOLVED")),
                ));
            }
            Ok(())
        }

        async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> bool {
            !self
                .behavior
                .missing_wait_selectors
                .iter()
                .any(|missing| missing == selector)
        }

        async fn content(&mut self) -> Result<String, ExtractError> {
            Ok(self.behavior.html.clone())
        }

        async fn screenshot(&mut self) -> anyhow::Result<Vec<u8>> {
            Ok(self.behavior.screenshot.clone())
        }

        async fn close(&mut self) {
            self.counter.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn mock_client(behavior: MockBehavior) -> (Client, Arc<SessionCounter>) {
        mock_client_with(behavior, Client::builder())
    }

    fn mock_client_with(
        behavior: MockBehavior,
        builder: ClientBuilder,
    ) -> (Client, Arc<SessionCounter>) {
        let counter = Arc::new(SessionCounter::default());
        let manager = MockSessionManager {
            behavior,
            counter: Arc::clone(&counter),
        };
        let client = builder
            .registry(test_registry())
            .session_manager(Arc::new(manager))
            .build();
        (client, counter)
    }

    #[tokio::test]
    async fn test_extract_complete_article() {
        let (client, counter) = mock_client(MockBehavior {
            html: ARTICLE_HTML.to_string(),
            ..Default::default()
        });

        let record = client.extract("pruebas", PAGE_URL).await.expect("extract");

        assert_eq!(record.title, "Renuncia el secretario");
        assert_eq!(record.body_text, CLEANED_BODY);
        assert_eq!(record.image_url, "https://pruebas.example/img/portada.jpg");
        assert_eq!(record.extraction_status, ExtractionStatus::Ok);
        assert!(record.is_complete());

        assert_eq!(counter.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counter.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_extract_unknown_site_opens_no_session() {
        let (client, counter) = mock_client(MockBehavior::default());

        let err = client
            .extract("desconocido", PAGE_URL)
            .await
            .unwrap_err();

        assert!(err.is_unknown_site());
        assert_eq!(counter.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_navigation_failure_closes_session() {
        let (client, counter) = mock_client(MockBehavior {
            fail_navigation: true,
            ..Default::default()
        });

        let err = client.extract("pruebas", PAGE_URL).await.unwrap_err();

        assert!(err.is_navigation());
        assert_eq!(counter.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counter.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_writes_screenshot_when_configured() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shot_path = dir.path().join("fallo.png");
        let png = vec![0x89, b'P', b'N', b'G'];

        let (client, _) = mock_client_with(
            MockBehavior {
                fail_navigation: true,
                screenshot: png.clone(),
                ..Default::default()
            },
            Client::builder().failure_screenshot(&shot_path),
        );

        let err = client.extract("pruebas", PAGE_URL).await.unwrap_err();

        assert!(err.is_navigation());
        assert_eq!(std::fs::read(&shot_path).expect("screenshot file"), png);
    }

    #[tokio::test]
    async fn test_no_screenshot_without_configuration() {
        let (client, _) = mock_client(MockBehavior {
            fail_navigation: true,
            screenshot: vec![1, 2, 3],
            ..Default::default()
        });

        let err = client.extract("pruebas", PAGE_URL).await.unwrap_err();
        assert!(err.is_navigation());
    }

    #[tokio::test]
    async fn test_deadline_cancellation_still_closes_session() {
        let (client, counter) = mock_client_with(
            MockBehavior {
                hang_navigation: true,
                ..Default::default()
            },
            Client::builder().deadline(Duration::from_millis(50)),
        );

        let err = client.extract("pruebas", PAGE_URL).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(counter.opened.load(Ordering::SeqCst), 1);
        assert_eq!(counter.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_wait_selector_does_not_abort() {
        let (client, counter) = mock_client(MockBehavior {
            html: ARTICLE_HTML.to_string(),
            missing_wait_selectors: vec!["h1.headline".to_string()],
            ..Default::default()
        });

        let record = client.extract("pruebas", PAGE_URL).await.expect("extract");

        assert_eq!(record.extraction_status, ExtractionStatus::Ok);
        assert_eq!(counter.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_title_degrades_to_partial() {
        let (client, _) = mock_client(MockBehavior {
            html: NO_TITLE_HTML.to_string(),
            ..Default::default()
        });

        let record = client.extract("pruebas", PAGE_URL).await.expect("extract");

        assert_eq!(
            record.extraction_status,
            ExtractionStatus::PartialMissingTitle
        );
        assert!(record.title.is_empty());
        assert_eq!(record.body_text, "Solo cuerpo disponible.");
        assert_eq!(record.image_url, "https://cdn.example.com/abs.jpg");
        assert!(record.is_partial());
    }

    #[tokio::test]
    async fn test_extract_from_html_complete() {
        let client = Client::builder().registry(test_registry()).build();

        let record = client
            .extract_from_html("pruebas", PAGE_URL, ARTICLE_HTML)
            .await
            .expect("extract");

        assert_eq!(record.title, "Renuncia el secretario");
        assert_eq!(record.body_text, CLEANED_BODY);
        assert_eq!(record.extraction_status, ExtractionStatus::Ok);
    }

    #[tokio::test]
    async fn test_extract_from_html_unknown_site() {
        let client = Client::builder().registry(test_registry()).build();

        let err = client
            .extract_from_html("desconocido", PAGE_URL, ARTICLE_HTML)
            .await
            .unwrap_err();
        assert!(err.is_unknown_site());
    }

    #[tokio::test]
    async fn test_missing_body_degrades_to_partial() {
        let client = Client::builder().registry(test_registry()).build();

        let record = client
            .extract_from_html("pruebas", PAGE_URL, NO_BODY_HTML)
            .await
            .expect("extract");

        assert_eq!(
            record.extraction_status,
            ExtractionStatus::PartialMissingBody
        );
        assert_eq!(record.title, "Titular sin cuerpo");
        assert_eq!(record.word_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_partial_only_when_profile_wants_one() {
        let client = Client::builder().registry(test_registry()).build();
        let record = client
            .extract_from_html("pruebas", PAGE_URL, NO_IMAGE_HTML)
            .await
            .expect("extract");
        assert_eq!(
            record.extraction_status,
            ExtractionStatus::PartialMissingImage
        );

        let mut imageless = test_profile();
        imageless.site_id = "sin-foto".to_string();
        imageless.image_sources.clear();
        let mut registry = ProfileRegistry::new();
        registry.register(imageless).expect("valid profile");
        let client = Client::builder().registry(registry).build();

        let record = client
            .extract_from_html("sin-foto", PAGE_URL, NO_IMAGE_HTML)
            .await
            .expect("extract");
        assert_eq!(record.extraction_status, ExtractionStatus::Ok);
        assert!(!record.has_image());
    }

    #[tokio::test]
    async fn test_title_fallback_chain() {
        let client = Client::builder().registry(test_registry()).build();

        let record = client
            .extract_from_html("pruebas", PAGE_URL, FALLBACK_TITLE_HTML)
            .await
            .expect("extract");

        assert_eq!(record.title, "Titular alterno");
    }

    #[tokio::test]
    async fn test_site_ids_uses_builtin_registry_by_default() {
        let client = Client::builder().build();
        let sites = client.site_ids();
        assert!(sites.contains(&"milenio".to_string()));
        assert!(sites.contains(&"el-universal".to_string()));
        assert_eq!(sites.len(), 11);
    }

    #[test]
    fn test_resolve_image_url_absolute_passthrough() {
        assert_eq!(
            resolve_image_url("https://cdn.example.com/a.jpg", None, PAGE_URL),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_resolve_image_url_relative_with_prefix() {
        assert_eq!(
            resolve_image_url("/img/a.jpg", Some("https://diario.example"), PAGE_URL),
            "https://diario.example/img/a.jpg"
        );
        // A trailing slash on the prefix must not double up.
        assert_eq!(
            resolve_image_url("/imagenes/foto.jpg", Some("https://gluc.mx/"), PAGE_URL),
            "https://gluc.mx/imagenes/foto.jpg"
        );
    }

    #[test]
    fn test_resolve_image_url_falls_back_to_page_url() {
        assert_eq!(
            resolve_image_url("/img/a.jpg", None, PAGE_URL),
            "https://pruebas.example/img/a.jpg"
        );
        assert_eq!(
            resolve_image_url("portada.jpg", None, "https://pruebas.example/seccion/nota"),
            "https://pruebas.example/seccion/portada.jpg"
        );
    }

    #[test]
    fn test_resolve_image_url_protocol_relative() {
        assert_eq!(
            resolve_image_url("//cdn.example.com/a.jpg", None, PAGE_URL),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_resolve_image_url_unresolvable_is_empty() {
        assert_eq!(resolve_image_url("", None, PAGE_URL), "");
        assert_eq!(
            resolve_image_url("/img/a.jpg", Some("sin-esquema"), PAGE_URL),
            ""
        );
    }
}
