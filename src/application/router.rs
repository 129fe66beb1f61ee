//! Client-side navigation state machine for clean URLs.
//!
//! The router maps a parsed route to one of three fetchable page templates,
//! swaps in the fetched markup, and mirrors the route into a virtual query
//! string so page code written against the legacy `?category=&slug=`
//! convention keeps working unmodified. A single Idle/Loading latch guards
//! navigation: events arriving mid-load are dropped, and a failed template
//! fetch falls back to a full browser navigation instead of leaving the UI
//! broken. In-flight fetches are never aborted; stale results are simply
//! ignored once the latch has moved on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::domain::route::Route;

/// The three markup templates the router can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTemplate {
    Home,
    Category,
    Post,
}

impl PageTemplate {
    /// Asset name of the template document.
    pub fn asset(self) -> &'static str {
        match self {
            PageTemplate::Home => "index.html",
            PageTemplate::Category => "category.html",
            PageTemplate::Post => "blog-single.html",
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to load template `{asset}`: {message}")]
pub struct TemplateFetchError {
    pub asset: &'static str,
    pub message: String,
}

/// Fetches raw template markup; implemented by the hosting environment.
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    async fn fetch(&self, template: PageTemplate) -> Result<String, TemplateFetchError>;
}

/// History directive accompanying a loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// Push a new history entry for the clean path.
    Push { path: String },
    /// Leave history untouched (initial load, back/forward).
    None,
}

#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub template: PageTemplate,
    pub markup: String,
    pub route: Route,
    pub history: HistoryUpdate,
    /// Internal legacy-form URL carrying the parsed route fields, stored in
    /// history state so legacy page-initialization code can read its
    /// parameters as if the query string were real.
    pub virtual_query: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Navigation {
    Loaded(LoadedPage),
    /// Template fetch failed; the host must perform a full browser
    /// navigation to this URL.
    HardReload { url: String },
    /// A navigation was already in flight; this event was ignored.
    Dropped,
}

#[derive(Default)]
struct RouterState {
    current_route: Option<Route>,
    virtual_query: Option<String>,
}

pub struct SpaRouter {
    fetcher: Arc<dyn TemplateFetcher>,
    loading: AtomicBool,
    state: Mutex<RouterState>,
}

impl SpaRouter {
    pub fn new(fetcher: Arc<dyn TemplateFetcher>) -> Self {
        Self {
            fetcher,
            loading: AtomicBool::new(false),
            state: Mutex::new(RouterState::default()),
        }
    }

    /// Whether an anchor click on `href` should be handled in-app.
    ///
    /// External links, fragments, admin pages, the search page, and direct
    /// `.html` asset links all take the normal browser navigation.
    pub fn should_intercept(href: &str) -> bool {
        if href.is_empty() || href.starts_with("http") || href.starts_with('#') {
            return false;
        }
        if href.contains("admin-") || href.contains("search.html") {
            return false;
        }
        href.starts_with('/') && !href.contains(".html")
    }

    /// Forward navigation (intercepted link click): pushes a history entry.
    pub async fn navigate_to(&self, path: &str) -> Navigation {
        self.handle(path, true).await
    }

    /// Non-pushing navigation: initial load and `popstate` (back/forward).
    pub async fn handle_route(&self, path: &str) -> Navigation {
        self.handle(path, false).await
    }

    /// Parameters carried by the current virtual query string.
    pub fn virtual_params(&self) -> Vec<(String, String)> {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(virtual_query) = &state.virtual_query else {
            return Vec::new();
        };
        let query = virtual_query.split_once('?').map(|(_, q)| q).unwrap_or("");
        form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn current_route(&self) -> Option<Route> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .current_route
            .clone()
    }

    async fn handle(&self, path: &str, push: bool) -> Navigation {
        // Idle/Loading latch: concurrent events are dropped, not queued.
        if self.loading.swap(true, Ordering::SeqCst) {
            counter!("codetocrack_router_dropped_total").increment(1);
            return Navigation::Dropped;
        }

        let navigation = self.load(path, push).await;
        self.loading.store(false, Ordering::SeqCst);
        navigation
    }

    async fn load(&self, path: &str, push: bool) -> Navigation {
        counter!("codetocrack_router_navigation_total").increment(1);
        let route = Route::parse(path);
        debug!(path, ?route, "handling route");

        let template = template_for(&route);
        let virtual_query = virtual_query_for(&route);

        match self.fetcher.fetch(template).await {
            Ok(markup) => {
                {
                    let mut state = self
                        .state
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    state.current_route = Some(route.clone());
                    state.virtual_query = virtual_query.clone();
                }

                let history = if push {
                    HistoryUpdate::Push {
                        path: path.to_string(),
                    }
                } else {
                    HistoryUpdate::None
                };

                Navigation::Loaded(LoadedPage {
                    template,
                    markup,
                    route,
                    history,
                    virtual_query,
                })
            }
            Err(error) => {
                warn!(error = %error, "template fetch failed, falling back to full navigation");
                counter!("codetocrack_router_fallback_total").increment(1);
                Navigation::HardReload {
                    url: virtual_query.unwrap_or_else(|| path.to_string()),
                }
            }
        }
    }
}

fn template_for(route: &Route) -> PageTemplate {
    match route {
        Route::Category { .. } => PageTemplate::Category,
        Route::Post { .. } => PageTemplate::Post,
        Route::Home | Route::Search { .. } | Route::Admin | Route::Unknown { .. } => {
            PageTemplate::Home
        }
    }
}

fn virtual_query_for(route: &Route) -> Option<String> {
    match route {
        Route::Category {
            category,
            subcategory,
        } => {
            let mut query = form_urlencoded::Serializer::new(String::new());
            query.append_pair("category", category);
            if let Some(subcategory) = subcategory {
                query.append_pair("subcategory", subcategory);
            }
            Some(format!("/category.html?{}", query.finish()))
        }
        Route::Post {
            category,
            subcategory,
            slug,
            id,
        } => {
            let mut query = form_urlencoded::Serializer::new(String::new());
            if let Some(category) = category {
                query.append_pair("category", category);
            }
            if let Some(subcategory) = subcategory {
                query.append_pair("subcategory", subcategory);
            }
            if let Some(slug) = slug {
                query.append_pair("slug", slug);
            }
            if let Some(id) = id {
                query.append_pair("id", id);
            }
            Some(format!("/blog-single.html?{}", query.finish()))
        }
        Route::Home | Route::Search { .. } | Route::Admin | Route::Unknown { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Notify;

    use super::*;

    struct StaticFetcher;

    #[async_trait]
    impl TemplateFetcher for StaticFetcher {
        async fn fetch(&self, template: PageTemplate) -> Result<String, TemplateFetchError> {
            Ok(format!("<html>{}</html>", template.asset()))
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl TemplateFetcher for FailingFetcher {
        async fn fetch(&self, template: PageTemplate) -> Result<String, TemplateFetchError> {
            Err(TemplateFetchError {
                asset: template.asset(),
                message: "network unreachable".to_string(),
            })
        }
    }

    struct GatedFetcher {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl TemplateFetcher for GatedFetcher {
        async fn fetch(&self, template: PageTemplate) -> Result<String, TemplateFetchError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(format!("<html>{}</html>", template.asset()))
        }
    }

    #[tokio::test]
    async fn routes_map_to_their_templates() {
        let router = SpaRouter::new(Arc::new(StaticFetcher));

        match router.handle_route("/").await {
            Navigation::Loaded(page) => assert_eq!(page.template, PageTemplate::Home),
            other => panic!("unexpected navigation: {other:?}"),
        }
        match router.handle_route("/dsa/array/").await {
            Navigation::Loaded(page) => assert_eq!(page.template, PageTemplate::Category),
            other => panic!("unexpected navigation: {other:?}"),
        }
        match router.handle_route("/dsa/array/two-sum/").await {
            Navigation::Loaded(page) => assert_eq!(page.template, PageTemplate::Post),
            other => panic!("unexpected navigation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn loaded_pages_carry_the_virtual_query() {
        let router = SpaRouter::new(Arc::new(StaticFetcher));

        match router.handle_route("/dsa/array/two-sum/").await {
            Navigation::Loaded(page) => {
                assert_eq!(
                    page.virtual_query.as_deref(),
                    Some("/blog-single.html?category=dsa&subcategory=array&slug=two-sum")
                );
            }
            other => panic!("unexpected navigation: {other:?}"),
        }

        let params = router.virtual_params();
        assert!(params.contains(&("slug".to_string(), "two-sum".to_string())));
        assert!(params.contains(&("category".to_string(), "dsa".to_string())));
    }

    #[tokio::test]
    async fn forward_navigation_pushes_history() {
        let router = SpaRouter::new(Arc::new(StaticFetcher));

        match router.navigate_to("/dsa/").await {
            Navigation::Loaded(page) => {
                assert_eq!(
                    page.history,
                    HistoryUpdate::Push {
                        path: "/dsa/".to_string()
                    }
                );
            }
            other => panic!("unexpected navigation: {other:?}"),
        }

        match router.handle_route("/dsa/").await {
            Navigation::Loaded(page) => assert_eq!(page.history, HistoryUpdate::None),
            other => panic!("unexpected navigation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_hard_reload() {
        let router = SpaRouter::new(Arc::new(FailingFetcher));

        match router.navigate_to("/dsa/array/").await {
            Navigation::HardReload { url } => {
                assert_eq!(url, "/category.html?category=dsa&subcategory=array");
            }
            other => panic!("unexpected navigation: {other:?}"),
        }
    }

    #[tokio::test]
    async fn navigation_while_loading_is_dropped() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let router = Arc::new(SpaRouter::new(Arc::new(GatedFetcher {
            entered: entered.clone(),
            release: release.clone(),
        })));

        let in_flight = {
            let router = router.clone();
            tokio::spawn(async move { router.navigate_to("/dsa/").await })
        };
        entered.notified().await;

        assert!(matches!(
            router.navigate_to("/web-development/").await,
            Navigation::Dropped
        ));

        release.notify_one();
        let finished = in_flight.await.expect("join navigation task");
        assert!(matches!(finished, Navigation::Loaded(_)));

        // The latch is released once the load completes.
        assert!(matches!(
            router.navigate_to("/web-development/").await,
            Navigation::Loaded(_)
        ));
    }

    #[test]
    fn link_interception_policy() {
        assert!(SpaRouter::should_intercept("/dsa/array/two-sum/"));
        assert!(SpaRouter::should_intercept("/web-development/"));
        assert!(!SpaRouter::should_intercept("https://example.com/"));
        assert!(!SpaRouter::should_intercept("#comments"));
        assert!(!SpaRouter::should_intercept("/admin-dashboard.html"));
        assert!(!SpaRouter::should_intercept("/search.html?q=rust"));
        assert!(!SpaRouter::should_intercept("/category.html?category=dsa"));
        assert!(!SpaRouter::should_intercept(""));
        assert!(!SpaRouter::should_intercept("relative/path"));
    }
}
