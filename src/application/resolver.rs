//! Post resolution with canonical URL reconciliation.
//!
//! Resolution prefers slugs and falls back to legacy store ids. Whenever the
//! URL the visitor arrived on differs from the post's canonical URL, the
//! caller receives an explicit signal describing how to correct the browser
//! location instead of rendering at the stale address.

use metrics::counter;
use thiserror::Error;

use crate::application::posts::{PostError, PostService};
use crate::application::store::StoreError;
use crate::domain::entities::PostRecord;
use crate::domain::route::Route;
use crate::domain::urls;

/// Identifier material extracted from a navigation target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostLocator {
    pub slug: Option<String>,
    pub id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl PostLocator {
    pub fn from_route(route: &Route) -> Option<PostLocator> {
        match route {
            Route::Post {
                category,
                subcategory,
                slug,
                id,
            } => Some(PostLocator {
                slug: slug.clone(),
                id: id.clone(),
                category: category.clone(),
                subcategory: subcategory.clone(),
            }),
            _ => None,
        }
    }
}

/// How the caller must correct the browser location, if at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalAction {
    /// The visited URL already is the canonical one.
    None,
    /// The visited URL names the wrong category context; load the canonical
    /// URL, replacing the current history entry.
    Redirect { url: String },
    /// The post was found via a legacy id; swap the visible URL for the
    /// clean form without reloading and without a new history entry.
    Rewrite { url: String },
}

#[derive(Debug, Clone)]
pub struct ResolvedPost {
    pub post: PostRecord,
    pub canonical: CanonicalAction,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("post not found")]
    NotFound,
    #[error("no slug or id to resolve")]
    MissingIdentifier,
    #[error(transparent)]
    Store(StoreError),
}

impl From<PostError> for ResolveError {
    fn from(error: PostError) -> Self {
        match error {
            PostError::NotFound => ResolveError::NotFound,
            PostError::Validation(_) => ResolveError::NotFound,
            PostError::Store(store) => ResolveError::Store(store),
        }
    }
}

#[derive(Clone)]
pub struct PostResolver {
    posts: PostService,
}

impl PostResolver {
    pub fn new(posts: PostService) -> Self {
        Self { posts }
    }

    /// Resolve a post from whatever identifiers the URL carried.
    ///
    /// Slug lookups only surface published posts; id lookups (admin and
    /// legacy URLs) impose no status filter. A successful resolution has
    /// already counted its view.
    pub async fn resolve(&self, locator: &PostLocator) -> Result<ResolvedPost, ResolveError> {
        let resolved_by_id;
        let post = if let Some(slug) = &locator.slug {
            resolved_by_id = false;
            self.posts.find_published_by_slug(slug).await?
        } else if let Some(id) = &locator.id {
            resolved_by_id = true;
            self.posts.find_by_id(id).await?
        } else {
            return Err(ResolveError::MissingIdentifier);
        };

        let canonical = reconcile(locator, &post, resolved_by_id);
        if matches!(canonical, CanonicalAction::Redirect { .. }) {
            counter!("codetocrack_canonical_redirect_total").increment(1);
        }

        Ok(ResolvedPost { post, canonical })
    }
}

fn reconcile(locator: &PostLocator, post: &PostRecord, resolved_by_id: bool) -> CanonicalAction {
    let category_mismatch = locator
        .category
        .as_deref()
        .is_some_and(|category| post.category.as_deref() != Some(category));
    let subcategory_mismatch = locator
        .subcategory
        .as_deref()
        .is_some_and(|subcategory| post.subcategory.as_deref() != Some(subcategory));

    if category_mismatch || subcategory_mismatch {
        return CanonicalAction::Redirect {
            url: urls::post_url(post),
        };
    }

    if resolved_by_id && locator.slug.is_none() && post.slug.is_some() {
        return CanonicalAction::Rewrite {
            url: urls::post_url(post),
        };
    }

    CanonicalAction::None
}
