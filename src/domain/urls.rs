//! Canonical URL construction: the single source for every emitted link.
//!
//! Every link that leaves the system (navigation, breadcrumbs, redirects,
//! sitemap, feeds, meta tags) is built here, so the emitted URLs always match
//! the routes the parser accepts.

use crate::domain::entities::PostRecord;
use crate::domain::route::Route;

/// Clean listing URL for a category or subcategory.
pub fn category_url(category: &str, subcategory: Option<&str>) -> String {
    match subcategory {
        Some(subcategory) => format!("/{category}/{subcategory}/"),
        None => format!("/{category}/"),
    }
}

/// Canonical URL for a post.
///
/// Falls back to the flat `/post/{slug}/` form when category context is
/// missing, and to the legacy id-based query form for posts that have not
/// been migrated to slugs yet.
pub fn post_url(post: &PostRecord) -> String {
    let Some(slug) = post.slug.as_deref() else {
        return format!("/blog-single.html?id={}", post.id);
    };

    match (post.category.as_deref(), post.subcategory.as_deref()) {
        (Some(category), Some(subcategory)) => format!("/{category}/{subcategory}/{slug}/"),
        _ => format!("/post/{slug}/"),
    }
}

/// Join a site origin and a path with exactly one separating slash.
pub fn absolute_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Human-readable display name for a slug (`web-development` → `Web Development`).
pub fn format_category_name(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
    pub current: bool,
}

impl Breadcrumb {
    fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            current: false,
        }
    }

    fn current(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            current: true,
        }
    }
}

/// Breadcrumb trail for a route. `current_title` names the final crumb on
/// post pages once the post is resolved.
pub fn breadcrumbs(route: &Route, current_title: Option<&str>) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb::link("Home", "/")];

    match route {
        Route::Category {
            category,
            subcategory,
        } => {
            crumbs.push(Breadcrumb::link(
                format_category_name(category),
                category_url(category, None),
            ));
            if let Some(subcategory) = subcategory {
                crumbs.push(Breadcrumb::link(
                    format_category_name(subcategory),
                    category_url(category, Some(subcategory)),
                ));
            }
        }
        Route::Post {
            category,
            subcategory,
            slug,
            ..
        } => {
            if let Some(category) = category {
                crumbs.push(Breadcrumb::link(
                    format_category_name(category),
                    category_url(category, None),
                ));
                if let Some(subcategory) = subcategory {
                    crumbs.push(Breadcrumb::link(
                        format_category_name(subcategory),
                        category_url(category, Some(subcategory)),
                    ));
                }
            }

            let name = current_title.unwrap_or("Loading...").to_string();
            let url = match (category, subcategory, slug) {
                (Some(category), Some(subcategory), Some(slug)) => {
                    format!("/{category}/{subcategory}/{slug}/")
                }
                (_, _, Some(slug)) => format!("/post/{slug}/"),
                _ => "#".to_string(),
            };
            crumbs.push(Breadcrumb::current(name, url));
        }
        Route::Search { query } => {
            let url = match query {
                Some(query) => format!("/search.html?q={query}"),
                None => "/search.html".to_string(),
            };
            crumbs.push(Breadcrumb::current("Search Results", url));
        }
        Route::Home | Route::Admin | Route::Unknown { .. } => {}
    }

    crumbs
}
