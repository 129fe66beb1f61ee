//! Route parsing for clean paths and legacy query-string URLs.
//!
//! Parsing is a priority-ordered match: reserved prefixes (admin, search,
//! legacy `.html` templates) are checked before the segment-count rules, and
//! legacy query parameters are only consulted when the path alone does not
//! identify the page.

use url::form_urlencoded;

const ADMIN_SEGMENT: &str = "admin";
const SEARCH_SEGMENT: &str = "search";

/// Structured description of a navigation target, produced fresh on every
/// navigation and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Category {
        category: String,
        subcategory: Option<String>,
    },
    Post {
        category: Option<String>,
        subcategory: Option<String>,
        slug: Option<String>,
        id: Option<String>,
    },
    Search {
        query: Option<String>,
    },
    Admin,
    Unknown {
        path: String,
    },
}

impl Route {
    /// Parse a path with an optional query string (`/dsa/array/two-sum/`,
    /// `/blog-single.html?id=abc`, `/category.html?category=dsa`).
    pub fn parse(target: &str) -> Route {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let route = parse_parts(path, query);
        match route {
            // The path alone did not identify the page; legacy query
            // parameters get a say before the route is given up on.
            Route::Unknown { .. } => query_fallback(query).unwrap_or(route),
            Route::Home if query.is_some() => query_fallback(query).unwrap_or(route),
            _ => route,
        }
    }
}

fn parse_parts(path: &str, query: Option<&str>) -> Route {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();

    // Reserved prefixes win over the segment-count rules.
    if segments.first() == Some(&ADMIN_SEGMENT) || path.contains("admin-") {
        return Route::Admin;
    }
    if segments.first() == Some(&SEARCH_SEGMENT) || path.contains("search.html") {
        return Route::Search {
            query: query_param(query, "q"),
        };
    }

    // Legacy template paths carry their route in the query string.
    if let Some(template) = segments.first().filter(|segment| segment.ends_with(".html")) {
        return parse_legacy_template(template, query, path);
    }

    match segments.as_slice() {
        [] => Route::Home,
        [category] => Route::Category {
            category: (*category).to_string(),
            subcategory: None,
        },
        ["post", slug] => Route::Post {
            category: None,
            subcategory: None,
            slug: Some((*slug).to_string()),
            id: None,
        },
        [category, subcategory] => Route::Category {
            category: (*category).to_string(),
            subcategory: Some((*subcategory).to_string()),
        },
        [category, subcategory, slug] => Route::Post {
            category: Some((*category).to_string()),
            subcategory: Some((*subcategory).to_string()),
            slug: Some((*slug).to_string()),
            id: None,
        },
        _ => Route::Unknown {
            path: path.to_string(),
        },
    }
}

fn parse_legacy_template(template: &str, query: Option<&str>, path: &str) -> Route {
    match template {
        "index.html" => Route::Home,
        "category.html" => match query_param(query, "category") {
            Some(category) => Route::Category {
                category,
                subcategory: query_param(query, "subcategory"),
            },
            None => Route::Unknown {
                path: path.to_string(),
            },
        },
        "blog-single.html" => {
            let slug = query_param(query, "slug");
            let id = query_param(query, "id");
            if slug.is_none() && id.is_none() {
                return Route::Unknown {
                    path: path.to_string(),
                };
            }
            Route::Post {
                category: query_param(query, "category"),
                subcategory: query_param(query, "subcategory"),
                slug,
                id,
            }
        }
        _ => Route::Unknown {
            path: path.to_string(),
        },
    }
}

fn query_fallback(query: Option<&str>) -> Option<Route> {
    let slug = query_param(query, "slug");
    let id = query_param(query, "id");
    if slug.is_some() || id.is_some() {
        return Some(Route::Post {
            category: query_param(query, "category"),
            subcategory: query_param(query, "subcategory"),
            slug,
            id,
        });
    }

    query_param(query, "category").map(|category| Route::Category {
        category,
        subcategory: query_param(query, "subcategory"),
    })
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(name, value)| name == key && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_parses_as_home() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
    }

    #[test]
    fn single_segment_parses_as_category() {
        assert_eq!(
            Route::parse("/dsa/"),
            Route::Category {
                category: "dsa".to_string(),
                subcategory: None,
            }
        );
    }

    #[test]
    fn two_segments_parse_as_subcategory() {
        assert_eq!(
            Route::parse("/dsa/array/"),
            Route::Category {
                category: "dsa".to_string(),
                subcategory: Some("array".to_string()),
            }
        );
    }

    #[test]
    fn three_segments_parse_as_post() {
        assert_eq!(
            Route::parse("/dsa/array/two-sum/"),
            Route::Post {
                category: Some("dsa".to_string()),
                subcategory: Some("array".to_string()),
                slug: Some("two-sum".to_string()),
                id: None,
            }
        );
    }

    #[test]
    fn flat_post_prefix_is_reserved() {
        assert_eq!(
            Route::parse("/post/two-sum/"),
            Route::Post {
                category: None,
                subcategory: None,
                slug: Some("two-sum".to_string()),
                id: None,
            }
        );
    }

    #[test]
    fn reserved_prefixes_beat_segment_rules() {
        assert_eq!(Route::parse("/admin/"), Route::Admin);
        assert_eq!(Route::parse("/admin-dashboard.html"), Route::Admin);
        assert_eq!(
            Route::parse("/search/?q=flexbox"),
            Route::Search {
                query: Some("flexbox".to_string()),
            }
        );
        assert_eq!(
            Route::parse("/search.html?q=flexbox"),
            Route::Search {
                query: Some("flexbox".to_string()),
            }
        );
    }

    #[test]
    fn legacy_post_queries_are_supported() {
        assert_eq!(
            Route::parse("/blog-single.html?id=abc123"),
            Route::Post {
                category: None,
                subcategory: None,
                slug: None,
                id: Some("abc123".to_string()),
            }
        );
        assert_eq!(
            Route::parse("/blog-single.html?category=dsa&subcategory=array&slug=two-sum"),
            Route::Post {
                category: Some("dsa".to_string()),
                subcategory: Some("array".to_string()),
                slug: Some("two-sum".to_string()),
                id: None,
            }
        );
    }

    #[test]
    fn legacy_category_query_is_supported() {
        assert_eq!(
            Route::parse("/category.html?category=web-development&subcategory=frontend"),
            Route::Category {
                category: "web-development".to_string(),
                subcategory: Some("frontend".to_string()),
            }
        );
    }

    #[test]
    fn legacy_template_without_identifiers_is_unknown() {
        assert_eq!(
            Route::parse("/blog-single.html"),
            Route::Unknown {
                path: "/blog-single.html".to_string(),
            }
        );
    }

    #[test]
    fn extra_segments_are_unknown() {
        assert_eq!(
            Route::parse("/a/b/c/d/"),
            Route::Unknown {
                path: "/a/b/c/d/".to_string(),
            }
        );
    }

    #[test]
    fn empty_query_values_are_ignored() {
        assert_eq!(Route::parse("/search/?q="), Route::Search { query: None });
    }

    #[test]
    fn bare_query_identifiers_fall_back_to_routes() {
        assert_eq!(
            Route::parse("?id=abc123"),
            Route::Post {
                category: None,
                subcategory: None,
                slug: None,
                id: Some("abc123".to_string()),
            }
        );
        assert_eq!(
            Route::parse("/?slug=two-sum"),
            Route::Post {
                category: None,
                subcategory: None,
                slug: Some("two-sum".to_string()),
                id: None,
            }
        );
        assert_eq!(
            Route::parse("?category=dsa"),
            Route::Category {
                category: "dsa".to_string(),
                subcategory: None,
            }
        );
        // Tracking parameters alone do not change the route.
        assert_eq!(Route::parse("/?ref=newsletter"), Route::Home);
    }

    #[test]
    fn unknown_paths_consult_the_query_string() {
        assert_eq!(
            Route::parse("/a/b/c/d/?slug=two-sum"),
            Route::Post {
                category: None,
                subcategory: None,
                slug: Some("two-sum".to_string()),
                id: None,
            }
        );
    }
}
