//! Best-effort SEO surface updates: titles, canonical links, social meta
//! tags, and embedded structured data.
//!
//! Nothing here is allowed to fail a page load. Malformed existing data is
//! logged and left alone; the tags are enrichment, not a requirement.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use tracing::warn;
use url::form_urlencoded;

use crate::config::SiteSettings;
use crate::domain::entities::{CategoryRecord, PostRecord};
use crate::domain::route::Route;
use crate::domain::urls::{self, Breadcrumb};

/// In-memory model of the mutable parts of the document `<head>`.
#[derive(Debug, Clone, Default)]
pub struct DocumentHead {
    pub title: String,
    pub description: Option<String>,
    pub canonical: Option<String>,
    meta: BTreeMap<String, String>,
    /// Raw JSON-LD block, if the page carries one.
    pub structured_data: Option<String>,
}

impl DocumentHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta(&self, property: &str) -> Option<&str> {
        self.meta.get(property).map(String::as_str)
    }

    pub fn set_meta(&mut self, property: impl Into<String>, content: impl Into<String>) {
        self.meta.insert(property.into(), content.into());
    }
}

/// Document title for a route, mirroring the site's `Title - Site` scheme.
pub fn page_title(settings: &SiteSettings, route: &Route, custom: Option<&str>) -> String {
    let site = settings.site_name.as_str();

    if let Some(custom) = custom {
        return format!("{custom} - {site}");
    }

    match route {
        Route::Category {
            category,
            subcategory,
        } => {
            let category = urls::format_category_name(category);
            match subcategory {
                Some(subcategory) => {
                    let subcategory = urls::format_category_name(subcategory);
                    format!("{category} - {subcategory} - {site}")
                }
                None => format!("{category} - {site}"),
            }
        }
        Route::Search { query } => match query {
            Some(query) => format!("Search Results for \"{query}\" - {site}"),
            None => format!("Search - {site}"),
        },
        _ => site.to_string(),
    }
}

/// Update the head for a resolved post at its canonical URL.
pub fn sync_post_head(
    head: &mut DocumentHead,
    settings: &SiteSettings,
    post: &PostRecord,
    canonical_url: &str,
) {
    let title = format!("{} - {}", post.title, settings.site_name);
    head.title = title.clone();
    head.description = Some(post.excerpt.clone());
    head.canonical = Some(canonical_url.to_string());

    let image = post
        .featured_image
        .clone()
        .unwrap_or_else(|| settings.default_image_url());
    apply_social_meta(head, &title, &post.excerpt, canonical_url, &image);

    update_structured_data(head, post, canonical_url);
}

/// Update the head for a listing route (home, category, search).
pub fn sync_listing_head(
    head: &mut DocumentHead,
    settings: &SiteSettings,
    route: &Route,
    canonical_url: &str,
) {
    let title = page_title(settings, route, None);
    head.title = title.clone();
    head.description = Some(settings.description.clone());
    head.canonical = Some(canonical_url.to_string());

    let image = settings.default_image_url();
    apply_social_meta(head, &title, &settings.description, canonical_url, &image);
}

fn apply_social_meta(
    head: &mut DocumentHead,
    title: &str,
    description: &str,
    url: &str,
    image: &str,
) {
    head.set_meta("og:title", title);
    head.set_meta("og:description", description);
    head.set_meta("og:url", url);
    head.set_meta("og:image", image);
    head.set_meta("twitter:title", title);
    head.set_meta("twitter:description", description);
    head.set_meta("twitter:url", url);
    head.set_meta("twitter:image", image);
}

/// Rewrite the identity, URL, and date fields of the page's JSON-LD block in
/// place, preserving everything else the block already carries.
fn update_structured_data(head: &mut DocumentHead, post: &PostRecord, canonical_url: &str) {
    let Some(block) = head.structured_data.as_deref() else {
        return;
    };

    let mut data: Value = match serde_json::from_str(block) {
        Ok(data) => data,
        Err(error) => {
            warn!(error = %error, "malformed structured data block, leaving untouched");
            return;
        }
    };
    let Some(object) = data.as_object_mut() else {
        warn!("structured data block is not an object, leaving untouched");
        return;
    };

    object.insert("headline".to_string(), json!(post.title));
    object.insert("description".to_string(), json!(post.excerpt));
    object.insert("url".to_string(), json!(canonical_url));

    if let Some(image) = &post.featured_image {
        object.insert("image".to_string(), json!(image));
    }
    if let Some(author) = &post.author {
        if let Some(Value::Object(author_object)) = object.get_mut("author") {
            author_object.insert("name".to_string(), json!(author));
        }
    }

    if let Ok(published) = post.publish_date.format(&Rfc3339) {
        object.insert("datePublished".to_string(), json!(published));
    }
    if let Ok(modified) = post.modified_at().format(&Rfc3339) {
        object.insert("dateModified".to_string(), json!(modified));
    }

    if let Some(Value::Object(main_entity)) = object.get_mut("mainEntityOfPage") {
        main_entity.insert("@id".to_string(), json!(canonical_url));
    }

    match serde_json::to_string_pretty(&data) {
        Ok(serialized) => head.structured_data = Some(serialized),
        Err(error) => warn!(error = %error, "failed to serialize structured data"),
    }
}

/// Fresh BlogPosting structured data for a post.
pub fn article_structured_data(
    settings: &SiteSettings,
    post: &PostRecord,
    canonical_url: &str,
) -> Value {
    let published = post
        .publish_date
        .format(&Rfc3339)
        .unwrap_or_else(|_| post.publish_date.to_string());
    let modified = post
        .modified_at()
        .format(&Rfc3339)
        .unwrap_or_else(|_| post.modified_at().to_string());

    let mut data = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "name": post.title,
        "description": post.excerpt,
        "datePublished": published,
        "dateModified": modified,
        "author": {
            "@type": "Person",
            "name": post.author.clone().unwrap_or_else(|| settings.default_author.clone()),
        },
        "publisher": {
            "@type": "Organization",
            "name": settings.site_name,
            "logo": {
                "@type": "ImageObject",
                "url": settings.default_image_url(),
            },
        },
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": canonical_url,
        },
    });

    if let Some(object) = data.as_object_mut() {
        if let Some(image) = &post.featured_image {
            object.insert("image".to_string(), json!(image));
        }
        if let Some(category) = &post.category {
            object.insert("articleSection".to_string(), json!(category));
        }
        if !post.tags.is_empty() {
            object.insert("keywords".to_string(), json!(post.tags.join(", ")));
        }
    }

    data
}

/// BreadcrumbList structured data for a breadcrumb trail.
pub fn breadcrumb_structured_data(settings: &SiteSettings, crumbs: &[Breadcrumb]) -> Value {
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(index, crumb)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": crumb.name,
                "item": urls::absolute_url(&settings.base_url, &crumb.url),
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}

/// ItemList structured data over a post listing; every URL is canonical.
pub fn article_list_structured_data(
    settings: &SiteSettings,
    posts: &[PostRecord],
    list_title: &str,
) -> Value {
    let items: Vec<Value> = posts
        .iter()
        .enumerate()
        .map(|(index, post)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "url": urls::absolute_url(&settings.base_url, &urls::post_url(post)),
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "name": list_title,
        "itemListElement": items,
    })
}

/// Structured data for categories in site-level listings.
pub fn category_list_structured_data(
    settings: &SiteSettings,
    categories: &[CategoryRecord],
) -> Value {
    let items: Vec<Value> = categories
        .iter()
        .enumerate()
        .map(|(index, category)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": category.name,
                "url": urls::absolute_url(&settings.base_url, &urls::category_url(&category.slug, None)),
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "itemListElement": items,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    pub facebook: String,
    pub twitter: String,
    pub linkedin: String,
    pub pinterest: String,
    pub telegram: String,
    pub email: String,
}

/// Social sharing URLs for a page.
pub fn share_links(url: &str, title: &str, description: &str, image_url: &str) -> ShareLinks {
    let url = encode_component(url);
    let title = encode_component(title);
    let description = encode_component(description);
    let image = encode_component(image_url);

    ShareLinks {
        facebook: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
        twitter: format!("https://twitter.com/intent/tweet?url={url}&text={title}"),
        linkedin: format!("https://www.linkedin.com/sharing/share-offsite/?url={url}"),
        pinterest: format!(
            "https://pinterest.com/pin/create/button/?url={url}&description={title}&media={image}"
        ),
        telegram: format!("https://t.me/share/url?url={url}&text={title}"),
        email: format!("mailto:?subject={title}&body={description}%0A%0A{url}"),
    }
}

fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
