//! End-to-end flow over the in-memory store: category setup, post creation
//! with slug derivation, clean-URL navigation, canonical reconciliation, and
//! the admin-side comment/newsletter paths.

use std::sync::Arc;

use async_trait::async_trait;

use codetocrack::application::activity::ActivityService;
use codetocrack::application::categories::{CategoryService, CreateCategoryParams};
use codetocrack::application::comments::{AddCommentParams, CommentService};
use codetocrack::application::newsletter::{NewsletterError, NewsletterService};
use codetocrack::application::posts::{CreatePostParams, PostService, UpdatePostParams};
use codetocrack::application::resolver::{CanonicalAction, PostLocator, PostResolver};
use codetocrack::application::router::{
    Navigation, PageTemplate, SpaRouter, TemplateFetchError, TemplateFetcher,
};
use codetocrack::application::seo::{DocumentHead, sync_post_head};
use codetocrack::application::store::BlobStore;
use codetocrack::config::SiteSettings;
use codetocrack::domain::entities::SubcategoryEntry;
use codetocrack::domain::route::Route;
use codetocrack::domain::urls;
use codetocrack::infra::memory::{MemoryBlobStore, MemoryStore};

struct StaticFetcher;

#[async_trait]
impl TemplateFetcher for StaticFetcher {
    async fn fetch(&self, template: PageTemplate) -> Result<String, TemplateFetchError> {
        Ok(format!("<html><!-- {} --></html>", template.asset()))
    }
}

struct Site {
    store: Arc<MemoryStore>,
    blobs: Arc<MemoryBlobStore>,
    posts: PostService,
    categories: CategoryService,
    comments: CommentService,
    newsletter: NewsletterService,
    resolver: PostResolver,
    router: SpaRouter,
}

fn site() -> Site {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new("https://blobs.test"));
    let activity = ActivityService::new(store.clone());

    let posts = PostService::new(store.clone(), blobs.clone(), activity.clone());
    let categories = CategoryService::new(store.clone(), activity.clone());
    let comments = CommentService::new(store.clone(), activity.clone());
    let newsletter = NewsletterService::new(store.clone(), activity);
    let resolver = PostResolver::new(posts.clone());
    let router = SpaRouter::new(Arc::new(StaticFetcher));

    Site {
        store,
        blobs,
        posts,
        categories,
        comments,
        newsletter,
        resolver,
        router,
    }
}

fn flexbox_params(featured_image: Option<String>) -> CreatePostParams {
    CreatePostParams {
        title: "Intro to Flexbox".to_string(),
        content: "<p>Flexbox aligns items along a single axis.</p>".to_string(),
        excerpt: None,
        category: Some("web-development".to_string()),
        subcategory: Some("frontend".to_string()),
        author: Some("Ada".to_string()),
        author_img: None,
        featured_image,
        tags: vec!["css".to_string()],
        publish_date: None,
        status: None,
        featured: false,
        sticky: false,
    }
}

#[tokio::test]
async fn publishing_a_post_yields_a_canonical_clean_url() {
    let site = site();

    site.categories
        .create_category(CreateCategoryParams {
            name: "Web Development".to_string(),
            slug: None,
            description: "Web topics".to_string(),
            subcategories: vec![SubcategoryEntry {
                name: "Frontend".to_string(),
                slug: "frontend".to_string(),
                description: String::new(),
            }],
        })
        .await
        .expect("create category");

    let post = site
        .posts
        .create_post(flexbox_params(None))
        .await
        .expect("create post");

    assert_eq!(post.slug.as_deref(), Some("intro-to-flexbox"));
    assert_eq!(
        urls::post_url(&post),
        "/web-development/frontend/intro-to-flexbox/"
    );

    // The denormalized category counter followed the write.
    let category = site
        .categories
        .find_by_slug("web-development")
        .await
        .expect("category");
    assert_eq!(category.post_count, 1);

    // Derived category slug came from the name.
    assert_eq!(category.slug, "web-development");
}

#[tokio::test]
async fn clean_url_navigation_resolves_and_syncs_the_head() {
    let site = site();
    site.posts
        .create_post(flexbox_params(None))
        .await
        .expect("create post");

    // Navigate the SPA router to the clean URL.
    let navigation = site
        .router
        .navigate_to("/web-development/frontend/intro-to-flexbox/")
        .await;
    let page = match navigation {
        Navigation::Loaded(page) => page,
        other => panic!("unexpected navigation: {other:?}"),
    };
    assert_eq!(page.template, PageTemplate::Post);

    // Legacy page code reads its parameters from the virtual query string.
    let params = site.router.virtual_params();
    assert!(params.contains(&("slug".to_string(), "intro-to-flexbox".to_string())));

    // Resolve the post from the parsed route.
    let locator = PostLocator::from_route(&page.route).expect("post route");
    let resolved = site.resolver.resolve(&locator).await.expect("resolve");
    assert_eq!(resolved.canonical, CanonicalAction::None);

    // Head sync points every tag at the canonical URL.
    let settings = SiteSettings::default();
    let canonical = urls::absolute_url(&settings.base_url, &urls::post_url(&resolved.post));
    let mut head = DocumentHead::new();
    sync_post_head(&mut head, &settings, &resolved.post, &canonical);

    assert_eq!(head.canonical.as_deref(), Some(canonical.as_str()));
    assert_eq!(head.meta("og:url"), Some(canonical.as_str()));
    assert_eq!(
        canonical,
        "https://www.codetocrack.dev/web-development/frontend/intro-to-flexbox/"
    );
}

#[tokio::test]
async fn legacy_id_urls_rewrite_to_the_clean_form() {
    let site = site();
    let post = site
        .posts
        .create_post(flexbox_params(None))
        .await
        .expect("create post");

    let legacy = format!("/blog-single.html?id={}", post.id);
    let route = Route::parse(&legacy);
    let locator = PostLocator::from_route(&route).expect("post route");

    let resolved = site.resolver.resolve(&locator).await.expect("resolve");
    assert_eq!(
        resolved.canonical,
        CanonicalAction::Rewrite {
            url: "/web-development/frontend/intro-to-flexbox/".to_string()
        }
    );
}

#[tokio::test]
async fn stale_category_urls_redirect_to_the_canonical_post_url() {
    let site = site();
    site.posts
        .create_post(flexbox_params(None))
        .await
        .expect("create post");

    let route = Route::parse("/dsa/frontend/intro-to-flexbox/");
    let locator = PostLocator::from_route(&route).expect("post route");

    let resolved = site.resolver.resolve(&locator).await.expect("resolve");
    assert_eq!(
        resolved.canonical,
        CanonicalAction::Redirect {
            url: "/web-development/frontend/intro-to-flexbox/".to_string()
        }
    );
}

#[tokio::test]
async fn retitling_a_post_moves_its_slug() {
    let site = site();
    let post = site
        .posts
        .create_post(flexbox_params(None))
        .await
        .expect("create post");

    let updated = site
        .posts
        .update_post(
            &post.id,
            UpdatePostParams {
                title: Some("Intro to CSS Grid".to_string()),
                ..UpdatePostParams::default()
            },
        )
        .await
        .expect("update post");

    assert_eq!(updated.slug.as_deref(), Some("intro-to-css-grid"));

    // The old slug no longer resolves publicly.
    let stale = PostLocator {
        slug: Some("intro-to-flexbox".to_string()),
        ..PostLocator::default()
    };
    assert!(site.resolver.resolve(&stale).await.is_err());

    let fresh = PostLocator {
        slug: Some("intro-to-css-grid".to_string()),
        ..PostLocator::default()
    };
    assert!(site.resolver.resolve(&fresh).await.is_ok());
}

#[tokio::test]
async fn deleting_a_post_cleans_up_its_image_and_counter() {
    let site = site();

    site.categories
        .create_category(CreateCategoryParams {
            name: "Web Development".to_string(),
            slug: None,
            description: String::new(),
            subcategories: Vec::new(),
        })
        .await
        .expect("create category");

    let image_url = site
        .blobs
        .upload("posts/flexbox.png", b"png-bytes", "image/png")
        .await
        .expect("upload image");

    let post = site
        .posts
        .create_post(flexbox_params(Some(image_url.clone())))
        .await
        .expect("create post");

    site.posts.delete_post(&post.id).await.expect("delete post");

    assert!(!site.blobs.contains(&image_url));
    let category = site
        .categories
        .find_by_slug("web-development")
        .await
        .expect("category");
    assert_eq!(category.post_count, 0);
}

#[tokio::test]
async fn comments_flow_through_the_moderation_queue() {
    let site = site();
    let post = site
        .posts
        .create_post(flexbox_params(None))
        .await
        .expect("create post");

    let comment = site
        .comments
        .add_comment(AddCommentParams {
            post_id: post.id.clone(),
            author_name: "Grace".to_string(),
            author_email: "grace@example.test".to_string(),
            author_website: None,
            content: "Great walkthrough!".to_string(),
            parent_comment_id: None,
        })
        .await
        .expect("add comment");

    // Unapproved comments are invisible to the public listing.
    assert!(site.comments.comments_for_post(&post.id, false).await.is_empty());
    assert_eq!(site.comments.pending_comments().await.len(), 1);

    site.comments
        .approve_comment(&comment.id)
        .await
        .expect("approve comment");

    let visible = site.comments.comments_for_post(&post.id, false).await;
    assert_eq!(visible.len(), 1);
    assert!(visible[0].approved);
    assert!(site.comments.pending_comments().await.is_empty());
}

#[tokio::test]
async fn newsletter_rejects_duplicates_and_keeps_unsubscribed_records() {
    let site = site();

    site.newsletter
        .subscribe("ada@example.test")
        .await
        .expect("subscribe");

    assert!(matches!(
        site.newsletter.subscribe("ada@example.test").await,
        Err(NewsletterError::AlreadySubscribed)
    ));

    site.newsletter
        .unsubscribe("ada@example.test")
        .await
        .expect("unsubscribe");

    assert!(site.newsletter.subscribers(true).await.is_empty());
    assert_eq!(site.newsletter.subscribers(false).await.len(), 1);
}

#[tokio::test]
async fn slug_backfill_migrates_pre_slug_posts() {
    let site = site();

    // A post written before slugs existed: seeded directly, no slug field.
    let legacy = serde_json::json!({
        "title": "Binary Search Basics",
        "content": "<p>Halve the range.</p>",
        "excerpt": "Halve the range.",
        "category": "dsa",
        "subcategory": "searching",
        "publishDate": "2022-05-01T00:00:00Z",
        "status": "published",
    });
    site.store.insert_with_id("posts", "legacy-1", legacy);

    let migrated = site
        .posts
        .migrate_missing_slugs()
        .await
        .expect("run migration");
    assert_eq!(migrated, 1);

    let locator = PostLocator {
        slug: Some("binary-search-basics".to_string()),
        ..PostLocator::default()
    };
    let resolved = site.resolver.resolve(&locator).await.expect("resolve");
    assert_eq!(
        urls::post_url(&resolved.post),
        "/dsa/searching/binary-search-basics/"
    );
}
