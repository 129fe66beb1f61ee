//! Sitemap, RSS, and robots.txt generation.
//!
//! Pure formatting over already-fetched collections. Every emitted URL goes
//! through [`crate::domain::urls`], so the artifacts always agree with the
//! routes the router actually serves.

use time::format_description::FormatItem;
use time::format_description::well_known::Rfc2822;
use time::macros::format_description;

use crate::config::SiteSettings;
use crate::domain::entities::{CategoryRecord, PostRecord};
use crate::domain::types::PostStatus;
use crate::domain::urls;

const LASTMOD_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Generate sitemap.xml content for the published site.
pub fn build_sitemap(
    settings: &SiteSettings,
    posts: &[PostRecord],
    categories: &[CategoryRecord],
) -> String {
    let base = settings.base_url.as_str();
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    xml.push_str(&sitemap_entry(
        &urls::absolute_url(base, "/"),
        None,
        "daily",
        "1.0",
    ));

    for category in categories {
        xml.push_str(&sitemap_entry(
            &urls::absolute_url(base, &urls::category_url(&category.slug, None)),
            None,
            "weekly",
            "0.8",
        ));
        for subcategory in &category.subcategories {
            xml.push_str(&sitemap_entry(
                &urls::absolute_url(
                    base,
                    &urls::category_url(&category.slug, Some(&subcategory.slug)),
                ),
                None,
                "weekly",
                "0.7",
            ));
        }
    }

    for post in posts {
        if post.status != PostStatus::Published {
            continue;
        }
        let lastmod = post.modified_at().date().format(LASTMOD_FORMAT).ok();
        xml.push_str(&sitemap_entry(
            &urls::absolute_url(base, &urls::post_url(post)),
            lastmod.as_deref(),
            "monthly",
            "0.9",
        ));
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Generate RSS 2.0 feed XML over the published posts.
pub fn build_rss(settings: &SiteSettings, posts: &[PostRecord]) -> String {
    let base = settings.base_url.as_str();

    let mut items = String::new();
    for post in posts {
        if post.status != PostStatus::Published {
            continue;
        }

        let link = urls::absolute_url(base, &urls::post_url(post));
        let pub_date = post
            .publish_date
            .format(&Rfc2822)
            .unwrap_or_else(|_| post.publish_date.to_string());

        items.push_str("    <item>\n");
        items.push_str(&format!("      <title>{}</title>\n", xml_escape(&post.title)));
        items.push_str(&format!("      <link>{link}</link>\n"));
        items.push_str(&format!("      <guid>{link}</guid>\n"));
        items.push_str(&format!("      <pubDate>{pub_date}</pubDate>\n"));
        if let Some(category) = &post.category {
            items.push_str(&format!(
                "      <category>{}</category>\n",
                xml_escape(category)
            ));
        }
        items.push_str(&format!(
            "      <description>{}</description>\n",
            xml_escape(&post.excerpt)
        ));
        items.push_str(&format!(
            "      <content:encoded><![CDATA[{}]]></content:encoded>\n",
            post.content
        ));
        items.push_str("    </item>\n");
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\" xmlns:content=\"http://purl.org/rss/1.0/modules/content/\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n{}  </channel>\n</rss>\n",
        xml_escape(&settings.site_name),
        urls::absolute_url(base, "/"),
        xml_escape(&settings.description),
        items
    )
}

/// Generate robots.txt: allow everything public, keep crawlers out of the
/// admin panel, and point at the sitemap.
pub fn build_robots_txt(settings: &SiteSettings) -> String {
    let sitemap_url = urls::absolute_url(&settings.base_url, "/sitemap.xml");
    format!("User-agent: *\nAllow: /\nDisallow: /admin/\n\nSitemap: {sitemap_url}\n")
}

fn sitemap_entry(
    loc: &str,
    lastmod: Option<&str>,
    changefreq: &str,
    priority: &str,
) -> String {
    let mut entry = String::from("  <url>\n");
    entry.push_str(&format!("    <loc>{}</loc>\n", xml_escape(loc)));
    if let Some(lastmod) = lastmod {
        entry.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
    }
    entry.push_str(&format!("    <changefreq>{changefreq}</changefreq>\n"));
    entry.push_str(&format!("    <priority>{priority}</priority>\n"));
    entry.push_str("  </url>\n");
    entry
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::SubcategoryEntry;

    fn settings() -> SiteSettings {
        SiteSettings::default()
    }

    fn post(title: &str, slug: &str, status: PostStatus) -> PostRecord {
        PostRecord {
            id: format!("id-{slug}"),
            slug: Some(slug.to_string()),
            title: title.to_string(),
            content: "<p>Body.</p>".to_string(),
            excerpt: "Excerpt.".to_string(),
            category: Some("dsa".to_string()),
            subcategory: Some("array".to_string()),
            author: None,
            author_img: None,
            featured_image: None,
            tags: Vec::new(),
            publish_date: datetime!(2024-03-01 10:00 UTC),
            last_updated: Some(datetime!(2024-04-02 08:00 UTC)),
            views: 0,
            likes: 0,
            featured: false,
            sticky: false,
            status,
            read_time: 1,
        }
    }

    fn category() -> CategoryRecord {
        CategoryRecord {
            id: "cat-1".to_string(),
            name: "DSA".to_string(),
            slug: "dsa".to_string(),
            description: String::new(),
            subcategories: vec![SubcategoryEntry {
                name: "Array".to_string(),
                slug: "array".to_string(),
                description: String::new(),
            }],
            post_count: 1,
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn sitemap_locs_come_from_the_url_builder() {
        let posts = [post("Two Sum", "two-sum", PostStatus::Published)];
        let categories = [category()];
        let xml = build_sitemap(&settings(), &posts, &categories);

        assert!(xml.contains("<loc>https://www.codetocrack.dev/</loc>"));
        assert!(xml.contains("<loc>https://www.codetocrack.dev/dsa/</loc>"));
        assert!(xml.contains("<loc>https://www.codetocrack.dev/dsa/array/</loc>"));
        assert!(xml.contains("<loc>https://www.codetocrack.dev/dsa/array/two-sum/</loc>"));
        assert!(xml.contains("<lastmod>2024-04-02</lastmod>"));
    }

    #[test]
    fn sitemap_skips_unpublished_posts() {
        let posts = [
            post("Two Sum", "two-sum", PostStatus::Published),
            post("Draft", "draft-post", PostStatus::Draft),
        ];
        let xml = build_sitemap(&settings(), &posts, &[]);

        assert!(xml.contains("two-sum"));
        assert!(!xml.contains("draft-post"));
    }

    #[test]
    fn xml_text_is_entity_escaped() {
        let mut record = post("Tips & <Tricks>", "tips-tricks", PostStatus::Published);
        record.excerpt = "\"Quoted\" & 'apostrophes'".to_string();
        let rss = build_rss(&settings(), &[record]);

        assert!(rss.contains("<title>Tips &amp; &lt;Tricks&gt;</title>"));
        assert!(rss.contains("&quot;Quoted&quot; &amp; &apos;apostrophes&apos;"));
        assert!(!rss.contains("<title>Tips & <Tricks></title>"));
    }

    #[test]
    fn rss_items_carry_link_guid_and_pubdate() {
        let rss = build_rss(&settings(), &[post("Two Sum", "two-sum", PostStatus::Published)]);

        assert!(rss.contains("<link>https://www.codetocrack.dev/dsa/array/two-sum/</link>"));
        assert!(rss.contains("<guid>https://www.codetocrack.dev/dsa/array/two-sum/</guid>"));
        assert!(rss.contains("<pubDate>Fri, 01 Mar 2024 10:00:00 +0000</pubDate>"));
        assert!(rss.contains("<category>dsa</category>"));
        assert!(rss.contains("<content:encoded><![CDATA[<p>Body.</p>]]></content:encoded>"));
    }

    #[test]
    fn robots_points_at_the_sitemap_and_blocks_admin() {
        let robots = build_robots_txt(&settings());

        assert!(robots.starts_with("User-agent: *\nAllow: /\n"));
        assert!(robots.contains("Disallow: /admin/"));
        assert!(robots.contains("Sitemap: https://www.codetocrack.dev/sitemap.xml"));
    }
}
