//! Blog and article conversions.

use crate::shopify::types::{Article, Blog};

use super::super::queries::fragments::{BlogData, BlogWithArticlesData, Connection};

impl From<BlogData> for Blog {
    fn from(b: BlogData) -> Self {
        Self {
            id: b.id,
            handle: b.handle,
            title: b.title,
        }
    }
}

/// Flatten blogs and their articles into one list, newest first.
pub fn flatten_articles(blogs: Connection<BlogWithArticlesData>) -> Vec<Article> {
    let mut articles: Vec<Article> = blogs
        .into_nodes()
        .flat_map(|blog| {
            let parent = Blog {
                id: blog.id,
                handle: blog.handle,
                title: blog.title,
            };
            blog.articles.into_nodes().map(move |a| Article {
                id: a.id,
                handle: a.handle,
                title: a.title,
                content: a.content,
                content_html: a.content_html,
                excerpt: a.excerpt.filter(|e| !e.is_empty()),
                excerpt_html: a.excerpt_html.filter(|e| !e.is_empty()),
                published_at: a.published_at,
                tags: a.tags,
                image: a.image.map(Into::into),
                seo: a.seo.map(Into::into),
                author: a.author_v2.map(|author| author.name),
                blog: parent.clone(),
            })
        })
        .collect();

    // RFC 3339 timestamps in the same zone sort lexicographically
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    articles
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn article(handle: &str, published_at: &str) -> serde_json::Value {
        serde_json::json!({ "node": {
            "id": format!("gid://shopify/Article/{handle}"),
            "handle": handle,
            "title": handle,
            "content": "",
            "contentHtml": "",
            "excerpt": "",
            "excerptHtml": null,
            "publishedAt": published_at,
            "tags": [],
            "image": null,
            "seo": null,
            "authorV2": { "name": "Redaktion" }
        }})
    }

    #[test]
    fn test_flatten_articles_sorts_across_blogs() {
        let blogs: Connection<BlogWithArticlesData> = serde_json::from_value(serde_json::json!({
            "edges": [
                { "node": { "id": "b1", "handle": "news", "title": "News", "articles": { "edges": [
                    article("alt", "2024-01-01T10:00:00Z")
                ] } } },
                { "node": { "id": "b2", "handle": "ratgeber", "title": "Ratgeber", "articles": { "edges": [
                    article("neu", "2024-03-01T10:00:00Z"),
                    article("mittel", "2024-02-01T10:00:00Z")
                ] } } }
            ]
        }))
        .unwrap();

        let articles = flatten_articles(blogs);
        let handles: Vec<&str> = articles.iter().map(|a| a.handle.as_str()).collect();
        assert_eq!(handles, ["neu", "mittel", "alt"]);
        assert_eq!(articles[0].blog.handle, "ratgeber");
        assert_eq!(articles[0].author.as_deref(), Some("Redaktion"));
        assert_eq!(articles[0].excerpt, None);
    }
}
