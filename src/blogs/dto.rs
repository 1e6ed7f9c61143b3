use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::BlogWithAuthor;

#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    pub popular: Option<String>,
    pub search: Option<String>,
}

/// Create/update body. `tags` accepts an array or a comma-separated
/// string; `cover_image` is an already-uploaded URL (upload itself is
/// handled elsewhere).
#[derive(Debug, Deserialize)]
pub struct BlogUpsertRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct AuthorInfo {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub read_time: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub is_popular: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: AuthorInfo,
}

impl From<BlogWithAuthor> for BlogResponse {
    fn from(row: BlogWithAuthor) -> Self {
        Self {
            id: row.blog.id,
            title: row.blog.title,
            slug: row.blog.slug,
            content: row.blog.content,
            cover_image: row.blog.cover_image,
            read_time: row.blog.read_time,
            tags: row.blog.tags,
            published: row.blog.published,
            is_popular: row.blog.is_popular,
            created_at: row.blog.created_at,
            author: AuthorInfo {
                name: row.author_name,
                avatar: row.author_avatar,
            },
        }
    }
}
