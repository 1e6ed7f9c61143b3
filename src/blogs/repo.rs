use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub read_time: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub is_popular: bool,
    pub author_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Blog row joined with its author's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct BlogWithAuthor {
    #[sqlx(flatten)]
    pub blog: Blog,
    pub author_name: String,
    pub author_avatar: Option<String>,
}

const BLOG_COLUMNS: &str = "b.id, b.title, b.slug, b.content, b.cover_image, b.read_time, \
     b.tags, b.published, b.is_popular, b.author_id, b.created_at, \
     u.name AS author_name, u.avatar AS author_avatar";

pub async fn list(
    db: &PgPool,
    popular_only: bool,
    search: Option<&str>,
) -> anyhow::Result<Vec<BlogWithAuthor>> {
    let rows = sqlx::query_as::<_, BlogWithAuthor>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blogs b \
         JOIN users u ON u.id = b.author_id \
         WHERE b.published = TRUE \
           AND ($1 = FALSE OR b.is_popular = TRUE) \
           AND ($2::text IS NULL OR b.title ILIKE '%' || $2 || '%' \
                                 OR b.content ILIKE '%' || $2 || '%') \
         ORDER BY b.created_at DESC"
    ))
    .bind(popular_only)
    .bind(search)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_slug(db: &PgPool, slug: &str) -> anyhow::Result<Option<BlogWithAuthor>> {
    let row = sqlx::query_as::<_, BlogWithAuthor>(&format!(
        "SELECT {BLOG_COLUMNS} FROM blogs b \
         JOIN users u ON u.id = b.author_id \
         WHERE b.slug = $1"
    ))
    .bind(slug)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Blog>> {
    let blog = sqlx::query_as::<_, Blog>(
        "SELECT id, title, slug, content, cover_image, read_time, tags, published, \
                is_popular, author_id, created_at \
         FROM blogs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(blog)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    db: &PgPool,
    title: &str,
    slug: &str,
    content: &str,
    cover_image: Option<&str>,
    read_time: &str,
    tags: &[String],
    author_id: Uuid,
) -> anyhow::Result<Blog> {
    let blog = sqlx::query_as::<_, Blog>(
        "INSERT INTO blogs (title, slug, content, cover_image, read_time, tags, published, author_id) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7) \
         RETURNING id, title, slug, content, cover_image, read_time, tags, published, \
                   is_popular, author_id, created_at",
    )
    .bind(title)
    .bind(slug)
    .bind(content)
    .bind(cover_image)
    .bind(read_time)
    .bind(tags.to_vec())
    .bind(author_id)
    .fetch_one(db)
    .await?;
    Ok(blog)
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    db: &PgPool,
    id: Uuid,
    title: &str,
    slug: &str,
    content: &str,
    cover_image: Option<&str>,
    read_time: &str,
    tags: &[String],
) -> anyhow::Result<Option<Blog>> {
    let blog = sqlx::query_as::<_, Blog>(
        "UPDATE blogs SET title = $2, slug = $3, content = $4, cover_image = $5, \
                          read_time = $6, tags = $7 \
         WHERE id = $1 \
         RETURNING id, title, slug, content, cover_image, read_time, tags, published, \
                   is_popular, author_id, created_at",
    )
    .bind(id)
    .bind(title)
    .bind(slug)
    .bind(content)
    .bind(cover_image)
    .bind(read_time)
    .bind(tags.to_vec())
    .fetch_optional(db)
    .await?;
    Ok(blog)
}

pub async fn toggle_popular(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Blog>> {
    let blog = sqlx::query_as::<_, Blog>(
        "UPDATE blogs SET is_popular = NOT is_popular \
         WHERE id = $1 \
         RETURNING id, title, slug, content, cover_image, read_time, tags, published, \
                   is_popular, author_id, created_at",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(blog)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blogs")
        .fetch_one(db)
        .await?;
    Ok(n)
}
