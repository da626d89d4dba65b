use crate::error::ServiceError;
use crate::models::{Category, CategorySummary};
use crate::pagination::Pagination;
use crate::schema::{articles, categories};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTHOR: &str = "Admin";
pub const WORDS_PER_MINUTE: usize = 200;
pub const POPULAR_LIMIT: i64 = 6;
pub const CATEGORY_PREVIEW_LIMIT: i64 = 10;
pub const QUICK_SEARCH_LIMIT: i64 = 8;

#[derive(Serialize, Deserialize, Queryable, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    #[serde(skip)]
    pub category_id: i32,
    pub published_at: Option<NaiveDateTime>,
    pub views: i32,
    pub likes: i32,
    pub image_url: Option<String>,
    pub sources: Option<Vec<String>>,
    pub reading_time: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// An article joined with the display fields of its category.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArticleWithCategory {
    #[serde(flatten)]
    pub article: Article,
    pub category: CategorySummary,
}

impl From<(Article, Category)> for ArticleWithCategory {
    fn from((article, category): (Article, Category)) -> Self {
        Self {
            article,
            category: category.into(),
        }
    }
}

/// Autocomplete projection.
#[derive(Serialize, Deserialize, Queryable, Debug, Clone, PartialEq)]
pub struct ArticleLink {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

#[derive(Insertable)]
#[table_name = "articles"]
struct NewArticle {
    title: String,
    slug: String,
    content: String,
    excerpt: String,
    author: String,
    category_id: i32,
    published_at: Option<NaiveDateTime>,
    views: i32,
    likes: i32,
    image_url: Option<String>,
    sources: Option<Vec<String>>,
    reading_time: Option<i32>,
}

/// Fields accepted when an admin publishes an article. `category` is a slug.
#[derive(Debug, Clone, Default)]
pub struct NewArticleInput {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author: Option<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub sources: Option<Vec<String>>,
    pub reading_time: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SortOrder {
    Newest,
    MostLiked,
}

#[derive(Debug, Default)]
struct ArticleFilter<'a> {
    category_id: Option<i32>,
    search: Option<&'a str>,
}

/// Minutes needed to read `content`, never less than one.
pub fn reading_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    ((words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE).max(1) as i32
}

/// `%term%` with the LIKE wildcards of `term` taken literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Article {
    fn load_published(
        conn: &PgConnection,
        filter: ArticleFilter,
        order: SortOrder,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ArticleWithCategory>, diesel::result::Error> {
        let mut query = articles::table
            .inner_join(categories::table)
            .filter(articles::published_at.is_not_null())
            .into_boxed();
        if let Some(category_id) = filter.category_id {
            query = query.filter(articles::category_id.eq(category_id));
        }
        if let Some(term) = filter.search {
            let pattern = contains_pattern(term);
            query = query.filter(
                articles::title
                    .ilike(pattern.clone())
                    .or(articles::content.ilike(pattern.clone()))
                    .or(articles::excerpt.ilike(pattern)),
            );
        }
        query = match order {
            SortOrder::Newest => query.order((articles::published_at.desc(), articles::id.desc())),
            SortOrder::MostLiked => query.order((
                articles::likes.desc(),
                articles::published_at.desc(),
                articles::id.desc(),
            )),
        };
        let rows = query
            .offset(offset)
            .limit(limit)
            .load::<(Article, Category)>(conn)?;
        Ok(rows.into_iter().map(ArticleWithCategory::from).collect())
    }

    fn category_id(conn: &PgConnection, category_slug: &str) -> Result<i32, ServiceError> {
        Category::find_id_by_slug(conn, category_slug)?.ok_or(ServiceError::CategoryNotFound)
    }

    /// Published articles, newest first, optionally narrowed to one category.
    pub fn list(
        conn: &PgConnection,
        category_slug: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<ArticleWithCategory>, ServiceError> {
        let category_id = match category_slug {
            Some(slug) => Some(Self::category_id(conn, slug)?),
            None => None,
        };
        let filter = ArticleFilter {
            category_id,
            ..Default::default()
        };
        let articles = Self::load_published(
            conn,
            filter,
            SortOrder::Newest,
            pagination.offset(),
            pagination.limit,
        )?;
        Ok(articles)
    }

    pub fn list_limited(
        conn: &PgConnection,
        category_slug: &str,
    ) -> Result<Vec<ArticleWithCategory>, ServiceError> {
        let filter = ArticleFilter {
            category_id: Some(Self::category_id(conn, category_slug)?),
            ..Default::default()
        };
        let articles =
            Self::load_published(conn, filter, SortOrder::Newest, 0, CATEGORY_PREVIEW_LIMIT)?;
        Ok(articles)
    }

    pub fn popular(conn: &PgConnection) -> Result<Vec<ArticleWithCategory>, ServiceError> {
        let articles = Self::load_published(
            conn,
            ArticleFilter::default(),
            SortOrder::MostLiked,
            0,
            POPULAR_LIMIT,
        )?;
        Ok(articles)
    }

    /// Case-insensitive substring match on title, content or excerpt.
    pub fn search(
        conn: &PgConnection,
        term: &str,
        pagination: Pagination,
    ) -> Result<Vec<ArticleWithCategory>, ServiceError> {
        let filter = ArticleFilter {
            search: Some(term),
            ..Default::default()
        };
        let articles = Self::load_published(
            conn,
            filter,
            SortOrder::Newest,
            pagination.offset(),
            pagination.limit,
        )?;
        Ok(articles)
    }

    pub fn quick_search(
        conn: &PgConnection,
        term: &str,
        limit: i64,
    ) -> Result<Vec<ArticleLink>, ServiceError> {
        let pattern = contains_pattern(term);
        let links = articles::table
            .filter(articles::published_at.is_not_null())
            .filter(
                articles::title
                    .ilike(pattern.clone())
                    .or(articles::excerpt.ilike(pattern.clone()))
                    .or(articles::content.ilike(pattern)),
            )
            .order(articles::published_at.desc())
            .select((articles::id, articles::title, articles::slug))
            .limit(limit)
            .load::<ArticleLink>(conn)?;
        Ok(links)
    }

    pub fn find_published(
        conn: &PgConnection,
        slug: &str,
    ) -> Result<Option<ArticleWithCategory>, ServiceError> {
        let article = articles::table
            .inner_join(categories::table)
            .filter(articles::slug.eq(slug))
            .filter(articles::published_at.is_not_null())
            .first::<(Article, Category)>(conn)
            .optional()?;
        Ok(article.map(ArticleWithCategory::from))
    }

    /// Any article, published or not; counters are keyed on the slug alone.
    pub fn find_id_by_slug(
        conn: &PgConnection,
        slug: &str,
    ) -> Result<Option<i32>, diesel::result::Error> {
        articles::table
            .filter(articles::slug.eq(slug))
            .select(articles::id)
            .first::<i32>(conn)
            .optional()
    }

    pub fn count(conn: &PgConnection, category_slug: Option<&str>) -> Result<i64, ServiceError> {
        let mut query = articles::table
            .filter(articles::published_at.is_not_null())
            .into_boxed();
        if let Some(slug) = category_slug {
            query = query.filter(articles::category_id.eq(Self::category_id(conn, slug)?));
        }
        let count = query.count().get_result::<i64>(conn)?;
        Ok(count)
    }

    /// Publishes a new article immediately. There is no draft state.
    pub fn create(
        conn: &PgConnection,
        input: NewArticleInput,
    ) -> Result<ArticleWithCategory, ServiceError> {
        conn.transaction(|| {
            let category = Category::find_by_slug(conn, &input.category)?
                .ok_or(ServiceError::CategoryNotFound)?;
            if Self::find_id_by_slug(conn, &input.slug)?.is_some() {
                return Err(ServiceError::DuplicateSlug(input.slug.clone()));
            }
            let reading_time = input
                .reading_time
                .unwrap_or_else(|| reading_time_minutes(&input.content));
            let new_article = NewArticle {
                title: input.title.trim().to_owned(),
                slug: input.slug.clone(),
                content: input.content.clone(),
                excerpt: input.excerpt.clone(),
                author: input
                    .author
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
                category_id: category.id,
                published_at: Some(Utc::now().naive_utc()),
                views: 0,
                likes: 0,
                image_url: input.image_url.clone(),
                sources: input.sources.clone(),
                reading_time: Some(reading_time),
            };
            let article = diesel::insert_into(articles::table)
                .values(&new_article)
                .get_result::<Article>(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ServiceError::DuplicateSlug(input.slug.clone())
                    }
                    e => e.into(),
                })?;
            Ok(ArticleWithCategory::from((article, category)))
        })
    }

    /// Returns whether an article with this slug existed.
    pub fn increment_views(conn: &PgConnection, slug: &str) -> Result<bool, ServiceError> {
        let updated = diesel::update(articles::table.filter(articles::slug.eq(slug)))
            .set(articles::views.eq(articles::views + 1))
            .execute(conn)?;
        Ok(updated > 0)
    }
}
