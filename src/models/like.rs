use crate::error::ServiceError;
use crate::models::Article;
use crate::schema::{article_likes, articles};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One like per (article, ip address); the unique index enforces it.
#[derive(Serialize, Queryable, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i32,
    pub article_id: i32,
    pub ip_address: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "article_likes"]
struct NewLike<'a> {
    article_id: i32,
    ip_address: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LikeOutcome {
    pub likes: i32,
    pub liked: bool,
}

fn adjust_likes(conn: &PgConnection, article_id: i32, delta: i32) -> QueryResult<i32> {
    diesel::update(articles::table.find(article_id))
        .set(articles::likes.eq(articles::likes + delta))
        .returning(articles::likes)
        .get_result::<i32>(conn)
}

impl Like {
    /// Flips the like state of `ip_address` for the article.
    ///
    /// The conditional delete and the conflict-ignoring insert only touch the
    /// counter when they actually changed a row, so concurrent toggles from
    /// the same address cannot leave duplicate likes or a drifting counter.
    /// Returns `None` when no article has this slug.
    pub fn toggle(
        conn: &PgConnection,
        slug: &str,
        ip_address: &str,
    ) -> Result<Option<LikeOutcome>, ServiceError> {
        conn.transaction(|| {
            let article_id = match Article::find_id_by_slug(conn, slug)? {
                Some(id) => id,
                None => return Ok(None),
            };
            let removed = diesel::delete(
                article_likes::table
                    .filter(article_likes::article_id.eq(article_id))
                    .filter(article_likes::ip_address.eq(ip_address)),
            )
            .execute(conn)?;
            if removed > 0 {
                let likes = adjust_likes(conn, article_id, -(removed as i32))?;
                return Ok(Some(LikeOutcome {
                    likes,
                    liked: false,
                }));
            }

            let inserted = diesel::insert_into(article_likes::table)
                .values(&NewLike {
                    article_id,
                    ip_address,
                })
                .on_conflict((article_likes::article_id, article_likes::ip_address))
                .do_nothing()
                .execute(conn)?;
            let likes = if inserted > 0 {
                adjust_likes(conn, article_id, 1)?
            } else {
                // a concurrent toggle from the same address got there first
                articles::table
                    .find(article_id)
                    .select(articles::likes)
                    .first::<i32>(conn)?
            };
            Ok(Some(LikeOutcome { likes, liked: true }))
        })
    }

    /// `None` when no article has this slug.
    pub fn status(
        conn: &PgConnection,
        slug: &str,
        ip_address: &str,
    ) -> Result<Option<bool>, ServiceError> {
        let article_id = match Article::find_id_by_slug(conn, slug)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let liked = diesel::select(diesel::dsl::exists(
            article_likes::table
                .filter(article_likes::article_id.eq(article_id))
                .filter(article_likes::ip_address.eq(ip_address)),
        ))
        .get_result::<bool>(conn)?;
        Ok(Some(liked))
    }
}
