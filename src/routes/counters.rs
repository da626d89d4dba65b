use crate::db::{self, DbPool};
use crate::error::{ApiError, MessageResponse};
use crate::extractors::ClientIp;
use crate::models::{Article, Like, LikeOutcome};
use actix_web::{get, post, web, HttpResponse};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct LikeResponse {
    pub message: String,
    pub likes: i32,
    pub liked: bool,
}

impl From<LikeOutcome> for LikeResponse {
    fn from(outcome: LikeOutcome) -> Self {
        let message = if outcome.liked {
            "Article liked successfully"
        } else {
            "Article unliked successfully"
        };
        Self {
            message: message.to_owned(),
            likes: outcome.likes,
            liked: outcome.liked,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LikeStatusResponse {
    pub liked: bool,
}

fn article_not_found() -> ApiError {
    ApiError::NotFound("Article not found".to_owned())
}

#[post("/articles/{slug}/view")]
pub async fn record_view(
    pool: web::Data<DbPool>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let slug = path.into_inner().0;
    let found = db::run(&pool, move |conn| Article::increment_views(conn, &slug))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update article views"))?;
    if !found {
        return Err(article_not_found());
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("Views updated successfully")))
}

/// Likes the article for the caller's address, or takes the like back.
#[post("/articles/{slug}/like")]
pub async fn toggle_like(
    ClientIp { ip_address }: ClientIp,
    pool: web::Data<DbPool>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let slug = path.into_inner().0;
    debug!("Toggling like on {} for {}", slug, ip_address);
    let outcome = db::run(&pool, move |conn| Like::toggle(conn, &slug, &ip_address))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to like article"))?
        .ok_or_else(article_not_found)?;
    Ok(HttpResponse::Ok().json(LikeResponse::from(outcome)))
}

#[get("/articles/{slug}/like-status")]
pub async fn like_status(
    ClientIp { ip_address }: ClientIp,
    pool: web::Data<DbPool>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let slug = path.into_inner().0;
    let liked = db::run(&pool, move |conn| Like::status(conn, &slug, &ip_address))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to get like status"))?
        .ok_or_else(article_not_found)?;
    Ok(HttpResponse::Ok().json(LikeStatusResponse { liked }))
}
