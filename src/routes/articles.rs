use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::extractors::{AdminSession, Query};
use crate::models::{Article, NewArticleInput, QUICK_SEARCH_LIMIT};
use crate::pagination::{Pagination, DEFAULT_PAGE_SIZE};
use actix_web::{get, post, web, HttpResponse};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

lazy_static! {
    static ref SLUG_PATTERN: Regex = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
}

/// Raw paging parameters; junk values fall back to defaults instead of failing.
#[derive(Deserialize, Debug)]
pub struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    fn pagination(&self, default_limit: i64) -> Pagination {
        Pagination::from_params(self.page.as_deref(), self.limit.as_deref(), default_limit)
    }
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

impl SearchQuery {
    /// The term exactly as sent; only a missing or blank one is refused.
    fn term(&self) -> Result<String, ApiError> {
        match self.q.as_deref() {
            Some(term) if !term.trim().is_empty() => Ok(term.to_owned()),
            _ => Err(ApiError::BadRequest("Search term is required".to_owned())),
        }
    }

    fn pagination(&self, default_limit: i64) -> Pagination {
        Pagination::from_params(self.page.as_deref(), self.limit.as_deref(), default_limit)
    }
}

#[derive(Deserialize, Debug)]
pub struct CountQuery {
    category: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CountResponse {
    pub count: i64,
}

#[get("/articles")]
pub async fn list_articles(
    pool: web::Data<DbPool>,
    query: Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let pagination = query.pagination(DEFAULT_PAGE_SIZE);
    let articles = db::run(&pool, move |conn| Article::list(conn, None, pagination))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch articles"))?;
    Ok(HttpResponse::Ok().json(articles))
}

#[get("/articles/category/{category_slug}")]
pub async fn list_by_category(
    pool: web::Data<DbPool>,
    path: web::Path<(String,)>,
    query: Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let category_slug = path.into_inner().0;
    let pagination = query.pagination(DEFAULT_PAGE_SIZE);
    let articles = db::run(&pool, move |conn| {
        Article::list(conn, Some(&category_slug), pagination)
    })
    .await
    .map_err(|e| ApiError::from_service(e, "Failed to fetch articles by category"))?;
    Ok(HttpResponse::Ok().json(articles))
}

#[get("/articles/category/{category_slug}/limited")]
pub async fn list_by_category_limited(
    pool: web::Data<DbPool>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let category_slug = path.into_inner().0;
    let articles = db::run(&pool, move |conn| {
        Article::list_limited(conn, &category_slug)
    })
    .await
    .map_err(|e| ApiError::from_service(e, "Failed to fetch articles by category"))?;
    Ok(HttpResponse::Ok().json(articles))
}

#[get("/articles/popular")]
pub async fn popular_articles(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let articles = db::run(&pool, Article::popular)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch most liked articles"))?;
    Ok(HttpResponse::Ok().json(articles))
}

#[get("/articles/search")]
pub async fn search_articles(
    pool: web::Data<DbPool>,
    query: Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let term = query.term()?;
    let pagination = query.pagination(DEFAULT_PAGE_SIZE);
    let articles = db::run(&pool, move |conn| Article::search(conn, &term, pagination))
        .await
        .map_err(|e| ApiError::from_service(e, "Search failed"))?;
    Ok(HttpResponse::Ok().json(articles))
}

/// Autocomplete: only id, title and slug of the best matches.
#[get("/articles/search/quick")]
pub async fn quick_search(
    pool: web::Data<DbPool>,
    query: Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let term = query.term()?;
    let limit = query.pagination(QUICK_SEARCH_LIMIT).limit;
    let links = db::run(&pool, move |conn| Article::quick_search(conn, &term, limit))
        .await
        .map_err(|e| ApiError::from_service(e, "Quick search failed"))?;
    Ok(HttpResponse::Ok().json(links))
}

#[get("/articles/{slug}")]
pub async fn get_article(
    pool: web::Data<DbPool>,
    path: web::Path<(String,)>,
) -> Result<HttpResponse, ApiError> {
    let slug = path.into_inner().0;
    let article = db::run(&pool, move |conn| Article::find_published(conn, &slug))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch article"))?;
    match article {
        Some(article) => Ok(HttpResponse::Ok().json(article)),
        None => Err(ApiError::NotFound("Article not found".to_owned())),
    }
}

#[get("/count/articles/count")]
pub async fn count_articles(
    pool: web::Data<DbPool>,
    query: Query<CountQuery>,
) -> Result<HttpResponse, ApiError> {
    let category = query.into_inner().category;
    let count = db::run(&pool, move |conn| Article::count(conn, category.as_deref()))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to get article count"))?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleCreateRequest {
    #[validate(length(max = 300), custom = "not_blank")]
    title: String,
    #[validate(length(min = 1, max = 200), regex = "SLUG_PATTERN")]
    slug: String,
    #[validate(custom = "not_blank")]
    content: String,
    #[validate(length(max = 1000))]
    excerpt: String,
    #[validate(custom = "not_blank")]
    category: String,
    #[validate(length(max = 100))]
    author: Option<String>,
    #[validate(length(max = 2048))]
    image_url: Option<String>,
    #[validate(length(max = 50))]
    sources: Option<Vec<String>>,
    #[validate(range(min = 1, max = 1440))]
    reading_time: Option<i32>,
}

impl From<ArticleCreateRequest> for NewArticleInput {
    fn from(request: ArticleCreateRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            content: request.content,
            excerpt: request.excerpt,
            author: request.author.filter(|author| !author.trim().is_empty()),
            category: request.category,
            image_url: request.image_url.filter(|url| !url.is_empty()),
            sources: request.sources,
            reading_time: request.reading_time,
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Names the offending fields the way the client spelled them.
fn invalid_fields_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| camel_case(field))
        .collect();
    fields.sort();
    format!("Missing or invalid fields: {}", fields.join(", "))
}

#[post("/articles/create-article")]
pub async fn create_article(
    _admin: AdminSession,
    pool: web::Data<DbPool>,
    data: web::Json<ArticleCreateRequest>,
) -> Result<HttpResponse, ApiError> {
    data.validate()
        .map_err(|e| ApiError::BadRequest(invalid_fields_message(&e)))?;
    let input = NewArticleInput::from(data.into_inner());
    let article = db::run(&pool, move |conn| Article::create(conn, input))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to create article"))?;
    info!("Published article {}", article.article.slug);
    Ok(HttpResponse::Created().json(article))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, ADMIN_COOKIE};
    use crate::error::MessageResponse;
    use crate::models::{ArticleWithCategory, Category};
    use crate::routes::{self, auth::LoginRequest};
    use actix_web::cookie::Cookie;
    use actix_web::{test, App};

    fn auth() -> AuthService {
        AuthService::new(&bcrypt::hash("correct", 4).unwrap(), "test-secret")
    }

    fn valid_request() -> ArticleCreateRequest {
        ArticleCreateRequest {
            title: "Borrowing".to_string(),
            slug: "borrowing-rules".to_string(),
            content: "Shared or mutable, never both".to_string(),
            category: "rust".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_slug_pattern() {
        assert!(SLUG_PATTERN.is_match("borrowing-rules-2"));
        assert!(!SLUG_PATTERN.is_match("Borrowing"));
        assert!(!SLUG_PATTERN.is_match("double--dash"));
        assert!(!SLUG_PATTERN.is_match("-leading"));
    }

    #[test]
    fn test_validation_names_fields() {
        assert!(valid_request().validate().is_ok());

        let request = ArticleCreateRequest {
            title: String::new(),
            slug: "Not A Slug".to_string(),
            reading_time: Some(0),
            ..valid_request()
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(
            invalid_fields_message(&errors),
            "Missing or invalid fields: readingTime, slug, title"
        );
    }

    #[test]
    fn test_validation_rejects_blank_text() {
        let request = ArticleCreateRequest {
            title: "   ".to_string(),
            content: "\n\t ".to_string(),
            category: " ".to_string(),
            ..valid_request()
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(
            invalid_fields_message(&errors),
            "Missing or invalid fields: category, content, title"
        );
    }

    #[test]
    fn test_search_term_is_kept_verbatim() {
        let query = SearchQuery {
            q: Some(" rust ".to_string()),
            page: None,
            limit: None,
        };
        assert_eq!(query.term().unwrap(), " rust ");

        let blank = SearchQuery {
            q: Some("  ".to_string()),
            page: None,
            limit: None,
        };
        assert_eq!(
            blank.term().unwrap_err(),
            ApiError::BadRequest("Search term is required".to_owned())
        );
    }

    #[test]
    fn test_request_into_input() {
        let request = ArticleCreateRequest {
            author: Some("  ".to_string()),
            image_url: Some(String::new()),
            ..valid_request()
        };
        let input = NewArticleInput::from(request);
        assert_eq!(input.author, None);
        assert_eq!(input.image_url, None);
        assert_eq!(input.category, "rust");
    }

    #[actix_rt::test]
    async fn test_create_article_requires_admin() {
        let mut app = test::init_service(
            App::new()
                .data(auth())
                .data(db::unconnected_pool())
                .service(create_article),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/articles/create-article")
            .set_json(&valid_request())
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 401);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Access denied. Admin token required.");
    }

    #[actix_rt::test]
    async fn test_create_article_validation() {
        let auth = auth();
        let token = auth.issue_token().unwrap();
        let mut app = test::init_service(
            App::new()
                .data(auth)
                .data(db::unconnected_pool())
                .service(create_article),
        )
        .await;
        let data = ArticleCreateRequest {
            content: String::new(),
            ..valid_request()
        };
        let req = test::TestRequest::post()
            .uri("/articles/create-article")
            .cookie(Cookie::new(ADMIN_COOKIE, token))
            .set_json(&data)
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Missing or invalid fields: content");
    }

    #[actix_rt::test]
    async fn test_search_requires_term() {
        let mut app = test::init_service(
            App::new()
                .data(db::unconnected_pool())
                .service(quick_search)
                .service(search_articles),
        )
        .await;
        for uri in &["/articles/search", "/articles/search?q=%20", "/articles/search/quick"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&mut app, req).await;
            assert_eq!(resp.status().as_u16(), 400, "{}", uri);
            let body: MessageResponse = test::read_body_json(resp).await;
            assert_eq!(body.message, "Search term is required");
        }
    }

    #[actix_rt::test]
    async fn test_malformed_query_is_a_json_400() {
        let mut app = test::init_service(
            App::new()
                .data(db::unconnected_pool())
                .service(list_articles),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/articles?page[from]=1")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Could not extract query");
    }

    fn article_request(slug: &str, category: &str) -> ArticleCreateRequest {
        ArticleCreateRequest {
            title: format!("About {}", slug),
            slug: slug.to_string(),
            content: "word ".repeat(450),
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[actix_rt::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn test_publish_and_read_articles() {
        let pool = db::create_test_pool();
        {
            let conn = pool.get().unwrap();
            Category::create(&conn, "Route Tests", "route-tests").unwrap();
        }
        let mut app = test::init_service(
            App::new()
                .data(auth())
                .data(pool.clone())
                .app_data(routes::json_config())
                .service(routes::auth::login)
                .service(create_article)
                .service(list_articles)
                .service(list_by_category)
                .service(count_articles)
                .service(get_article),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(&LoginRequest {
                password: Some("correct".to_owned()),
            })
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let session = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == ADMIN_COOKIE)
            .map(|cookie| cookie.into_owned())
            .expect("login sets the session cookie");

        for slug in &["route-ownership", "route-borrowing"] {
            let req = test::TestRequest::post()
                .uri("/articles/create-article")
                .cookie(session.clone())
                .set_json(&article_request(slug, "route-tests"))
                .to_request();
            let resp = test::call_service(&mut app, req).await;
            assert_eq!(resp.status().as_u16(), 201);
            let created: ArticleWithCategory = test::read_body_json(resp).await;
            assert_eq!(created.article.slug, *slug);
            assert_eq!(created.article.reading_time, Some(3));
            assert_eq!(created.article.views, 0);
            assert_eq!(created.category.slug, "route-tests");
        }

        let req = test::TestRequest::post()
            .uri("/articles/create-article")
            .cookie(session.clone())
            .set_json(&article_request("route-ownership", "route-tests"))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 409);

        let req = test::TestRequest::post()
            .uri("/articles/create-article")
            .cookie(session.clone())
            .set_json(&article_request("route-orphan", "no-such-category"))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 404);

        let req = test::TestRequest::get()
            .uri("/articles/route-ownership")
            .to_request();
        let article: ArticleWithCategory = test::read_response_json(&mut app, req).await;
        assert_eq!(article.article.title, "About route-ownership");

        let req = test::TestRequest::get()
            .uri("/articles/route-missing")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 404);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Article not found");

        let req = test::TestRequest::get()
            .uri("/count/articles/count?category=route-tests")
            .to_request();
        let body: CountResponse = test::read_response_json(&mut app, req).await;
        assert_eq!(body.count, 2);

        let req = test::TestRequest::get()
            .uri("/count/articles/count?category=no-such-category")
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status().as_u16(), 404);

        // newest first
        let req = test::TestRequest::get()
            .uri("/articles/category/route-tests?page=1&limit=1")
            .to_request();
        let page: Vec<ArticleWithCategory> = test::read_response_json(&mut app, req).await;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].article.slug, "route-borrowing");

        let req = test::TestRequest::get()
            .uri("/articles/category/route-tests?page=2&limit=1")
            .to_request();
        let page: Vec<ArticleWithCategory> = test::read_response_json(&mut app, req).await;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].article.slug, "route-ownership");

        let req = test::TestRequest::get()
            .uri("/articles?limit=1")
            .to_request();
        let page: Vec<ArticleWithCategory> = test::read_response_json(&mut app, req).await;
        assert_eq!(page.len(), 1);
    }
}
