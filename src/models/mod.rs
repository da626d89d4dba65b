mod article;
mod category;
mod like;
pub use article::{
    reading_time_minutes, Article, ArticleLink, ArticleWithCategory, NewArticleInput,
    CATEGORY_PREVIEW_LIMIT, DEFAULT_AUTHOR, POPULAR_LIMIT, QUICK_SEARCH_LIMIT,
};
pub use category::{Category, CategorySummary};
pub use like::{Like, LikeOutcome};
