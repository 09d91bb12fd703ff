//! Database models.

pub mod analytics;
pub mod article;
pub mod category;
pub mod user;

pub use article::{Article, ArticleChanges, ArticleDetail, ArticleFilter, NewArticle};
pub use category::{Category, CategoryWithCount, CreateCategory};
pub use user::{CreateUser, User};
