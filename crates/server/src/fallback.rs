//! Degraded-mode content provider.
//!
//! When the content store is unreachable during a public *read*, the site
//! must not show a raw error page. The provider below is the injected
//! strategy the routes fall back to; the default serves empty result sets.
//! The fallback path always logs loudly — serving placeholder content must
//! never look like success in monitoring.

use std::fmt;

use crate::models::{ArticleDetail, CategoryWithCount};

/// Source of last-resort content for public read endpoints.
pub trait FallbackContent: Send + Sync + fmt::Debug {
    /// Articles to serve when the store is down.
    fn articles(&self) -> Vec<ArticleDetail>;

    /// Categories to serve when the store is down.
    fn categories(&self) -> Vec<CategoryWithCount>;
}

/// Default provider: empty result sets, nothing fabricated.
#[derive(Debug, Default)]
pub struct EmptyFallback;

impl FallbackContent for EmptyFallback {
    fn articles(&self) -> Vec<ArticleDetail> {
        Vec::new()
    }

    fn categories(&self) -> Vec<CategoryWithCount> {
        Vec::new()
    }
}
