use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageSourceError {
    #[error("Page source unavailable: {0}")]
    Unavailable(String),
}

/// A searchable page as stored by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: u64,
    pub title: String,
    pub link: String,
    /// Seconds since the Unix epoch.
    pub last_edited: u64,
}

/// Content store queried by the page search endpoint.
pub trait PageSource {
    /// Pages whose title contains `needle`, ignoring case. An empty needle
    /// matches every page. Order is unspecified.
    fn pages_titled(&self, needle: &str) -> Result<Vec<PageRecord>, PageSourceError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPages {
    pages: Vec<PageRecord>,
}

impl InMemoryPages {
    pub fn new(pages: Vec<PageRecord>) -> Self {
        Self { pages }
    }

    pub fn insert(&mut self, page: PageRecord) {
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageSource for InMemoryPages {
    fn pages_titled(&self, needle: &str) -> Result<Vec<PageRecord>, PageSourceError> {
        let needle = needle.to_lowercase();
        Ok(self
            .pages
            .iter()
            .filter(|page| page.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
