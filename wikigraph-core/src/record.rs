use serde::{Deserialize, Serialize};

/// One fetched and parsed page, as handed to the store by the crawler:
/// the article's name, the names it links to, and the redirect aliases
/// it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub name: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub redirects: Vec<String>,
}

impl CrawlRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            redirects: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    pub fn with_redirects(mut self, redirects: Vec<String>) -> Self {
        self.redirects = redirects;
        self
    }
}
