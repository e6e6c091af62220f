use url::Url;

use super::criteria::FilterCriteria;
use crate::error::Result;

const ORIGIN: &str = "http://storefront.local";

/// The address bar: current URL plus a back/forward history.
///
/// The query string of the current entry is the source of truth for the
/// listing filters.
#[derive(Debug, Clone)]
pub struct Location {
    entries: Vec<Url>,
    cursor: usize,
}

impl Location {
    /// Start at an href such as `/?city=Faro&page=2`
    pub fn new(href: &str) -> Result<Self> {
        Ok(Self {
            entries: vec![resolve(href)?],
            cursor: 0,
        })
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.cursor]
    }

    /// Path plus query, e.g. `/?city=Faro`
    pub fn href(&self) -> String {
        href_of(self.current())
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_query(self.current().query().unwrap_or(""))
    }

    /// Navigate to `href`, discarding any forward history
    pub fn push(&mut self, href: &str) -> Result<()> {
        let url = resolve(href)?;
        self.entries.truncate(self.cursor + 1);
        self.entries.push(url);
        self.cursor += 1;
        Ok(())
    }

    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Href for the same path and query with `page` set to `page`
    pub fn page_href(&self, page: u32) -> String {
        let mut url = self.current().clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "page")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("page", &page.to_string());

        href_of(&url)
    }
}

fn resolve(href: &str) -> Result<Url> {
    Ok(Url::parse(ORIGIN)?.join(href)?)
}

fn href_of(url: &Url) -> String {
    match url.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", url.path(), q),
        _ => url.path().to_string(),
    }
}
