//! Pagination metadata extracted from one page of a list response.

use reqwest::Url;

/// Query parameter Google list endpoints take the page cursor in.
pub const PAGE_TOKEN_PARAM: &str = "pageToken";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedData {
    pub items_per_page: Option<u64>,
    pub start_index: Option<u64>,
    pub total_results: Option<u64>,
    /// Absolute link to the next page, when the API hands one out.
    pub next_page_url: Option<Url>,
    /// Opaque cursor for the next page.
    pub next_page_token: Option<String>,
}

impl FeedData {
    /// Whether another page follows this one.
    pub fn has_next_page(&self) -> bool {
        self.next_page_url.is_some()
            || self
                .next_page_token
                .as_deref()
                .is_some_and(|t| !t.is_empty())
    }

    /// URL of the next page.
    ///
    /// An explicit next link is used verbatim. A page token is written into
    /// `request_url` as `pageToken`, replacing any cursor already present, so
    /// the continuation keeps the shape of the original query.
    pub fn next_page_request(&self, request_url: &Url) -> Option<Url> {
        if let Some(url) = &self.next_page_url {
            return Some(url.clone());
        }

        let token = self.next_page_token.as_deref().filter(|t| !t.is_empty())?;
        let pairs: Vec<(String, String)> = request_url
            .query_pairs()
            .filter(|(k, _)| k != PAGE_TOKEN_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = request_url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair(PAGE_TOKEN_PARAM, token);
        Some(url)
    }
}
