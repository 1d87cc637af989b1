//! Current page view: the query string and referrer the attribution store
//! reads from.

use url::Url;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Query string without the leading `?`
    pub query: String,

    /// Full referrer URL, if any
    pub referrer: Option<String>,
}

impl PageContext {
    pub fn new(query: impl Into<String>, referrer: Option<String>) -> Self {
        let query = query.into();
        Self {
            query: query.strip_prefix('?').unwrap_or(&query).to_string(),
            referrer: referrer.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Page at `url`, with no referrer. Unparseable URLs yield an empty page.
    pub fn from_url(url: &str) -> Self {
        Self::new(query_of(url).unwrap_or_default(), None)
    }

    #[must_use]
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        let referrer = referrer.into();
        self.referrer = (!referrer.trim().is_empty()).then_some(referrer);
        self
    }

    /// Query string embedded in the referrer
    pub fn referrer_query(&self) -> Option<String> {
        self.referrer.as_deref().and_then(query_of)
    }
}

fn query_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.query().map(str::to_string))
}
