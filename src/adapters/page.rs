use scraper::Html;
use url::Url;

/// A fetched listing page: final URL plus decoded body. Adapters read pages,
/// they never fetch or persist anything themselves.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    body: String,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Hostname of the page, empty for hostless URLs.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Origin in `scheme://host[:port]` form, for absolutizing rooted paths.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Parse the body. `Html` is not `Send`, so parsing happens at the point
    /// of use instead of being cached here.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}
