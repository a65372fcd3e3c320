//! Paginated reads of SCIM list endpoints.
//!
//! [`query`] keeps requesting pages from a resource endpoint until every
//! resource the server reported in `totalResults` has been collected. The
//! transport is abstracted behind [`Fetcher`] so that the same loop runs
//! over the pinned HTTPS client or a test double.

use log::{debug, warn};
use serde_json::Value;

use crate::error::Error;
use crate::types::list_response::ListResponse;

const HTTP_OK: u16 = 200;

/// Status and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(HTTP_OK, body)
    }
}

/// Performs an authenticated GET.
///
/// Transport failures are reported as `Err`; any HTTP status, including
/// errors, is an `Ok` response.
pub trait Fetcher {
    fn fetch(&mut self, url: &str) -> Result<HttpResponse, Error>;
}

impl<F> Fetcher for F
where
    F: FnMut(&str) -> Result<HttpResponse, Error>,
{
    fn fetch(&mut self, url: &str) -> Result<HttpResponse, Error> {
        self(url)
    }
}

/// Fetch every resource from the list endpoint at `base_url`.
///
/// Pages are requested one after another with a `startIndex` parameter
/// until `totalResults` resources have been collected or a page comes back
/// empty. Any failed page aborts the whole query.
pub fn query<F: Fetcher + ?Sized>(base_url: &str, fetcher: &mut F) -> Result<Vec<Value>, Error> {
    let mut resources: Vec<Value> = Vec::new();
    let mut page_size: Option<usize> = None;
    let mut pages_fetched: usize = 0;
    let mut url = base_url.to_string();

    loop {
        let page = fetch_page(&url, fetcher)?;
        pages_fetched += 1;

        let total = page.total_results;
        let received = match page.resources {
            Some(page_resources) => {
                let n = page_resources.len();
                resources.extend(page_resources);
                n
            }
            None => 0,
        };

        debug!(
            "{}: page {} returned {} resource(s), {} of {} collected",
            url,
            pages_fetched,
            received,
            resources.len(),
            total
        );

        if resources.len() as u64 >= total {
            break;
        }
        if received == 0 {
            warn!(
                "{}: empty page with {} of {} resources collected, stopping",
                url,
                resources.len(),
                total
            );
            break;
        }

        let size = *page_size.get_or_insert(received);
        url = with_start_index(base_url, 1 + size * pages_fetched);
    }

    Ok(resources)
}

fn fetch_page<F: Fetcher + ?Sized>(url: &str, fetcher: &mut F) -> Result<ListResponse, Error> {
    let response = fetcher.fetch(url)?;
    if response.status != HTTP_OK {
        return Err(Error::Http {
            status: response.status,
            url: url.to_string(),
        });
    }
    serde_json::from_str(&response.body)
        .map_err(|e| Error::ResponseFormat(format!("invalid list response from {}: {}", url, e)))
}

/// Append a `startIndex` query parameter to `url`.
pub fn with_start_index(url: &str, start_index: usize) -> String {
    let joiner = if !url.contains('?') {
        "?"
    } else if url.ends_with('?') || url.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{}{}startIndex={}", url, joiner, start_index)
}
