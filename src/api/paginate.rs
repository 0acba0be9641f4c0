use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{ApiRequest, Endpoint, Profile};

use super::{ApiResponse, Error, Target};

/// A list request with a continuation cursor attached.
pub struct PaginatedRequest<'a, T> {
    /// The inner request.
    pub base: T,
    /// The cursor returned with the previous page, if any.
    pub offset: Option<&'a str>,
}

impl<T> fmt::Debug for PaginatedRequest<'_, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedRequest")
            .field("base", &self.base)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<T: ApiRequest> ApiRequest for PaginatedRequest<'_, T> {
    type Response = T::Response;

    fn table(&self) -> &str {
        self.base.table()
    }

    fn method(&self) -> http::Method {
        self.base.method()
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        let endpoint = self.base.endpoint(profile);
        match self.offset {
            Some(offset) => endpoint.param("offset", offset),
            None => endpoint,
        }
    }
}

/// One page of a list response, with the cursor for the next one.
pub struct PaginatedResponse<T> {
    /// One page of results.
    pub page: Vec<T>,
    /// The cursor for the next page. Unset if there are no more results.
    pub offset: Option<String>,
}

impl<T> fmt::Debug for PaginatedResponse<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedResponse")
            .field("page", &self.page)
            .field("offset", &self.offset)
            .finish()
    }
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    records: Option<Vec<Value>>,
    #[serde(default)]
    offset: Option<String>,
}

impl<T: ApiResponse> ApiResponse for PaginatedResponse<T> {
    fn from_json(value: Value, target: Target<'_>) -> Result<Self, Error> {
        let raw: RawPage = serde_json::from_value(value).map_err(|e| target.malformed(e))?;

        let page = raw
            .records
            .unwrap_or_default()
            .into_iter()
            .map(|v| T::from_json(v, target))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse {
            page,
            offset: raw.offset.filter(|o| !o.is_empty()),
        })
    }
}

struct Paginator<F, E, R, T>
where
    F: Fn(PaginatedRequest<'_, R>) -> Result<R::Response, E>,
    E: From<Error>,
    R: ApiRequest<Response = PaginatedResponse<T>> + Clone,
{
    base_req: R,
    fetch_page: F,
    batch: <Vec<T> as IntoIterator>::IntoIter,
    next_offset: Option<String>,
}

impl<F, E, R, T> Iterator for Paginator<F, E, R, T>
where
    F: Fn(PaginatedRequest<'_, R>) -> Result<R::Response, E>,
    E: From<Error>,
    R: ApiRequest<Response = PaginatedResponse<T>> + Clone,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(v) = self.batch.next() {
            return Some(Ok(v));
        }

        let offset = self.next_offset.take()?;
        let page_req = self.base_req.clone().paginate(Some(&offset));

        let PaginatedResponse { page, offset } = match (self.fetch_page)(page_req) {
            Ok(v) => v,
            Err(e) => return Some(Err(e)),
        };

        debug!(records = page.len(), more = offset.is_some(), "fetched page");

        // An empty page ends the listing, whatever the cursor says.
        if page.is_empty() {
            return None;
        }

        self.batch = page.into_iter();
        self.next_offset = offset;
        self.batch.next().map(Ok)
    }
}

/// Repeatedly make a list request, following the `offset` cursor until the
/// server stops returning one, by calling `fetch_page`.
///
/// The first page is fetched immediately; later pages are fetched lazily,
/// one request at a time, as the iterator is drained. Once a request fails,
/// the error is yielded and no further requests are made.
pub fn paginate<F, E, R, T>(
    base_req: R,
    fetch_page: F,
) -> Result<impl Iterator<Item = Result<T, E>>, E>
where
    F: Fn(PaginatedRequest<'_, R>) -> Result<R::Response, E>,
    E: From<Error>,
    R: ApiRequest<Response = PaginatedResponse<T>> + Clone,
{
    let PaginatedResponse { page, offset } = fetch_page(base_req.clone().paginate(None))?;
    debug!(records = page.len(), more = offset.is_some(), "fetched page");

    let next_offset = if page.is_empty() { None } else { offset };

    Ok(Paginator {
        fetch_page,
        base_req,
        batch: page.into_iter(),
        next_offset,
    })
}
