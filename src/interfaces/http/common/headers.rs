//! Alert and pagination response headers

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::shared::{PageRequest, PaginatedResult};

pub const APPLICATION_NAME: &str = "accountService";
pub const ALERT_HEADER: &str = "x-accountservice-alert";
pub const ALERT_PARAMS_HEADER: &str = "x-accountservice-params";
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Unreserved characters of RFC 3986 stay as they are in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

/// `X-accountService-alert: accountService.<key>` plus the affected entity id
/// in `X-accountService-params`.
pub fn alert_headers(key: &str, param: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ALERT_HEADER, &format!("{}.{}", APPLICATION_NAME, key));
    insert(&mut headers, ALERT_PARAMS_HEADER, param);
    headers
}

/// `Location` value for a resource under `base_path`, with `segment`
/// percent-encoded so that `?`, `#` and `/` in a login cannot escape the path.
pub fn location_header(base_path: &str, segment: &str) -> Option<HeaderValue> {
    let encoded = utf8_percent_encode(segment, PATH_SEGMENT);
    HeaderValue::from_str(&format!("{}/{}", base_path, encoded)).ok()
}

/// `X-Total-Count` and an RFC 5988 `Link` header with next/prev/last/first
/// relations.
pub fn pagination_headers<T>(
    base_path: &str,
    request: &PageRequest,
    page: &PaginatedResult<T>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, TOTAL_COUNT_HEADER, &page.total.to_string());

    let sort = request.sort.to_query_value();
    let link = |number: u64, rel: &str| {
        format!(
            "<{}?page={}&size={}&sort={}>; rel=\"{}\"",
            base_path, number, page.size, sort, rel
        )
    };

    let last_page = page.total_pages.saturating_sub(1);
    let mut links = Vec::with_capacity(4);
    if page.page < last_page {
        links.push(link(page.page + 1, "next"));
    }
    if page.page > 0 {
        links.push(link(page.page - 1, "prev"));
    }
    links.push(link(last_page, "last"));
    links.push(link(0, "first"));

    insert(&mut headers, "link", &links.join(","));
    headers
}
