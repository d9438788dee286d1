//! Batch routes
//!
//! - `POST   /batch/lists/{list}`                   add every item in the body
//! - `POST   /batch/lists/{list}?action=increment`  record an attempt on each
//! - `GET    /batch/lists/{list}?count=N&after_id=X` one page, keyset order
//! - `DELETE /batch/lists/{list}`                   remove every item in the body
//!
//! Bodies are newline-separated text or `{"items": [...]}` depending on the
//! request's `Content-Type`. A page response also names its last item in
//! `X-IIDY-Last-Item`, ready to be sent back as the next `after_id`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::codec::{Encoding, Reply};
use crate::data::ListStore;
use crate::observability::Logger;

use super::errors::{ApiError, ApiResult};
use super::list_routes::{ActionQuery, PostAction};
use super::negotiate::{request_encoding, respond, LAST_ITEM_HEADER};

/// Page request parsed from the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub count: usize,
    pub after_id: String,
}

impl PageQuery {
    /// `count` is required, `after_id` defaults to the start of the list
    pub fn parse(params: &HashMap<String, String>) -> ApiResult<Self> {
        let raw_count = params
            .get("count")
            .ok_or_else(|| ApiError::MissingParam("count".to_string()))?;
        let count = raw_count.parse::<usize>().map_err(|e| {
            ApiError::InvalidQueryParam(format!(
                "For query arg count, {} is not a number: {}",
                raw_count, e
            ))
        })?;
        let after_id = params.get("after_id").cloned().unwrap_or_default();
        Ok(Self { count, after_id })
    }
}

/// Create batch routes
pub fn batch_routes(store: Arc<ListStore>) -> Router {
    Router::new()
        .route(
            "/batch/lists/:list",
            get(get_batch_handler)
                .post(post_batch_handler)
                .delete(delete_batch_handler),
        )
        .with_state(store)
}

async fn post_batch_handler(
    State(store): State<Arc<ListStore>>,
    Path(list): Path<String>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let encoding = request_encoding(&headers);
    match post_batch(&store, &list, &query, encoding, &body).await {
        Ok((status, reply)) => respond(encoding, status, &reply),
        Err(err) => err.into_response(encoding),
    }
}

async fn post_batch(
    store: &ListStore,
    list: &str,
    query: &ActionQuery,
    encoding: Encoding,
    body: &[u8],
) -> ApiResult<(StatusCode, Reply)> {
    let action = query.parse()?;
    let items = encoding.decode_items(body)?;
    let empty = items.is_empty();

    let (status, reply) = match action {
        PostAction::Insert => {
            let added = store
                .insert_batch(list, items)
                .await
                .map_err(ApiError::store("add list items"))?;
            (StatusCode::CREATED, Reply::Added(added))
        }
        PostAction::Increment => {
            let incremented = store
                .increment_batch(list, items)
                .await
                .map_err(ApiError::store("increment list items"))?;
            (StatusCode::OK, Reply::Incremented(incremented))
        }
    };

    // Nothing to do is not a creation.
    if empty {
        return Ok((StatusCode::OK, reply));
    }
    Ok((status, reply))
}

async fn delete_batch_handler(
    State(store): State<Arc<ListStore>>,
    Path(list): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let encoding = request_encoding(&headers);
    match delete_batch(&store, &list, encoding, &body).await {
        Ok(deleted) => respond(encoding, StatusCode::OK, &Reply::Deleted(deleted)),
        Err(err) => err.into_response(encoding),
    }
}

async fn delete_batch(
    store: &ListStore,
    list: &str,
    encoding: Encoding,
    body: &[u8],
) -> ApiResult<u64> {
    let items = encoding.decode_items(body)?;
    store
        .delete_batch(list, items)
        .await
        .map_err(ApiError::store("delete list items"))
}

async fn get_batch_handler(
    State(store): State<Arc<ListStore>>,
    Path(list): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let encoding = request_encoding(&headers);
    let page = match PageQuery::parse(&params) {
        Ok(page) => page,
        Err(err) => return err.into_response(encoding),
    };

    let entries = match store.get_batch(&list, &page.after_id, page.count).await {
        Ok(entries) => entries,
        Err(err) => return ApiError::store("get list items")(err).into_response(encoding),
    };

    let last_item = entries.last().map(|entry| entry.item.clone());
    let mut response = respond(encoding, StatusCode::OK, &Reply::EntryList(entries));

    if let Some(last_item) = last_item {
        match HeaderValue::from_str(&last_item) {
            Ok(value) => {
                response.headers_mut().insert(LAST_ITEM_HEADER, value);
            }
            Err(_) => Logger::warn(
                "LAST_ITEM_HEADER_SKIPPED",
                &[("item", last_item.as_str()), ("list", list.as_str())],
            ),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_page_query_requires_count() {
        let err = PageQuery::parse(&params(&[("after_id", "a")])).unwrap_err();
        assert!(matches!(err, ApiError::MissingParam(ref p) if p == "count"));
    }

    #[test]
    fn test_page_query_rejects_bad_count() {
        for bad in ["ten", "-1", "1.5", ""] {
            let err = PageQuery::parse(&params(&[("count", bad)])).unwrap_err();
            assert!(matches!(err, ApiError::InvalidQueryParam(_)), "count={}", bad);
        }
    }

    #[test]
    fn test_page_query_defaults_after_id() {
        let page = PageQuery::parse(&params(&[("count", "2")])).unwrap();
        assert_eq!(
            page,
            PageQuery {
                count: 2,
                after_id: String::new()
            }
        );

        let page = PageQuery::parse(&params(&[("count", "2"), ("after_id", "b")])).unwrap();
        assert_eq!(page.after_id, "b");
    }
}
