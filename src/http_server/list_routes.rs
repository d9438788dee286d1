//! Single-item routes
//!
//! - `POST   /lists/{list}/{item}`                   add an item
//! - `POST   /lists/{list}/{item}?action=increment`  record an attempt
//! - `GET    /lists/{list}/{item}`                   attempts so far, 404 if absent
//! - `DELETE /lists/{list}/{item}`                   remove an item

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::codec::Reply;
use crate::data::{ListEntry, ListStore};

use super::errors::{ApiError, ApiResult};
use super::negotiate::{request_encoding, respond};

/// What a POST should do with the addressed item(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Insert,
    Increment,
}

/// Query arguments understood by POST routes
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

impl ActionQuery {
    pub fn parse(&self) -> ApiResult<PostAction> {
        match self.action.as_deref() {
            None | Some("") => Ok(PostAction::Insert),
            Some("increment") => Ok(PostAction::Increment),
            Some(other) => Err(ApiError::InvalidQueryParam(format!(
                "Unknown action: {}",
                other
            ))),
        }
    }
}

/// Create single-item routes
pub fn list_routes(store: Arc<ListStore>) -> Router {
    Router::new()
        .route(
            "/lists/:list/:item",
            get(get_one_handler)
                .post(post_one_handler)
                .delete(delete_one_handler),
        )
        .with_state(store)
}

async fn post_one_handler(
    State(store): State<Arc<ListStore>>,
    Path((list, item)): Path<(String, String)>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
) -> Response {
    let encoding = request_encoding(&headers);
    match post_one(&store, &list, &item, &query).await {
        Ok((status, reply)) => respond(encoding, status, &reply),
        Err(err) => err.into_response(encoding),
    }
}

async fn post_one(
    store: &ListStore,
    list: &str,
    item: &str,
    query: &ActionQuery,
) -> ApiResult<(StatusCode, Reply)> {
    match query.parse()? {
        PostAction::Insert => {
            let added = store
                .insert_one(list, item)
                .await
                .map_err(ApiError::store("add list item"))?;
            Ok((StatusCode::CREATED, Reply::Added(added)))
        }
        PostAction::Increment => {
            let incremented = store
                .increment_one(list, item)
                .await
                .map_err(ApiError::store("increment list item"))?;
            Ok((StatusCode::OK, Reply::Incremented(incremented)))
        }
    }
}

async fn get_one_handler(
    State(store): State<Arc<ListStore>>,
    Path((list, item)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let encoding = request_encoding(&headers);
    match store.get_one(&list, &item).await {
        Ok(Some(attempts)) => respond(
            encoding,
            StatusCode::OK,
            &Reply::Entry(ListEntry::new(item, attempts)),
        ),
        Ok(None) => ApiError::NotFound.into_response(encoding),
        Err(err) => ApiError::store("get list item")(err).into_response(encoding),
    }
}

async fn delete_one_handler(
    State(store): State<Arc<ListStore>>,
    Path((list, item)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let encoding = request_encoding(&headers);
    match store.delete_one(&list, &item).await {
        Ok(deleted) => respond(encoding, StatusCode::OK, &Reply::Deleted(deleted)),
        Err(err) => ApiError::store("delete list item")(err).into_response(encoding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse() {
        let parse = |action: Option<&str>| {
            ActionQuery {
                action: action.map(str::to_string),
            }
            .parse()
        };
        assert_eq!(parse(None).unwrap(), PostAction::Insert);
        assert_eq!(parse(Some("")).unwrap(), PostAction::Insert);
        assert_eq!(parse(Some("increment")).unwrap(), PostAction::Increment);
        assert!(matches!(
            parse(Some("explode")),
            Err(ApiError::InvalidQueryParam(_))
        ));
    }
}
