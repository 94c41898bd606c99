//! Collection endpoints: server-paged lists (explore feed) and full
//! collections windowed client-side (conversations, notifications, grids).

use crate::api::spec::{ApiRequest, ApiSpec, path_segment};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// 1-based page number plus page length, as sent to paged endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { page: 1, limit }
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}

/// Decodes each element on its own so one bad document does not cost the page.
fn decode_items<T: DeserializeOwned>(entries: &[Value], path: &str) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| match T::deserialize(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(target: "Api/List", "Skipping undecodable item from {path}: {e}");
                None
            }
        })
        .collect()
}

pub struct PagedListSpec<T> {
    path: String,
    request: PageRequest,
    items_field: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for PagedListSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedListSpec")
            .field("path", &self.path)
            .field("request", &self.request)
            .field("items_field", &self.items_field)
            .finish()
    }
}

impl<T> PagedListSpec<T> {
    pub fn new(path: impl Into<String>, request: PageRequest) -> Self {
        Self {
            path: path.into(),
            request,
            items_field: "items",
            _item: PhantomData,
        }
    }

    /// Explore feed: `GET /posts/explore?page=&limit=` answering `{posts, hasMore}`.
    pub fn explore(request: PageRequest) -> Self {
        Self::new("/posts/explore", request).with_items_field("posts")
    }

    pub fn with_items_field(mut self, field: &'static str) -> Self {
        self.items_field = field;
        self
    }
}

impl<T: DeserializeOwned> ApiSpec for PagedListSpec<T> {
    type Response = Page<T>;

    fn build_request(&self) -> ApiRequest {
        ApiRequest::get(self.path.clone())
            .query("page", self.request.page)
            .query("limit", self.request.limit)
    }

    /// A body without an item array degrades to an empty, final page.
    fn parse_response(&self, body: &[u8]) -> Result<Page<T>, anyhow::Error> {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            warn!(target: "Api/List", "Non-JSON page from {}, treating as empty", self.path);
            return Ok(Page::empty());
        };
        let Some(entries) = value.get(self.items_field).and_then(Value::as_array) else {
            warn!(
                target: "Api/List",
                "Page from {} has no '{}' array, treating as empty",
                self.path, self.items_field
            );
            return Ok(Page::empty());
        };
        Ok(Page {
            items: decode_items(entries, &self.path),
            has_more: value
                .get("hasMore")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

/// A whole collection fetched once. The body is either a bare array or an
/// object holding the array under `items_field`.
pub struct CollectionSpec<T> {
    path: String,
    items_field: Option<&'static str>,
    _item: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for CollectionSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSpec")
            .field("path", &self.path)
            .field("items_field", &self.items_field)
            .finish()
    }
}

impl<T> CollectionSpec<T> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            items_field: None,
            _item: PhantomData,
        }
    }

    pub fn with_items_field(mut self, field: &'static str) -> Self {
        self.items_field = Some(field);
        self
    }

    pub fn conversations(user_id: &str) -> Self {
        Self::new(format!("/conversations/{}", path_segment(user_id)))
    }

    pub fn notifications(user_id: &str) -> Self {
        Self::new(format!("/notifications/{}", path_segment(user_id)))
    }

    pub fn profile_posts(user_id: &str) -> Self {
        Self::new(format!("/users/{}/posts", path_segment(user_id))).with_items_field("posts")
    }

    pub fn archive(user_id: &str) -> Self {
        Self::new(format!("/users/{}/archive", path_segment(user_id))).with_items_field("posts")
    }
}

impl<T: DeserializeOwned> ApiSpec for CollectionSpec<T> {
    type Response = Vec<T>;

    fn build_request(&self) -> ApiRequest {
        ApiRequest::get(self.path.clone())
    }

    fn parse_response(&self, body: &[u8]) -> Result<Vec<T>, anyhow::Error> {
        let value = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        let entries = match (&value, self.items_field) {
            (Value::Array(entries), _) => Some(entries),
            (Value::Object(_), Some(field)) => value.get(field).and_then(Value::as_array),
            _ => None,
        };
        match entries {
            Some(entries) => Ok(decode_items(entries, &self.path)),
            None => {
                warn!(target: "Api/List", "Collection from {} is malformed, treating as empty", self.path);
                Ok(Vec::new())
            }
        }
    }
}
