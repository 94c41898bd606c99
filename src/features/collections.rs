//! Collections shown through a [`Paginator`]: full lists windowed
//! client-side and the server-paged explore feed.

use crate::client::Client;
use crate::error::ApiError;
use crate::paginator::{LoadOutcome, PageSource, Paginator};
use async_trait::async_trait;
use feedcore::api::{CollectionSpec, Page, PageRequest, PagedListSpec};
use feedcore::types::feed::{Conversation, Notification, Post, sort_newest_first};
use log::debug;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Feature handle for list screens.
pub struct Collections<'a> {
    client: &'a Client,
}

impl<'a> Collections<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All conversations of the logged-in user, most recently active first.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let user_id = self.client.current_user_id().await?;
        let mut items = self
            .client
            .execute(CollectionSpec::conversations(&user_id))
            .await?;
        sort_newest_first(&mut items);
        debug!(target: "Collections", "Fetched {} conversations", items.len());
        Ok(items)
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let user_id = self.client.current_user_id().await?;
        let mut items = self
            .client
            .execute(CollectionSpec::notifications(&user_id))
            .await?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    /// Posts of any profile, for the profile grid.
    pub async fn profile_posts(&self, user_id: &str) -> Result<Vec<Post>, ApiError> {
        let mut items = self
            .client
            .execute(CollectionSpec::profile_posts(user_id))
            .await?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    /// The logged-in user's archived posts.
    pub async fn archive(&self) -> Result<Vec<Post>, ApiError> {
        let user_id = self.client.current_user_id().await?;
        let mut items = self.client.execute(CollectionSpec::archive(&user_id)).await?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    /// Refetches conversations into `pager`, keeping its items on failure.
    pub async fn load_conversations(&self, pager: &Paginator<Conversation>) -> LoadOutcome {
        pager.refresh_with(self.conversations()).await
    }

    pub async fn load_notifications(&self, pager: &Paginator<Notification>) -> LoadOutcome {
        pager.refresh_with(self.notifications()).await
    }

    pub async fn load_profile_posts(&self, user_id: &str, pager: &Paginator<Post>) -> LoadOutcome {
        pager.refresh_with(self.profile_posts(user_id)).await
    }
}

/// Server-paged source backed by a `GET {path}?page=&limit=` endpoint.
pub struct EndpointPageSource<T> {
    client: Arc<Client>,
    path: String,
    items_field: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T> EndpointPageSource<T> {
    pub fn new(client: Arc<Client>, path: impl Into<String>, items_field: &'static str) -> Self {
        Self {
            client,
            path: path.into(),
            items_field,
            _item: PhantomData,
        }
    }
}

impl EndpointPageSource<Post> {
    pub fn explore(client: Arc<Client>) -> Self {
        Self::new(client, "/posts/explore", "posts")
    }
}

#[async_trait]
impl<T> PageSource<T> for EndpointPageSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<Page<T>, ApiError> {
        let spec = PagedListSpec::new(self.path.clone(), request).with_items_field(self.items_field);
        self.client.execute(spec).await
    }
}

impl Client {
    /// Access list screens.
    pub fn collections(&self) -> Collections<'_> {
        Collections::new(self)
    }

    /// A client-side window for a collection loaded in one request.
    pub fn client_side_list<T: Send>(&self, name: &str) -> Paginator<T> {
        Paginator::client_side(name, self.config.page_size, self.event_bus.clone())
    }

    /// The explore feed, fetched page by page from the server.
    pub fn explore_feed(self: &Arc<Self>) -> Paginator<Post> {
        let source: Arc<dyn PageSource<Post>> = Arc::new(EndpointPageSource::explore(self.clone()));
        Paginator::server_paged("explore", source, self.config.page_size, self.event_bus.clone())
    }
}
