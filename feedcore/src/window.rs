//! Paging arithmetic over an in-memory collection.
//!
//! A `ListWindow` holds every item known so far and reveals a prefix of it.
//! The visible slice is always `source[..visible_count]` in source order, so
//! callers sort before resetting. Two modes exist:
//!
//! - [`PagingMode::ClientSide`]: the whole collection was fetched up front;
//!   `has_more` is simply whether unrevealed items remain.
//! - [`PagingMode::ServerPaged`]: pages arrive from the server and the server's
//!   own `hasMore` flag says whether another page exists.

use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    ClientSide,
    ServerPaged,
}

#[derive(Debug, Clone)]
pub struct ListWindow<T> {
    source: Vec<T>,
    page_size: usize,
    visible_count: usize,
    has_more: bool,
    mode: PagingMode,
    server_has_more: bool,
    generation: u64,
}

/// Zero is not a usable page size; it is treated as one.
pub fn normalize_page_size(page_size: usize) -> usize {
    if page_size == 0 {
        warn!(target: "Paginator", "page size 0 is invalid, using 1");
        1
    } else {
        page_size
    }
}

impl<T> ListWindow<T> {
    pub fn empty(mode: PagingMode, page_size: usize) -> Self {
        Self {
            source: Vec::new(),
            page_size: normalize_page_size(page_size),
            visible_count: 0,
            has_more: false,
            mode,
            server_has_more: false,
            generation: 0,
        }
    }

    pub fn client_side(source: Vec<T>, page_size: usize) -> Self {
        let mut window = Self::empty(PagingMode::ClientSide, page_size);
        window.reset(source);
        window
    }

    pub fn server_paged(source: Vec<T>, page_size: usize, server_has_more: bool) -> Self {
        let mut window = Self::empty(PagingMode::ServerPaged, page_size);
        window.reset_server_page(source, server_has_more);
        window
    }

    /// Replaces the source wholesale and shows the first page again. Bumps the
    /// generation so answers to requests issued before the reset can be
    /// recognised and dropped.
    ///
    /// The new source is taken as complete in both modes: a server-paged
    /// window expects no further page until the next `reset_server_page`.
    pub fn reset(&mut self, source: Vec<T>) {
        self.server_has_more = false;
        self.replace_source(source);
    }

    /// Server-paged reset with the first page and the server's `hasMore`.
    pub fn reset_server_page(&mut self, source: Vec<T>, server_has_more: bool) {
        self.server_has_more = server_has_more;
        self.replace_source(source);
    }

    fn replace_source(&mut self, source: Vec<T>) {
        self.source = source;
        self.visible_count = self.page_size.min(self.source.len());
        self.generation += 1;
        self.recompute_has_more();
    }

    /// Reveals up to one more page. Returns false when nothing changed.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more {
            return false;
        }
        let before = self.visible_count;
        self.reveal_next_page();
        self.visible_count != before
    }

    /// Concatenates newly fetched items, then reveals like `load_more`.
    pub fn append(&mut self, items: Vec<T>) {
        self.source.extend(items);
        self.reveal_next_page();
    }

    pub fn append_server_page(&mut self, items: Vec<T>, server_has_more: bool) {
        self.server_has_more = server_has_more;
        self.append(items);
    }

    fn reveal_next_page(&mut self) {
        self.visible_count = (self.visible_count + self.page_size).min(self.source.len());
        self.recompute_has_more();
    }

    fn recompute_has_more(&mut self) {
        let buffered = self.visible_count < self.source.len();
        self.has_more = match self.mode {
            PagingMode::ClientSide => buffered,
            PagingMode::ServerPaged => buffered || self.server_has_more,
        };
    }

    pub fn visible(&self) -> &[T] {
        &self.source[..self.visible_count]
    }

    pub fn source(&self) -> &[T] {
        &self.source
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether fetched-but-hidden items remain, so the next page needs no request.
    pub fn has_buffered(&self) -> bool {
        self.visible_count < self.source.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
