//! Offset- and cursor-paginated envelopes.
//!
//! Both forms are read-only: the next request is derived from the last decoded
//! envelope and the request that produced it. The client keeps no cursor state.

use serde::{Deserialize, Serialize};

use crate::pipeline::RequestDescriptor;

/// Offset envelope: `{ items, limit, offset, total, next, previous }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

// manual impl: no `T: Default` bound
impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            href: None,
            items: Vec::new(),
            limit: 0,
            offset: 0,
            total: 0,
            next: None,
            previous: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOffset {
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn page_offset(&self) -> PageOffset {
        PageOffset {
            limit: self.limit,
            offset: self.offset,
            total: self.total,
            has_next: self.has_next(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total || self.next.is_some()
    }

    fn step(&self) -> u32 {
        if self.limit > 0 {
            self.limit
        } else {
            self.items.len() as u32
        }
    }

    /// `current` with `offset` advanced by `limit`, or `None` on the last page.
    pub fn next_request(&self, current: &RequestDescriptor) -> Option<RequestDescriptor> {
        let step = self.step();
        if !self.has_next() || step == 0 {
            return None;
        }
        let next = self.offset.saturating_add(step);
        Some(current.with_query("offset", &next.to_string()))
    }

    /// `current` with `offset` moved back by `limit`, or `None` on the first page.
    pub fn previous_request(&self, current: &RequestDescriptor) -> Option<RequestDescriptor> {
        if self.offset == 0 {
            return None;
        }
        let previous = self.offset.saturating_sub(self.step());
        Some(current.with_query("offset", &previous.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

/// Cursor envelope: `{ items, cursors: { after, before } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct CursorPage<T> {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
}

impl<T> Default for CursorPage<T> {
    fn default() -> Self {
        Self {
            href: None,
            items: Vec::new(),
            limit: None,
            next: None,
            total: None,
            cursors: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorDirection {
    /// Older/further items: substitutes `after`.
    After,
    /// Substitutes `before`.
    Before,
}

impl CursorDirection {
    fn key(self) -> &'static str {
        match self {
            CursorDirection::After => "after",
            CursorDirection::Before => "before",
        }
    }

    fn opposite(self) -> &'static str {
        match self {
            CursorDirection::After => "before",
            CursorDirection::Before => "after",
        }
    }
}

impl<T> CursorPage<T> {
    pub fn page_cursor(&self) -> PageCursor {
        let cursors = self.cursors.clone().unwrap_or_default();
        PageCursor {
            before: cursors.before.filter(|c| !c.is_empty()),
            after: cursors.after.filter(|c| !c.is_empty()),
        }
    }

    /// An empty page without any cursor value ends the walk in both directions.
    pub fn is_terminal(&self) -> bool {
        let cursor = self.page_cursor();
        self.items.is_empty() && cursor.before.is_none() && cursor.after.is_none()
    }

    pub fn request_toward(
        &self,
        direction: CursorDirection,
        current: &RequestDescriptor,
    ) -> Option<RequestDescriptor> {
        if self.is_terminal() {
            return None;
        }
        let cursor = self.page_cursor();
        let value = match direction {
            CursorDirection::After => cursor.after,
            CursorDirection::Before => cursor.before,
        }?;
        Some(
            current
                .without_query(direction.opposite())
                .with_query(direction.key(), &value),
        )
    }

    pub fn next_request(&self, current: &RequestDescriptor) -> Option<RequestDescriptor> {
        self.request_toward(CursorDirection::After, current)
    }

    pub fn previous_request(&self, current: &RequestDescriptor) -> Option<RequestDescriptor> {
        self.request_toward(CursorDirection::Before, current)
    }
}
