//! # Shared Types
//!
//! Small types used by every aggregate.
//!
//! ## Dual-Key Identity Pattern
//! Documents have:
//! - `id`: integer primary key, used for relations
//! - a business code (`INV-000042`, `IMP-000007`) - human-readable, printed,
//!   drawn from a persisted sequence so it never collides

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Actor
// =============================================================================

/// Who performed a mutation, plus the request it came from.
///
/// Every field is optional so system-originated writes can be audited too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    /// An actor with no user attached (migrations, maintenance jobs).
    pub fn system() -> Self {
        Actor::default()
    }

    /// An authenticated user.
    pub fn user(user_id: i64, user_name: impl Into<String>) -> Self {
        Actor {
            user_id: Some(user_id),
            user_name: Some(user_name.into()),
            ..Actor::default()
        }
    }

    /// Attaches request metadata.
    pub fn with_request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// A normalized page request (1-based page, bounded limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Normalizes raw query values.
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::PageRequest;
    ///
    /// let page = PageRequest::new(Some(3), Some(500));
    /// assert_eq!(page.limit, 100);
    /// assert_eq!(page.offset(), 200);
    /// ```
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        PageRequest {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .min(MAX_PAGE_LIMIT),
        }
    }

    /// Rows to skip.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: PageRequest) -> Self {
        Paginated {
            items,
            total,
            page: page.page,
            limit: page.limit,
        }
    }
}

// =============================================================================
// Code Sequences
// =============================================================================

/// Named persisted counters that produce document codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSequence {
    Invoice,
    ImportOrder,
}

impl CodeSequence {
    /// Row key in the `code_sequences` table.
    pub const fn name(&self) -> &'static str {
        match self {
            CodeSequence::Invoice => "invoice",
            CodeSequence::ImportOrder => "import_order",
        }
    }

    /// Formats a counter value as a printable code.
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::CodeSequence;
    ///
    /// assert_eq!(CodeSequence::Invoice.format(42), "INV-000042");
    /// assert_eq!(CodeSequence::ImportOrder.format(7), "IMP-000007");
    /// ```
    pub fn format(&self, value: i64) -> String {
        let prefix = match self {
            CodeSequence::Invoice => "INV",
            CodeSequence::ImportOrder => "IMP",
        };
        format!("{}-{:06}", prefix, value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(Some(0), Some(0));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_page_request_offset() {
        let page = PageRequest::new(Some(4), Some(25));
        assert_eq!(page.offset(), 75);
    }

    #[test]
    fn test_code_format_grows_past_padding() {
        assert_eq!(CodeSequence::Invoice.format(1), "INV-000001");
        assert_eq!(CodeSequence::Invoice.format(1_234_567), "INV-1234567");
    }

    #[test]
    fn test_actor_builders() {
        let actor = Actor::user(7, "thu.ngan").with_request(Some("10.0.0.1".into()), None);
        assert_eq!(actor.user_id, Some(7));
        assert_eq!(actor.user_name.as_deref(), Some("thu.ngan"));
        assert_eq!(actor.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(Actor::system().user_id, None);
    }
}
