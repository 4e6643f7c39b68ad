//! # Audit Trail
//!
//! Immutable before/after records of entity mutations, and the
//! human-readable change summary stored with each record.
//!
//! ## Change Summary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  old snapshot ─┐                                                        │
//! │                ├─► summarize_changes() ─► "customer_name: A → B;        │
//! │  new snapshot ─┘                            paid_amount: 0.00 → 50.00"  │
//! │                                                                         │
//! │  Order is fixed:                                                        │
//! │    1. text fields          (SCALAR_FIELDS order)                        │
//! │    2. amount fields        (AMOUNT_FIELDS order, two decimals)          │
//! │    3. items count          (only when it differs)                       │
//! │    4. removed items        (old order)                                  │
//! │    5. added items          (new order)                                  │
//! │    6. changed items        (old order: quantity, then price)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::types::Actor;

/// Text fields compared one by one, in this order.
pub const SCALAR_FIELDS: [&str; 7] = [
    "customer_name",
    "customer_phone",
    "customer_address",
    "notes",
    "payment_method",
    "status",
    "payment_status",
];

/// Amount fields compared with two-decimal formatting, in this order.
pub const AMOUNT_FIELDS: [&str; 4] = ["discount_amount", "tax_amount", "paid_amount", "total_amount"];

/// Summary used when two snapshots are equivalent.
pub const NO_CHANGES: &str = "No changes detected";

/// Entity type names written to `audit_logs.entity_type`.
pub mod entity {
    pub const INVOICE: &str = "invoice";
    pub const IMPORT_ORDER: &str = "import_order";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

/// A stored audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuditLog {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub action: AuditAction,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    #[ts(type = "unknown")]
    pub old_data: Option<Value>,
    #[ts(type = "unknown")]
    pub new_data: Option<Value>,
    pub changes_summary: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An audit record about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub entity_type: &'static str,
    pub entity_id: i64,
    pub action: AuditAction,
    pub actor: Actor,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
}

impl NewAuditEntry {
    pub fn created(entity_type: &'static str, entity_id: i64, actor: &Actor, new_data: Value) -> Self {
        NewAuditEntry {
            entity_type,
            entity_id,
            action: AuditAction::Created,
            actor: actor.clone(),
            old_data: None,
            new_data: Some(new_data),
        }
    }

    pub fn updated(
        entity_type: &'static str,
        entity_id: i64,
        actor: &Actor,
        old_data: Value,
        new_data: Value,
    ) -> Self {
        NewAuditEntry {
            entity_type,
            entity_id,
            action: AuditAction::Updated,
            actor: actor.clone(),
            old_data: Some(old_data),
            new_data: Some(new_data),
        }
    }

    pub fn deleted(
        entity_type: &'static str,
        entity_id: i64,
        actor: &Actor,
        old_data: Value,
        new_data: Option<Value>,
    ) -> Self {
        NewAuditEntry {
            entity_type,
            entity_id,
            action: AuditAction::Deleted,
            actor: actor.clone(),
            old_data: Some(old_data),
            new_data,
        }
    }

    /// Summary of the difference between the two snapshots.
    /// A missing side is treated as an empty object.
    pub fn changes_summary(&self) -> String {
        let empty = Value::Object(Default::default());
        summarize_changes(
            self.old_data.as_ref().unwrap_or(&empty),
            self.new_data.as_ref().unwrap_or(&empty),
        )
    }
}

// =============================================================================
// Diff
// =============================================================================

/// Produces the deterministic change summary for two snapshots.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use steel_core::audit::summarize_changes;
///
/// let summary = summarize_changes(
///     &json!({"customer_name": "A", "paid_amount": 0}),
///     &json!({"customer_name": "B", "paid_amount": 50}),
/// );
/// assert_eq!(summary, "customer_name: A → B; paid_amount: 0.00 → 50.00");
/// ```
pub fn summarize_changes(old: &Value, new: &Value) -> String {
    let mut changes = Vec::new();

    for field in SCALAR_FIELDS {
        let before = text_value(old.get(field));
        let after = text_value(new.get(field));
        if before != after {
            changes.push(format!("{}: {} → {}", field, before, after));
        }
    }

    for field in AMOUNT_FIELDS {
        let before = number_value(old.get(field));
        let after = number_value(new.get(field));
        if before != after {
            changes.push(format!("{}: {:.2} → {:.2}", field, before, after));
        }
    }

    let old_items = items_of(old);
    let new_items = items_of(new);
    if old_items.len() != new_items.len() {
        changes.push(format!("items count: {} → {}", old_items.len(), new_items.len()));
    }
    changes.extend(compare_items(&old_items, &new_items));

    if changes.is_empty() {
        NO_CHANGES.to_string()
    } else {
        changes.join("; ")
    }
}

fn text_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn number_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn items_of(snapshot: &Value) -> Vec<&Value> {
    snapshot
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter(|i| i.is_object()).collect())
        .unwrap_or_default()
}

/// Items are matched by `product_id`; free-text lines fall back to their name.
fn item_key(item: &Value) -> String {
    match item.get("product_id") {
        Some(Value::Null) | None => format!("name:{}", text_value(item.get("product_name"))),
        Some(id) => text_value(Some(id)),
    }
}

/// First occurrence of each key, in document order.
fn index_items<'a>(items: &[&'a Value]) -> (Vec<String>, HashMap<String, &'a Value>) {
    let mut order = Vec::new();
    let mut by_key = HashMap::new();
    for item in items {
        let key = item_key(item);
        if !by_key.contains_key(&key) {
            order.push(key.clone());
            by_key.insert(key, *item);
        }
    }
    (order, by_key)
}

fn compare_items(old_items: &[&Value], new_items: &[&Value]) -> Vec<String> {
    let (old_order, old_by_key) = index_items(old_items);
    let (new_order, new_by_key) = index_items(new_items);
    let old_keys: HashSet<&String> = old_order.iter().collect();
    let new_keys: HashSet<&String> = new_order.iter().collect();

    let mut changes = Vec::new();

    for key in old_order.iter().filter(|k| !new_keys.contains(k)) {
        changes.push(format!("removed item: {}", text_value(old_by_key[key].get("product_name"))));
    }

    for key in new_order.iter().filter(|k| !old_keys.contains(k)) {
        changes.push(format!("added item: {}", text_value(new_by_key[key].get("product_name"))));
    }

    for key in &old_order {
        let Some(after) = new_by_key.get(key) else {
            continue;
        };
        let before = old_by_key[key];
        let name = text_value(before.get("product_name"));

        let old_qty = number_value(before.get("quantity"));
        let new_qty = number_value(after.get("quantity"));
        if old_qty != new_qty {
            changes.push(format!("{} quantity: {} → {}", name, old_qty, new_qty));
        }

        let old_price = number_value(before.get("unit_price"));
        let new_price = number_value(after.get("unit_price"));
        if old_price != new_price {
            changes.push(format!("{} price: {:.2} → {:.2}", name, old_price, new_price));
        }
    }

    changes
}

// =============================================================================
// Queries
// =============================================================================

/// Filters for the audit log listing. Dates are inclusive calendar days (UTC).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub user_id: Option<i64>,
    #[ts(as = "Option<String>")]
    pub date_from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AuditFilter {
    /// Start of `date_from` as a UTC instant.
    pub fn from_instant(&self) -> Option<DateTime<Utc>> {
        self.date_from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Exclusive upper bound: start of the day after `date_to`.
    pub fn to_instant_exclusive(&self) -> Option<DateTime<Utc>> {
        self.date_to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_and_amount_changes() {
        let summary = summarize_changes(
            &json!({"customer_name": "A", "paid_amount": 0}),
            &json!({"customer_name": "B", "paid_amount": 50}),
        );
        assert!(summary.contains("customer_name: A → B"));
        assert!(summary.contains("paid_amount: 0.00 → 50.00"));
    }

    #[test]
    fn test_no_changes() {
        let snap = json!({"customer_name": "A", "total_amount": 10.5, "items": []});
        assert_eq!(summarize_changes(&snap, &snap), NO_CHANGES);
        assert_eq!(summarize_changes(&json!({}), &json!({})), NO_CHANGES);
    }

    #[test]
    fn test_null_and_missing_are_equal() {
        assert_eq!(
            summarize_changes(&json!({"notes": null}), &json!({})),
            NO_CHANGES
        );
    }

    #[test]
    fn test_numeric_strings_are_read() {
        let summary = summarize_changes(
            &json!({"total_amount": "100.5"}),
            &json!({"total_amount": 100.5}),
        );
        assert_eq!(summary, NO_CHANGES);
    }

    #[test]
    fn test_field_order_is_stable() {
        let summary = summarize_changes(
            &json!({"total_amount": 1, "status": "confirmed", "customer_name": "A"}),
            &json!({"total_amount": 2, "status": "cancelled", "customer_name": "B"}),
        );
        assert_eq!(
            summary,
            "customer_name: A → B; status: confirmed → cancelled; total_amount: 1.00 → 2.00"
        );
    }

    #[test]
    fn test_item_changes() {
        let old = json!({"items": [
            {"product_id": 1, "product_name": "Tôn", "quantity": 2, "unit_price": 100},
            {"product_id": 2, "product_name": "Thép", "quantity": 1, "unit_price": 50},
        ]});
        let new = json!({"items": [
            {"product_id": 1, "product_name": "Tôn", "quantity": 2.5, "unit_price": 120},
            {"product_id": 3, "product_name": "Xà gồ", "quantity": 1, "unit_price": 70},
        ]});

        assert_eq!(
            summarize_changes(&old, &new),
            "removed item: Thép; added item: Xà gồ; Tôn quantity: 2 → 2.5; Tôn price: 100.00 → 120.00"
        );
    }

    #[test]
    fn test_items_count_line() {
        let old = json!({"items": [{"product_id": 1, "product_name": "Tôn", "quantity": 1, "unit_price": 1}]});
        let new = json!({"items": []});
        assert_eq!(summarize_changes(&old, &new), "items count: 1 → 0; removed item: Tôn");
    }

    #[test]
    fn test_free_text_items_keyed_by_name() {
        let old = json!({"items": [{"product_id": null, "product_name": "Cắt", "quantity": 1, "unit_price": 10}]});
        let new = json!({"items": [{"product_id": null, "product_name": "Cắt", "quantity": 3, "unit_price": 10}]});
        assert_eq!(summarize_changes(&old, &new), "Cắt quantity: 1 → 3");
    }

    #[test]
    fn test_created_entry_summary() {
        let entry = NewAuditEntry::created(
            entity::INVOICE,
            1,
            &Actor::system(),
            json!({"customer_name": "A", "total_amount": 250.0}),
        );
        assert_eq!(
            entry.changes_summary(),
            "customer_name:  → A; total_amount: 0.00 → 250.00"
        );
    }

    #[test]
    fn test_filter_date_bounds() {
        let filter = AuditFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 31),
            ..Default::default()
        };
        assert_eq!(filter.from_instant().unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(
            filter.to_instant_exclusive().unwrap().to_rfc3339(),
            "2024-04-01T00:00:00+00:00"
        );
    }
}
