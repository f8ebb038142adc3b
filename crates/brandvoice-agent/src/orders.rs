//! Read-only order snapshot.
//!
//! Loaded once at process start and shared as `Arc<OrderBook>` with the
//! components that answer order-status questions. Never mutated after load.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::OrderBookError;

/// One order as stored in the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub status: String,
    #[serde(default)]
    pub eta_days: Option<u32>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Orders keyed by order id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    orders: HashMap<String, Order>,
}

impl OrderBook {
    pub fn new(orders: HashMap<String, Order>) -> Self {
        Self { orders }
    }

    /// Parse a JSON object of `order_id -> order`.
    pub fn from_json_str(json: &str) -> Result<Self, OrderBookError> {
        let orders: HashMap<String, Order> = serde_json::from_str(json)?;
        Ok(Self { orders })
    }

    /// Load the snapshot from disk.
    ///
    /// A missing or malformed file yields an empty book; lookups then report
    /// that the order database is not loaded.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "orders file not readable");
                return Self::default();
            }
        };

        match Self::from_json_str(&content) {
            Ok(book) => {
                info!(path = %path.display(), orders = book.len(), "orders loaded");
                book
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid orders file");
                Self::default()
            }
        }
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Customer-facing status line for `order_id`.
    pub fn lookup(&self, order_id: &str) -> String {
        if self.orders.is_empty() {
            return "The order database is not loaded. Please contact an administrator."
                .to_string();
        }

        let Some(order) = self.orders.get(order_id) else {
            return format!("Order {} not found.", order_id);
        };

        match order.status.as_str() {
            "in_transit" => {
                let eta = order
                    .eta_days
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let carrier = order.carrier.as_deref().unwrap_or("unknown");
                format!(
                    "Order {} is in transit. Expected in {} days. Carrier: {}",
                    order_id, eta, carrier
                )
            }
            "delivered" => format!(
                "Order {} was delivered {}",
                order_id,
                order.delivered_at.as_deref().unwrap_or("recently")
            ),
            "processing" => format!(
                "Order {} is being processed. {}",
                order_id,
                order.note.as_deref().unwrap_or_default()
            )
            .trim_end()
            .to_string(),
            other => format!("Order {} has status: {}", order_id, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = r#"{
        "1001": {"status": "in_transit", "eta_days": 2, "carrier": "DHL"},
        "1002": {"status": "delivered", "delivered_at": "2024-05-01"},
        "1003": {"status": "processing", "note": "Awaiting payment."},
        "1004": {"status": "cancelled"}
    }"#;

    fn book() -> OrderBook {
        OrderBook::from_json_str(ORDERS).expect("parse orders")
    }

    #[test]
    fn renders_each_status() {
        let book = book();
        assert_eq!(
            book.lookup("1001"),
            "Order 1001 is in transit. Expected in 2 days. Carrier: DHL"
        );
        assert_eq!(book.lookup("1002"), "Order 1002 was delivered 2024-05-01");
        assert_eq!(
            book.lookup("1003"),
            "Order 1003 is being processed. Awaiting payment."
        );
        assert_eq!(book.lookup("1004"), "Order 1004 has status: cancelled");
    }

    #[test]
    fn unknown_order_is_not_found() {
        assert_eq!(book().lookup("9999"), "Order 9999 not found.");
    }

    #[test]
    fn empty_book_reports_not_loaded() {
        let empty = OrderBook::default();
        assert!(empty.lookup("1001").contains("not loaded"));
    }

    #[test]
    fn processing_without_note_has_no_trailing_space() {
        let book = OrderBook::from_json_str(r#"{"7": {"status": "processing"}}"#).unwrap();
        assert_eq!(book.lookup("7"), "Order 7 is being processed.");
    }

    #[test]
    fn missing_file_loads_empty_book() {
        let dir = tempfile::tempdir().unwrap();
        let book = OrderBook::load(&dir.path().join("orders.json"));
        assert!(book.is_empty());
    }

    #[test]
    fn malformed_file_loads_empty_book() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(OrderBook::load(&path).is_empty());
    }
}
