//! Purchase-history records and the record-store capability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// External user identifier (stable across sessions)
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A recorded purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub user_id: String,
    pub store_name: String,
    /// Purchase category, e.g. "Hot Cocoa"
    pub category: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// A purchase about to be recorded (no timestamp yet — the store stamps it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchase {
    pub store_name: String,
    pub category: String,

    #[serde(default)]
    pub amount: f64,
}

/// The purchase-history capability.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Look up a user by external id, creating the record if absent.
    async fn get_or_create_user(&self, user_id: &str) -> std::result::Result<User, StoreError>;

    /// Append a purchase for a user.
    async fn record_purchase(
        &self,
        user_id: &str,
        purchase: NewPurchase,
    ) -> std::result::Result<Purchase, StoreError>;

    /// The `limit` most recent purchases for a user, newest first.
    async fn recent_purchases(
        &self,
        user_id: &str,
        limit: usize,
    ) -> std::result::Result<Vec<Purchase>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_purchase_amount_defaults_to_zero() {
        let p: NewPurchase =
            serde_json::from_str(r#"{"store_name":"X","category":"Coffee"}"#).unwrap();
        assert_eq!(p.amount, 0.0);
    }

    #[test]
    fn purchase_roundtrips() {
        let p = Purchase {
            user_id: "user_1a2b".into(),
            store_name: "Harbor Beans".into(),
            category: "Espresso".into(),
            amount: 4.5,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: Purchase = serde_json::from_str(&json).unwrap();
        assert_eq!(back.store_name, "Harbor Beans");
        assert!((back.amount - 4.5).abs() < 1e-9);
    }
}
