//! Entity types stored and served by the laundry core.
//!
//! Currency values are whole rupiah (`i64`, no cents in this domain).
//! Weights are kilograms in 0.5 steps. Timestamps are stored as RFC 3339
//! UTC strings and exposed as `chrono` types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pricing mode of an order: per-kilogram or per-item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Kilo,
    Satuan,
}

impl Category {
    pub fn code(self) -> &'static str {
        match self {
            Category::Kilo => "kilo",
            Category::Satuan => "satuan",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "kilo" => Some(Category::Kilo),
            "satuan" => Some(Category::Satuan),
            _ => None,
        }
    }
}

/// Order lifecycle status. Transitions are unconstrained: any status can
/// be set from any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Proses,
    Siap,
    Selesai,
}

impl OrderStatus {
    /// Fixed display order used by filter chips and report breakdowns.
    pub const ALL: [OrderStatus; 3] = [OrderStatus::Proses, OrderStatus::Siap, OrderStatus::Selesai];

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Proses => "Proses",
            OrderStatus::Siap => "Siap",
            OrderStatus::Selesai => "Selesai",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Proses" => Some(OrderStatus::Proses),
            "Siap" => Some(OrderStatus::Siap),
            "Selesai" => Some(OrderStatus::Selesai),
            _ => None,
        }
    }
}

/// Service category master row. The `code` decides which offering table
/// and which speed surcharge column apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub code: Category,
    pub name: String,
    pub active: bool,
}

/// A per-kilogram service offering (e.g. wash & iron).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KiloService {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_per_kg: i64,
    pub active: bool,
}

/// A per-item offering (e.g. bed cover, shoes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatuanItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_per_item: i64,
    pub active: bool,
}

/// Service speed tier (e.g. regular, express). The surcharge is additive
/// per unit and depends on the order category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub extra_price_kilo: i64,
    pub extra_price_satuan: i64,
    pub active: bool,
}

impl Speed {
    /// Surcharge per unit for the given category.
    pub fn extra_for(&self, category: Category) -> i64 {
        match category {
            Category::Kilo => self.extra_price_kilo,
            Category::Satuan => self.extra_price_satuan,
        }
    }
}

/// A stored laundry order.
///
/// Exactly one of `kilo_service_id`/`satuan_item_id` is set, matching
/// `category`, and likewise for `weight_kg`/`qty`. All price fields are
/// recomputed by the store on create and update; caller-supplied totals
/// are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Sequential shop-unique number, allocated by the db layer on
    /// create and never reused.
    pub order_number: i64,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub note: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub kilo_service_id: Option<String>,
    #[serde(default)]
    pub satuan_item_id: Option<String>,
    pub speed_id: String,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub qty: Option<i64>,
    pub base_price: i64,
    pub express_extra: i64,
    pub price_per_unit: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// The service offering this order references.
    pub fn service_id(&self) -> Option<&str> {
        self.kilo_service_id
            .as_deref()
            .or(self.satuan_item_id.as_deref())
    }
}

/// Shop profile singleton. `active_until` is the subscription expiry
/// gating order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub laundry_name: String,
    pub address: String,
    pub phone: String,
    pub active_until: DateTime<Utc>,
}

/// Singleton template wrapping order details into the outgoing WhatsApp
/// message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub header: String,
    pub footer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_code_round_trip() {
        for cat in [Category::Kilo, Category::Satuan] {
            assert_eq!(Category::from_code(cat.code()), Some(cat));
        }
        assert_eq!(Category::from_code("weekly"), None);
    }

    #[test]
    fn status_label_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(OrderStatus::from_label("pending"), None);
    }

    #[test]
    fn order_json_shape() {
        let order = Order {
            id: "ord-1".into(),
            order_number: 7,
            customer_name: "Budi".into(),
            customer_phone: "0812".into(),
            note: None,
            category: Category::Kilo,
            kilo_service_id: Some("svc-1".into()),
            satuan_item_id: None,
            speed_id: "sp-1".into(),
            weight_kg: Some(2.5),
            qty: None,
            base_price: 5000,
            express_extra: 0,
            price_per_unit: 5000,
            total_price: 12500,
            status: OrderStatus::Proses,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["category"], "kilo");
        assert_eq!(json["status"], "Proses");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_price, order.total_price);
        assert_eq!(back.category, order.category);
    }

    #[test]
    fn speed_surcharge_follows_category() {
        let speed = Speed {
            id: "sp-1".into(),
            name: "Express".into(),
            description: None,
            extra_price_kilo: 2000,
            extra_price_satuan: 5000,
            active: true,
        };
        assert_eq!(speed.extra_for(Category::Kilo), 2000);
        assert_eq!(speed.extra_for(Category::Satuan), 5000);
    }
}
