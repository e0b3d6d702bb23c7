//! The product record and its value types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Number of fractional digits stored for a price
pub const PRICE_SCALE: u32 = 2;

/// Total significant digits a price may carry
pub const PRICE_MAX_DIGITS: u32 = 10;

/// Availability of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Wire and storage representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Self::InStock),
            "out_of_stock" => Ok(Self::OutOfStock),
            other => Err(format!("\"{other}\" is not a valid choice.")),
        }
    }
}

/// Non-negative fixed-point amount with two fractional digits
///
/// Always serialized as a string (`"12.50"`) so no precision is lost on
/// the way to JSON clients. Accepts either a string or a number on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Wrap an amount, normalizing it to two decimal places
    ///
    /// Returns `None` for negative amounts and for amounts that do not fit
    /// `NUMERIC(10, 2)`.
    pub fn new(amount: Decimal) -> Option<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return None;
        }
        let normalized = amount.normalize();
        if normalized.scale() > PRICE_SCALE {
            return None;
        }
        let whole_limit = Decimal::from(10_u64.pow(PRICE_MAX_DIGITS - PRICE_SCALE));
        if normalized.trunc().abs() >= whole_limit {
            return None;
        }
        let mut scaled = normalized;
        scaled.rescale(PRICE_SCALE);
        // -0.00 compares equal to zero but renders with a sign
        scaled.set_sign_positive(true);
        Some(Self(scaled))
    }

    /// The underlying decimal
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        let amount = Decimal::from_str(text.trim()).map_err(serde::de::Error::custom)?;
        Price::new(amount)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price amount: {text}")))
    }
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: Price,
    pub stock_status: StockStatus,
    pub sku: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub stock_status: StockStatus,
    pub sku: String,
    pub description: String,
}

/// Validated field changes for an existing product
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub stock_status: Option<StockStatus>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl ProductChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock_status.is_none()
            && self.sku.is_none()
            && self.description.is_none()
    }
}

impl From<NewProduct> for ProductChanges {
    fn from(p: NewProduct) -> Self {
        Self {
            name: Some(p.name),
            category: Some(p.category),
            price: Some(p.price),
            stock_status: Some(p.stock_status),
            sku: Some(p.sku),
            description: Some(p.description),
        }
    }
}

impl Product {
    /// Build a fresh record with a new v4 id and both timestamps set to `now`
    pub fn create(input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            category: input.category,
            price: input.price,
            stock_status: input.stock_status,
            sku: input.sku,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply changes and refresh `updated_at`
    pub fn apply(&mut self, changes: ProductChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(stock_status) = changes.stock_status {
            self.stock_status = stock_status;
        }
        if let Some(sku) = changes.sku {
            self.sku = sku;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        self.touch(now);
    }

    /// Advance `updated_at`, strictly past its previous value
    ///
    /// A clock that did not move (or went backwards) still yields a
    /// timestamp one microsecond after the last one.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewProduct {
        NewProduct {
            name: "Desk Lamp".to_string(),
            category: "Lighting".to_string(),
            price: Price::new(Decimal::new(1999, 2)).unwrap(),
            stock_status: StockStatus::InStock,
            sku: "LAMP-001".to_string(),
            description: "Adjustable arm".to_string(),
        }
    }

    #[test]
    fn test_price_normalizes_to_two_places() {
        let price = Price::new(Decimal::new(125, 1)).unwrap();
        assert_eq!(price.to_string(), "12.50");
        assert_eq!(Price::new(Decimal::from(7)).unwrap().to_string(), "7.00");
        assert_eq!(Price::new(Decimal::new(1500, 3)).unwrap().to_string(), "1.50");
    }

    #[test]
    fn test_price_rejects_negative_and_excess_scale() {
        assert!(Price::new(Decimal::new(-1, 2)).is_none());
        assert!(Price::new(Decimal::new(1001, 3)).is_none());
        assert_eq!(Price::new(Decimal::ZERO).unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_price_rejects_more_than_eight_whole_digits() {
        assert_eq!(
            Price::new(Decimal::new(9_999_999_999, 2)).unwrap().to_string(),
            "99999999.99"
        );
        assert!(Price::new(Decimal::from(100_000_000)).is_none());
        assert!(Price::new(Decimal::new(1_234_567_890_100, 2)).is_none());
    }

    #[test]
    fn test_price_serializes_as_string() {
        let price = Price::new(Decimal::new(5, 0)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"5.00\"");
    }

    #[test]
    fn test_price_deserializes_from_string_or_number() {
        let from_str: Price = serde_json::from_str("\"3.10\"").unwrap();
        let from_num: Price = serde_json::from_str("3.1").unwrap();
        assert_eq!(from_str, from_num);
        assert!(serde_json::from_str::<Price>("\"-2\"").is_err());
    }

    #[test]
    fn test_price_deserialize_enforces_digit_limits() {
        assert!(serde_json::from_str::<Price>("\"12345678901.00\"").is_err());
        assert!(serde_json::from_str::<Price>("123456789").is_err());
        let max: Price = serde_json::from_str("\"99999999.99\"").unwrap();
        assert_eq!(max.to_string(), "99999999.99");
    }

    #[test]
    fn test_stock_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&StockStatus::OutOfStock).unwrap(),
            "\"out_of_stock\""
        );
        assert_eq!("in_stock".parse::<StockStatus>(), Ok(StockStatus::InStock));
        assert_eq!(
            "backorder".parse::<StockStatus>(),
            Err("\"backorder\" is not a valid choice.".to_string())
        );
    }

    #[test]
    fn test_create_sets_both_timestamps() {
        let now = Utc::now();
        let product = Product::create(sample(), now);
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
        assert_eq!(product.id.get_version_num(), 4);
    }

    #[test]
    fn test_apply_changes_only_supplied_fields() {
        let now = Utc::now();
        let mut product = Product::create(sample(), now);
        product.apply(
            ProductChanges {
                name: Some("Floor Lamp".to_string()),
                ..Default::default()
            },
            now + Duration::seconds(1),
        );
        assert_eq!(product.name, "Floor Lamp");
        assert_eq!(product.sku, "LAMP-001");
        assert_eq!(product.updated_at, now + Duration::seconds(1));
        assert_eq!(product.created_at, now);
    }

    #[test]
    fn test_touch_is_strictly_monotonic_on_clock_tie() {
        let now = Utc::now();
        let mut product = Product::create(sample(), now);
        product.touch(now);
        assert!(product.updated_at > now);
        let after_first = product.updated_at;
        product.touch(now - Duration::seconds(5));
        assert!(product.updated_at > after_first);
        assert!(product.updated_at >= product.created_at);
    }

    #[test]
    fn test_new_product_into_changes_is_complete() {
        let changes: ProductChanges = sample().into();
        assert!(changes.name.is_some() && changes.description.is_some());
        assert!(!changes.is_empty());
        assert!(ProductChanges::default().is_empty());
    }
}
