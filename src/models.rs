//! Typed API models and list wrappers.
//!
//! The API is loose about numeric types (ids and prices sometimes arrive as
//! strings), so numeric and boolean fields are decoded leniently. Fields the
//! models don't name are kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub plan_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price: Option<f64>,
    /// Data allowance in MB; 0 means unlimited.
    #[serde(default, deserialize_with = "lenient::u64")]
    pub data: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub validity_days: Option<u64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub reloadable: Option<bool>,
    #[serde(default)]
    pub countries: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub countries_count: Option<u64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Plan {
    pub fn plan_type(&self) -> &str {
        self.plan_type.as_deref().unwrap_or("local")
    }

    pub fn is_local(&self) -> bool {
        self.plan_type() == "local"
    }

    pub fn is_regional(&self) -> bool {
        self.plan_type() == "regional"
    }

    pub fn is_global(&self) -> bool {
        self.plan_type() == "global"
    }

    pub fn price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    pub fn validity_days(&self) -> u64 {
        self.validity_days.unwrap_or(0)
    }

    pub fn is_reloadable(&self) -> bool {
        self.reloadable.unwrap_or(false)
    }

    /// Whole gigabytes of data.
    pub fn data_gb(&self) -> u64 {
        self.data.unwrap_or(0) / 1024
    }

    pub fn is_unlimited(&self) -> bool {
        self.data.unwrap_or(0) == 0
    }

    /// Country codes, for plans that list them as plain strings.
    pub fn country_codes(&self) -> Vec<&str> {
        self.countries.iter().filter_map(Value::as_str).collect()
    }

    pub fn countries_count(&self) -> u64 {
        self.countries_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Country {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub plans_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub is_featured: Option<bool>,
    /// Flag image URL.
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Country {
    pub fn plans_count(&self) -> u64 {
        self.plans_count.unwrap_or(0)
    }

    pub fn is_featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "lenient::u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub plan_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub quantity: Option<u64>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("pending")
    }

    pub fn is_completed(&self) -> bool {
        self.status() == "completed"
    }

    pub fn is_pending(&self) -> bool {
        self.status() == "pending"
    }

    pub fn is_failed(&self) -> bool {
        self.status() == "failed"
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == "cancelled"
    }

    pub fn total_price(&self) -> f64 {
        self.total_price.unwrap_or(0.0)
    }

    pub fn quantity(&self) -> u64 {
        self.quantity.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Esim {
    #[serde(default)]
    pub iccid: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Remaining data in MB.
    #[serde(default, deserialize_with = "lenient::u64")]
    pub balance_data: Option<u64>,
    #[serde(default)]
    pub validity_end: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Esim {
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("pending")
    }

    pub fn is_active(&self) -> bool {
        self.status() == "active"
    }

    pub fn is_pending(&self) -> bool {
        self.status() == "pending"
    }

    pub fn is_expired(&self) -> bool {
        self.status() == "expired"
    }

    pub fn is_suspended(&self) -> bool {
        self.status() == "suspended"
    }

    pub fn balance_data(&self) -> u64 {
        self.balance_data.unwrap_or(0)
    }
}

/// An ordered list of items returned by a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn filter<F>(&self, mut predicate: F) -> Collection<T>
    where
        T: Clone,
        F: FnMut(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(*item)).cloned().collect()
    }

    pub fn map<U, F>(&self, f: F) -> Collection<U>
    where
        F: FnMut(&T) -> U,
    {
        self.items.iter().map(f).collect()
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Pagination block of a list response. Accepts both snake_case and
/// camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationMeta {
    #[serde(default, alias = "currentPage", deserialize_with = "lenient::u64")]
    pub current_page: Option<u64>,
    #[serde(default, alias = "perPage", deserialize_with = "lenient::u64")]
    pub per_page: Option<u64>,
    #[serde(default, deserialize_with = "lenient::u64")]
    pub total: Option<u64>,
    #[serde(default, alias = "lastPage", deserialize_with = "lenient::u64")]
    pub last_page: Option<u64>,
    #[serde(default, alias = "hasMore", deserialize_with = "lenient::bool")]
    pub has_more: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedCollection<T> {
    #[serde(rename = "data")]
    items: Collection<T>,
    pagination: PaginationMeta,
}

impl<T> PaginatedCollection<T> {
    pub fn new(items: Vec<T>, pagination: PaginationMeta) -> Self {
        Self {
            items: Collection::new(items),
            pagination,
        }
    }

    pub fn items(&self) -> &Collection<T> {
        &self.items
    }

    pub fn into_items(self) -> Collection<T> {
        self.items
    }

    pub fn pagination(&self) -> &PaginationMeta {
        &self.pagination
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_page(&self) -> u64 {
        self.pagination.current_page.unwrap_or(1)
    }

    pub fn per_page(&self) -> u64 {
        self.pagination.per_page.unwrap_or(self.items.len() as u64)
    }

    pub fn total(&self) -> u64 {
        self.pagination.total.unwrap_or(self.items.len() as u64)
    }

    pub fn last_page(&self) -> u64 {
        self.pagination.last_page.unwrap_or(1)
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more.unwrap_or(false) || self.current_page() < self.last_page()
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page() == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page() == self.last_page()
    }
}

/// Deserializers that accept numbers, numeric strings and null.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.max(0.0) as u64))
            }
            _ => None,
        })
    }

    pub fn f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
    }

    pub fn bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => Some(n.as_f64() == Some(1.0)),
            Value::String(s) => Some(s == "true" || s == "1"),
            Value::Null => None,
            _ => Some(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_lenient_fields() {
        let plan: Plan = serde_json::from_value(json!({
            "id": "42",
            "name": "Europe 10GB",
            "type": "regional",
            "price": "19.99",
            "data": 10240,
            "validity_days": "30",
            "reloadable": "1",
            "countries": ["FR", "DE"],
            "countries_count": 2,
            "slug": "europe-10gb"
        }))
        .unwrap();

        assert_eq!(plan.id, Some(42));
        assert!(plan.is_regional());
        assert_eq!(plan.price(), 19.99);
        assert_eq!(plan.data_gb(), 10);
        assert!(!plan.is_unlimited());
        assert_eq!(plan.validity_days(), 30);
        assert!(plan.is_reloadable());
        assert_eq!(plan.country_codes(), vec!["FR", "DE"]);
        assert_eq!(plan.extra["slug"], "europe-10gb");
    }

    #[test]
    fn test_plan_defaults() {
        let plan: Plan = serde_json::from_value(json!({})).unwrap();
        assert!(plan.is_local());
        assert_eq!(plan.price(), 0.0);
        assert!(plan.is_unlimited());
        assert!(!plan.is_reloadable());
        assert_eq!(plan.countries_count(), 0);
    }

    #[test]
    fn test_country() {
        let country: Country = serde_json::from_value(json!({
            "code": "JP",
            "name": "Japan",
            "plans_count": "12",
            "is_featured": true,
            "flag": "https://cdn.example.com/jp.svg"
        }))
        .unwrap();
        assert_eq!(country.code, "JP");
        assert_eq!(country.plans_count(), 12);
        assert!(country.is_featured());
    }

    #[test]
    fn test_order_status_helpers() {
        let order: Order =
            serde_json::from_value(json!({"id": 7, "status": "completed", "total_price": 39.5}))
                .unwrap();
        assert!(order.is_completed());
        assert!(!order.is_pending());
        assert_eq!(order.total_price(), 39.5);

        let order: Order = serde_json::from_value(json!({"id": 8})).unwrap();
        assert!(order.is_pending());
    }

    #[test]
    fn test_esim_status_helpers() {
        let esim: Esim = serde_json::from_value(json!({
            "iccid": "8944500000000000001",
            "status": "active",
            "balance_data": "2048",
            "validity_end": null
        }))
        .unwrap();
        assert!(esim.is_active());
        assert_eq!(esim.balance_data(), 2048);
        assert!(esim.validity_end.is_none());
    }

    #[test]
    fn test_collection_helpers() {
        let collection: Collection<u32> = vec![3, 1, 2].into_iter().collect();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.first(), Some(&3));
        assert_eq!(collection.last(), Some(&2));
        assert_eq!(collection.filter(|n| *n > 1).into_inner(), vec![3, 2]);
        assert_eq!(collection.map(|n| n * 10).into_inner(), vec![30, 10, 20]);
        assert!(Collection::<u32>::default().is_empty());
    }

    #[test]
    fn test_pagination_meta_aliases() {
        let snake: PaginationMeta =
            serde_json::from_value(json!({"current_page": 2, "last_page": 5, "per_page": 10, "total": 42}))
                .unwrap();
        let camel: PaginationMeta =
            serde_json::from_value(json!({"currentPage": 2, "lastPage": 5, "perPage": 10, "total": 42}))
                .unwrap();
        assert_eq!(snake, camel);
    }

    #[test]
    fn test_paginated_collection_derived_values() {
        let page = PaginatedCollection::new(
            vec![1, 2],
            PaginationMeta {
                current_page: Some(2),
                last_page: Some(3),
                ..Default::default()
            },
        );
        assert!(page.has_more());
        assert!(!page.is_first_page());
        assert!(!page.is_last_page());
        assert_eq!(page.per_page(), 2);
        assert_eq!(page.total(), 2);

        let single = PaginatedCollection::new(vec!["a"], PaginationMeta::default());
        assert_eq!(single.current_page(), 1);
        assert!(single.is_first_page());
        assert!(single.is_last_page());
        assert!(!single.has_more());
    }

    #[test]
    fn test_paginated_collection_serializes_with_data_key() {
        let page = PaginatedCollection::new(vec![1], PaginationMeta::default());
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["data"], json!([1]));
        assert!(value.get("pagination").is_some());
    }
}
