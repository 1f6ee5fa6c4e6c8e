use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AlacenaResult;
use crate::expiration::{self, DateStamp, ExpirationStatus};

/// A stored product as returned by `GET /api/products/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub quantity: f64,
    pub entry_date: String,
    pub expiration_date: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub product_id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
}

impl Product {
    /// Create a product with a quantity of one and no image
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        product_type: impl Into<String>,
        expiration_date: impl Into<String>,
    ) -> Self {
        let expiration_date = expiration_date.into();
        Self {
            name: name.into(),
            quantity: 1.0,
            entry_date: expiration_date.clone(),
            expiration_date,
            product_type: product_type.into(),
            product_id: product_id.into(),
            image: String::new(),
            registration_date: None,
        }
    }

    pub fn expiration(&self) -> AlacenaResult<DateStamp> {
        DateStamp::parse(&self.expiration_date)
    }

    /// Expiration status relative to `reference_now`
    pub fn status(&self, reference_now: DateTime<Utc>) -> AlacenaResult<ExpirationStatus> {
        self.expiration()
            .map(|date| expiration::classify_expiration(&date, reference_now))
    }

    pub fn formatted_expiration(&self) -> AlacenaResult<String> {
        expiration::format_date(&self.expiration_date)
    }

    pub fn unit_label(&self) -> &'static str {
        expiration::unit_label(&self.product_type)
    }
}

/// A storage container (fridge, freezer) shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: u64,
    pub name: String,
    pub is_active: bool,
    pub last_opened: String,
    pub temperature: f64,
    /// Category names, one per bar
    pub labels: Vec<String>,
    /// Per category: `[stable, priority, critical]`
    pub data: Vec<Vec<u64>>,
}

impl Container {
    /// Sum of all bars, by position
    pub fn totals(&self) -> [u64; 3] {
        self.data.iter().fold([0; 3], |mut acc, row| {
            for (slot, value) in acc.iter_mut().zip(row.iter()) {
                *slot += value;
            }
            acc
        })
    }
}
