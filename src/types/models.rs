use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub collection: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lore: Option<String>,
    /// Smallest currency unit.
    pub price: i64,
    pub stock: i64,
    pub model: String,
    pub material: String,
    pub sizes: Vec<String>,
    pub purchase_links: Vec<PurchaseLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: String,
    pub product_id: String,
    pub image_url: String,
    pub display_order: i64,
}

/// A product joined with its images, in display order. This is the cached shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Active,
    Used,
    Expired,
}

impl CodeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CodeStatus::Active => "active",
            CodeStatus::Used => "used",
            CodeStatus::Expired => "expired",
        }
    }

    /// Lifecycle moves one way only; a reset back to active is a separate admin operation.
    #[must_use]
    pub fn can_transition_to(self, next: CodeStatus) -> bool {
        matches!(
            (self, next),
            (CodeStatus::Active, CodeStatus::Used) | (CodeStatus::Active, CodeStatus::Expired)
        )
    }
}

impl fmt::Display for CodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CodeStatus::Active),
            "used" => Ok(CodeStatus::Used),
            "expired" => Ok(CodeStatus::Expired),
            other => Err(format!("unknown code status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub status: CodeStatus,
    pub scan_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scanned_at: Option<DateTime<Utc>>,
}

/// Display content shown when a code is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelContent {
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(default)]
    pub care_instructions: Vec<String>,
    #[serde(default)]
    pub purchase_links: Vec<PurchaseLink>,
}

impl From<&ProductView> for LabelContent {
    fn from(view: &ProductView) -> Self {
        let product = &view.product;
        let mut images = view.images.clone();
        if images.is_empty() {
            images.extend(product.image.clone());
        }

        Self {
            name: product.name.clone(),
            images,
            size: None,
            price: product.price,
            material: Some(product.material.clone()).filter(|m| !m.is_empty()),
            color: None,
            description: Some(product.description.clone()).filter(|d| !d.is_empty()),
            story: product.lore.clone(),
            care_instructions: Vec::new(),
            purchase_links: product.purchase_links.clone(),
        }
    }
}

/// A code carrying its own denormalized content, independent of the product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(flatten)]
    pub content: LabelContent,
    pub is_active: bool,
    pub status: CodeStatus,
    pub scan_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scanned_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(CodeStatus::Active.can_transition_to(CodeStatus::Used));
        assert!(CodeStatus::Active.can_transition_to(CodeStatus::Expired));
        assert!(!CodeStatus::Used.can_transition_to(CodeStatus::Active));
        assert!(!CodeStatus::Expired.can_transition_to(CodeStatus::Used));
        assert!(!CodeStatus::Active.can_transition_to(CodeStatus::Active));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [CodeStatus::Active, CodeStatus::Used, CodeStatus::Expired] {
            assert_eq!(status.as_str().parse::<CodeStatus>().unwrap(), status);
        }
        assert!("revoked".parse::<CodeStatus>().is_err());
    }

    #[test]
    fn test_view_serializes_flat() {
        let now = Utc::now();
        let view = ProductView {
            product: Product {
                id: "prod_1".into(),
                name: "Veil Tee".into(),
                collection: "dellerium".into(),
                category: "tee".into(),
                description: String::new(),
                lore: None,
                price: 250_000,
                stock: 3,
                model: "oversized".into(),
                material: "cotton".into(),
                sizes: vec!["M".into()],
                purchase_links: Vec::new(),
                image: None,
                created_at: now,
                updated_at: now,
            },
            images: vec!["a.png".into()],
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "prod_1");
        assert_eq!(json["images"][0], "a.png");
        assert!(json.get("lore").is_none());

        let back: ProductView = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }
}
