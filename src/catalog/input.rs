use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::PurchaseLink;

const MAX_NAME_LEN: usize = 200;
const MAX_COLLECTION_KEY_LEN: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub collection: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lore: Option<String>,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub purchase_links: Vec<PurchaseLink>,
    /// Primary image reference.
    #[serde(default)]
    pub image: Option<String>,
    /// Gallery images in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update: `None` leaves the column as it is.
///
/// An empty `lore` or `image` clears it. Supplying `images` replaces the whole gallery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub collection: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub lore: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i64>,
    pub model: Option<String>,
    pub material: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub purchase_links: Option<Vec<PurchaseLink>>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
}

impl NewProduct {
    pub fn validate(&mut self) -> Result<()> {
        validate_name(&self.name)?;
        validate_collection_key(&self.collection)?;
        validate_amount("price", self.price)?;
        validate_amount("stock", self.stock)?;
        validate_links(&self.purchase_links)?;
        validate_images(&self.images)?;
        self.sizes = dedup_sizes(std::mem::take(&mut self.sizes));
        Ok(())
    }
}

impl ProductPatch {
    pub fn validate(&mut self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(collection) = &self.collection {
            validate_collection_key(collection)?;
        }
        if let Some(price) = self.price {
            validate_amount("price", price)?;
        }
        if let Some(stock) = self.stock {
            validate_amount("stock", stock)?;
        }
        if let Some(links) = &self.purchase_links {
            validate_links(links)?;
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        if let Some(sizes) = self.sizes.take() {
            self.sizes = Some(dedup_sizes(sizes));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(Error::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Collection keys appear in cache keys and URLs, so they stay slug-shaped.
pub fn validate_collection_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::validation("collection cannot be empty"));
    }
    if key.len() > MAX_COLLECTION_KEY_LEN {
        return Err(Error::validation(format!(
            "collection cannot exceed {MAX_COLLECTION_KEY_LEN} characters"
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::validation(
            "collection can only contain alphanumeric characters, hyphens, and underscores",
        ));
    }
    Ok(())
}

fn validate_amount(field: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(Error::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub(crate) fn validate_links(links: &[PurchaseLink]) -> Result<()> {
    for link in links {
        if link.platform.trim().is_empty() || link.url.trim().is_empty() {
            return Err(Error::validation(
                "purchase links need both a platform and a url",
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_images(images: &[String]) -> Result<()> {
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(Error::validation("image references cannot be empty"));
    }
    Ok(())
}

/// Sizes form a set; the first occurrence keeps its position.
pub fn dedup_sizes(sizes: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(sizes.len());
    for size in sizes {
        let size = size.trim().to_string();
        if !size.is_empty() && !seen.contains(&size) {
            seen.push(size);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> NewProduct {
        NewProduct {
            name: "Veil Tee".into(),
            collection: "dellerium".into(),
            price: 250_000,
            stock: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_sizes_deduplicated_in_order() {
        let mut p = product();
        p.sizes = vec!["M".into(), "L".into(), "M".into(), " ".into(), "S".into()];
        p.validate().unwrap();
        assert_eq!(p.sizes, vec!["M", "L", "S"]);
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut p = product();
        p.price = -1;
        assert!(matches!(p.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_collection_key_must_be_slug() {
        assert!(validate_collection_key("dellerium").is_ok());
        assert!(validate_collection_key("summer_24-drop").is_ok());
        assert!(validate_collection_key("").is_err());
        assert!(validate_collection_key("has space").is_err());
        assert!(validate_collection_key("a:b").is_err());
    }

    #[test]
    fn test_link_without_url_rejected() {
        let mut p = product();
        p.purchase_links = vec![PurchaseLink {
            platform: "Shopee".into(),
            url: "".into(),
        }];
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_patch_validates_supplied_fields_only() {
        let mut patch = ProductPatch {
            stock: Some(0),
            ..Default::default()
        };
        patch.validate().unwrap();

        let mut bad = ProductPatch {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
