use serde::Deserialize;

use crate::catalog::{validate_images, validate_links};
use crate::error::{Error, Result};
use crate::types::{LabelContent, PurchaseLink};

const MAX_LABEL_NAME_LEN: usize = 200;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLabel {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(flatten)]
    pub content: LabelContent,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewLabel {
    pub fn new(content: LabelContent) -> Self {
        Self {
            product_id: None,
            content,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_content(&self.content)
    }
}

/// Partial label update. An empty string clears an optional text field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub images: Option<Vec<String>>,
    pub size: Option<String>,
    pub price: Option<i64>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub care_instructions: Option<Vec<String>>,
    pub purchase_links: Option<Vec<PurchaseLink>>,
    pub is_active: Option<bool>,
}

impl LabelPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_label_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        if let Some(links) = &self.purchase_links {
            validate_links(links)?;
        }
        Ok(())
    }
}

fn validate_content(content: &LabelContent) -> Result<()> {
    validate_label_name(&content.name)?;
    validate_price(content.price)?;
    validate_images(&content.images)?;
    validate_links(&content.purchase_links)
}

fn validate_label_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("label name cannot be empty"));
    }
    if name.len() > MAX_LABEL_NAME_LEN {
        return Err(Error::validation(format!(
            "label name cannot exceed {MAX_LABEL_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_price(price: i64) -> Result<()> {
    if price < 0 {
        return Err(Error::validation("price cannot be negative"));
    }
    Ok(())
}
