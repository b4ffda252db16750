//! Catalog assembly: denormalized product views behind the read-through cache.
//!
//! Each read path owns one cache namespace (see [`crate::cache::keys`]) and, on
//! a miss, loads product rows and their images in a single batch. Every
//! mutation invalidates the `all` key, the product's own key and each
//! collection key the product belonged to before or after the write.

mod input;
mod rows;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

pub use input::{NewProduct, ProductPatch, dedup_sizes, validate_collection_key};
pub(crate) use input::{validate_images, validate_links};

use crate::cache::{Cache, keys};
use crate::config::CacheTtl;
use crate::error::{Error, Result};
use crate::store::{Statement, StoreClient, UpdateBuilder, format_datetime};
use crate::types::{JsonList, Product, ProductView};
use rows::{IMAGE_COLUMNS, PRODUCT_COLUMNS, assemble};

#[derive(Clone)]
pub struct Catalog {
    store: StoreClient,
    cache: Arc<Cache>,
    ttl: CacheTtl,
}

impl Catalog {
    pub fn new(store: StoreClient, cache: Arc<Cache>, ttl: CacheTtl) -> Self {
        Self { store, cache, ttl }
    }

    /// `Ok(None)` when no product has this id.
    pub async fn product_by_id(&self, id: &str) -> Result<Option<ProductView>> {
        let key = keys::product(id);
        self.cache
            .get_cached(&key, self.ttl.product(), || async {
                let stmts = vec![
                    Statement::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
                        .bind(id.to_string()),
                    Statement::new(format!(
                        "SELECT {IMAGE_COLUMNS} FROM product_images
                         WHERE product_id = ?1 ORDER BY display_order"
                    ))
                    .bind(id.to_string()),
                ];
                let results = self.store.batch(stmts).await?;
                Ok::<_, Error>(assemble(&results[0].rows, &results[1].rows).into_iter().next())
            })
            .await
    }

    /// Products in `collection`, newest first.
    pub async fn products_by_collection(&self, collection: &str) -> Result<Vec<ProductView>> {
        let key = keys::collection(collection);
        self.cache
            .get_cached(&key, self.ttl.collection(), || async {
                let stmts = vec![
                    Statement::new(format!(
                        "SELECT {PRODUCT_COLUMNS} FROM products
                         WHERE collection = ?1 ORDER BY created_at DESC, rowid DESC"
                    ))
                    .bind(collection.to_string()),
                    Statement::new(
                        "SELECT i.id, i.product_id, i.image_url, i.display_order
                         FROM product_images i JOIN products p ON p.id = i.product_id
                         WHERE p.collection = ?1 ORDER BY i.product_id, i.display_order",
                    )
                    .bind(collection.to_string()),
                ];
                let results = self.store.batch(stmts).await?;
                Ok::<_, Error>(assemble(&results[0].rows, &results[1].rows))
            })
            .await
    }

    /// Every product, newest first.
    pub async fn all_products(&self) -> Result<Vec<ProductView>> {
        self.cache
            .get_cached(keys::ALL_PRODUCTS, self.ttl.all(), || async {
                let stmts = vec![
                    Statement::new(format!(
                        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC"
                    )),
                    Statement::new(format!(
                        "SELECT {IMAGE_COLUMNS} FROM product_images ORDER BY product_id, display_order"
                    )),
                ];
                let results = self.store.batch(stmts).await?;
                Ok::<_, Error>(assemble(&results[0].rows, &results[1].rows))
            })
            .await
    }

    pub async fn create_product(&self, mut input: NewProduct) -> Result<ProductView> {
        input.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            collection: input.collection,
            category: input.category,
            description: input.description,
            lore: input.lore.filter(|s| !s.is_empty()),
            price: input.price,
            stock: input.stock,
            model: input.model,
            material: input.material,
            sizes: input.sizes,
            purchase_links: input.purchase_links,
            image: input.image.filter(|s| !s.is_empty()),
            created_at: now,
            updated_at: now,
        };

        let mut stmts = vec![
            Statement::new(format!(
                "INSERT INTO products ({PRODUCT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ))
            .bind(product.id.clone())
            .bind(product.name.clone())
            .bind(product.collection.clone())
            .bind(product.category.clone())
            .bind(product.description.clone())
            .bind(product.lore.clone())
            .bind(product.price)
            .bind(product.stock)
            .bind(product.model.clone())
            .bind(product.material.clone())
            .bind(JsonList::new(product.sizes.clone()).encode())
            .bind(JsonList::new(product.purchase_links.clone()).encode())
            .bind(product.image.clone())
            .bind(format_datetime(&product.created_at))
            .bind(format_datetime(&product.updated_at)),
        ];
        stmts.extend(insert_images(&product.id, &input.images));

        self.store.batch(stmts).await?;
        tracing::info!(product_id = %product.id, collection = %product.collection, "Created product");

        self.invalidate_product(&product.id, &[product.collection.as_str()])
            .await;

        Ok(ProductView {
            product,
            images: input.images,
        })
    }

    pub async fn update_product(&self, id: &str, mut patch: ProductPatch) -> Result<ProductView> {
        patch.validate()?;

        let update = UpdateBuilder::new("products")
            .set_opt("name", patch.name)
            .set_opt("collection", patch.collection)
            .set_opt("category", patch.category)
            .set_opt("description", patch.description)
            .set_opt("lore", patch.lore.map(|s| Some(s).filter(|s| !s.is_empty())))
            .set_opt("price", patch.price)
            .set_opt("stock", patch.stock)
            .set_opt("model", patch.model)
            .set_opt("material", patch.material)
            .set_opt("sizes", patch.sizes.map(|s| JsonList::new(s).encode()))
            .set_opt(
                "purchase_links",
                patch.purchase_links.map(|l| JsonList::new(l).encode()),
            )
            .set_opt("image", patch.image.map(|s| Some(s).filter(|s| !s.is_empty())))
            .set("updated_at", format_datetime(&Utc::now()));

        let mut stmts = vec![
            Statement::new("SELECT collection FROM products WHERE id = ?1").bind(id.to_string()),
            update.build("id", id.to_string(), Some("collection")),
        ];
        if let Some(images) = &patch.images {
            stmts.push(
                Statement::new("DELETE FROM product_images WHERE product_id = ?1").bind(id.to_string()),
            );
            stmts.extend(insert_images(id, images));
        }

        let results = match self.store.batch(stmts).await {
            Ok(results) => results,
            Err(Error::ForeignKeyViolation) => return Err(Error::NotFound),
            Err(e) => return Err(e),
        };

        let before = results[0].rows.first().ok_or(Error::NotFound)?.text("collection")?;
        let after = results[1].rows.first().ok_or(Error::NotFound)?.text("collection")?;
        if before != after {
            tracing::info!(product_id = id, from = %before, to = %after, "Product moved between collections");
        }

        self.invalidate_product(id, &[before.as_str(), after.as_str()])
            .await;

        self.product_by_id(id).await?.ok_or(Error::NotFound)
    }

    pub async fn set_stock(&self, id: &str, stock: i64) -> Result<ProductView> {
        self.update_product(
            id,
            ProductPatch {
                stock: Some(stock),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns `false` when no product had this id. Images cascade; codes and
    /// labels keep their rows.
    pub async fn delete_product(&self, id: &str) -> Result<bool> {
        let stmts = vec![
            Statement::new("SELECT collection FROM products WHERE id = ?1").bind(id.to_string()),
            Statement::new("DELETE FROM products WHERE id = ?1").bind(id.to_string()),
        ];
        let results = self.store.batch(stmts).await?;

        let Some(row) = results[0].rows.first() else {
            return Ok(false);
        };
        let collection = row.text("collection")?;

        self.invalidate_product(id, &[collection.as_str()]).await;
        tracing::info!(product_id = id, "Deleted product");
        Ok(true)
    }

    async fn invalidate_product(&self, id: &str, collections: &[&str]) {
        let _ = self.cache.invalidate(&keys::product_write(id, collections)).await;
    }
}

fn insert_images(product_id: &str, images: &[String]) -> Vec<Statement> {
    images
        .iter()
        .enumerate()
        .map(|(order, url)| {
            Statement::new(
                "INSERT INTO product_images (id, product_id, image_url, display_order)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(product_id.to_string())
            .bind(url.clone())
            .bind(order as i64)
        })
        .collect()
}
