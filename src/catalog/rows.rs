//! Row schemas for catalog queries and their mapping onto domain types.

use std::collections::HashMap;

use crate::error::Result;
use crate::store::Row;
use crate::types::{JsonList, Product, ProductImage, ProductView};

pub const PRODUCT_COLUMNS: &str = "id, name, collection, category, description, lore, price, \
     stock, model, material, sizes, purchase_links, image, created_at, updated_at";

pub const IMAGE_COLUMNS: &str = "id, product_id, image_url, display_order";

pub fn product_from_row(row: &Row) -> Result<Product> {
    let id = row.text("id")?;

    let sizes = JsonList::<String>::decode_or_default(row.opt_text("sizes").as_deref(), "sizes", &id);
    let purchase_links = JsonList::decode_or_default(
        row.opt_text("purchase_links").as_deref(),
        "purchase_links",
        &id,
    );

    Ok(Product {
        name: row.text("name")?,
        collection: row.text("collection")?,
        category: row.opt_text("category").unwrap_or_default(),
        description: row.opt_text("description").unwrap_or_default(),
        lore: row.opt_text("lore").filter(|s| !s.is_empty()),
        price: row.int_or_zero("price").max(0),
        stock: row.int_or_zero("stock").max(0),
        model: row.opt_text("model").unwrap_or_default(),
        material: row.opt_text("material").unwrap_or_default(),
        sizes: sizes.into_inner(),
        purchase_links: purchase_links.into_inner(),
        image: row.opt_text("image").filter(|s| !s.is_empty()),
        created_at: row.timestamp("created_at")?,
        updated_at: row
            .opt_timestamp("updated_at")
            .map_or_else(|| row.timestamp("created_at"), Ok)?,
        id,
    })
}

pub fn image_from_row(row: &Row) -> Result<ProductImage> {
    Ok(ProductImage {
        id: row.text("id")?,
        product_id: row.text("product_id")?,
        image_url: row.text("image_url")?,
        display_order: row.int_or_zero("display_order"),
    })
}

/// Joins product rows with image rows in memory.
///
/// Product order is preserved. Images are grouped by `product_id` and sorted
/// by `display_order`. A row that cannot be mapped is logged and skipped so one
/// corrupt record never fails the whole list.
pub fn assemble(product_rows: &[Row], image_rows: &[Row]) -> Vec<ProductView> {
    let mut images: HashMap<String, Vec<ProductImage>> = HashMap::new();
    for row in image_rows {
        match image_from_row(row) {
            Ok(image) => images.entry(image.product_id.clone()).or_default().push(image),
            Err(e) => tracing::warn!("Skipping unreadable product image row: {e}"),
        }
    }

    product_rows
        .iter()
        .filter_map(|row| match product_from_row(row) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!("Skipping unreadable product row: {e}");
                None
            }
        })
        .map(|product| {
            let mut gallery = images.remove(&product.id).unwrap_or_default();
            gallery.sort_by_key(|image| image.display_order);
            ProductView {
                images: gallery.into_iter().map(|image| image.image_url).collect(),
                product,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{SqliteStore, Statement, Store};

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        store
            .execute(&Statement::new(
                "INSERT INTO products (id, name, collection, stock, sizes, purchase_links, created_at, updated_at)
                 VALUES ('p1', 'Veil Tee', 'dellerium', 4, '[\"M\",\"L\"]', 'oops{', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
            ))
            .unwrap();
        for (id, order) in [("i2", 2), ("i0", 0), ("i1", 1)] {
            store
                .execute(
                    &Statement::new(
                        "INSERT INTO product_images (id, product_id, image_url, display_order)
                         VALUES (?1, 'p1', ?2, ?3)",
                    )
                    .bind(id.to_string())
                    .bind(format!("{id}.png"))
                    .bind(order as i64),
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_assemble_orders_images_and_defaults_fields() {
        let store = seeded_store();
        let products = store
            .query(&Statement::new(format!("SELECT {PRODUCT_COLUMNS} FROM products")))
            .unwrap();
        let images = store
            .query(&Statement::new(format!("SELECT {IMAGE_COLUMNS} FROM product_images")))
            .unwrap();

        let views = assemble(&products, &images);
        assert_eq!(views.len(), 1);

        let view = &views[0];
        assert_eq!(view.images, vec!["i0.png", "i1.png", "i2.png"]);
        assert_eq!(view.product.price, 0);
        assert_eq!(view.product.stock, 4);
        assert_eq!(view.product.sizes, vec!["M", "L"]);
        assert!(view.product.purchase_links.is_empty());
        assert!(view.product.lore.is_none());
    }

    #[test]
    fn test_unreadable_row_is_skipped() {
        let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        let broken = Row::new(columns, vec![crate::store::Value::Text("p9".into()), crate::store::Value::Null]);

        let store = seeded_store();
        let mut products = store
            .query(&Statement::new(format!("SELECT {PRODUCT_COLUMNS} FROM products")))
            .unwrap();
        products.push(broken);

        let views = assemble(&products, &[]);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].product.id, "p1");
        assert!(views[0].images.is_empty());
    }
}
