//! Cache key namespaces for catalog reads.

pub const ALL_PRODUCTS: &str = "products:all";

#[must_use]
pub fn product(id: &str) -> String {
    format!("product:{id}")
}

#[must_use]
pub fn collection(key: &str) -> String {
    format!("products:collection:{key}")
}

/// Every key a write to one product can make stale. Pass the collection the
/// product had before the write and, if it moved, the one it has after.
#[must_use]
pub fn product_write(id: &str, collections: &[&str]) -> Vec<String> {
    let mut keys = vec![ALL_PRODUCTS.to_string(), product(id)];
    for key in collections {
        let key = collection(key);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
