pub const SCHEMA: &str = r#"
-- Catalog products; structured sub-fields are JSON text
CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    collection TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    lore TEXT,
    price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),   -- smallest currency unit
    stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    model TEXT NOT NULL DEFAULT '',
    material TEXT NOT NULL DEFAULT '',
    sizes TEXT NOT NULL DEFAULT '[]',
    purchase_links TEXT NOT NULL DEFAULT '[]',
    image TEXT,                   -- primary image reference
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Images are owned by a product and ordered by display_order
CREATE TABLE IF NOT EXISTS product_images (
    id TEXT PRIMARY KEY,
    product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    image_url TEXT NOT NULL,
    display_order INTEGER NOT NULL,

    UNIQUE(product_id, display_order)
);

-- Every issued code lives here; the UNIQUE constraint is the only collision check
CREATE TABLE IF NOT EXISTS codes (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    product_id TEXT REFERENCES products(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'used', 'expired')),
    scan_count INTEGER NOT NULL DEFAULT 0 CHECK (scan_count >= 0),
    created_at TEXT NOT NULL,
    last_scanned_at TEXT
);

-- Labels carry a denormalized copy of display content for verification
CREATE TABLE IF NOT EXISTS labels (
    code TEXT PRIMARY KEY REFERENCES codes(code) ON DELETE CASCADE,
    product_id TEXT,              -- informational, survives product deletion
    name TEXT NOT NULL,
    images TEXT NOT NULL DEFAULT '[]',
    size TEXT,
    price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
    material TEXT,
    color TEXT,
    description TEXT,
    story TEXT,
    care_instructions TEXT NOT NULL DEFAULT '[]',
    purchase_links TEXT NOT NULL DEFAULT '[]',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_collection ON products(collection);
CREATE INDEX IF NOT EXISTS idx_products_created ON products(created_at);
CREATE INDEX IF NOT EXISTS idx_product_images_product ON product_images(product_id);
CREATE INDEX IF NOT EXISTS idx_codes_product ON codes(product_id);
CREATE INDEX IF NOT EXISTS idx_codes_status ON codes(status);
"#;
