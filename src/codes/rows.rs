use crate::error::{Error, Result};
use crate::store::Row;
use crate::types::{Code, CodeStatus, JsonList, Label, LabelContent};

pub const CODE_COLUMNS: &str = "id, code, product_id, status, scan_count, created_at, last_scanned_at";

/// Every code with its label columns when it has one. `label_code` is NULL for plain codes.
pub const CODE_WITH_LABEL: &str = "SELECT c.id, c.code, c.product_id, c.status, c.scan_count, \
     c.created_at, c.last_scanned_at, l.code AS label_code, l.product_id AS label_product_id, \
     l.name, l.images, l.size, l.price, l.material, l.color, l.description, l.story, \
     l.care_instructions, l.purchase_links, l.is_active, l.updated_at \
     FROM codes c LEFT JOIN labels l ON l.code = c.code";

pub fn code_from_row(row: &Row) -> Result<Code> {
    Ok(Code {
        id: row.text("id")?,
        code: row.text("code")?,
        product_id: row.opt_text("product_id"),
        status: status_from_row(row)?,
        scan_count: row.int_or_zero("scan_count").max(0),
        created_at: row.timestamp("created_at")?,
        last_scanned_at: row.opt_timestamp("last_scanned_at"),
    })
}

pub fn has_label(row: &Row) -> bool {
    row.opt_text("label_code").is_some()
}

/// Maps a [`CODE_WITH_LABEL`] row that carries label columns.
pub fn label_from_row(row: &Row) -> Result<Label> {
    let code = row.text("code")?;
    let content = content_from_row(row, &code)?;
    let created_at = row.timestamp("created_at")?;

    Ok(Label {
        product_id: row.opt_text("label_product_id"),
        content,
        is_active: row.flag("is_active"),
        status: status_from_row(row)?,
        scan_count: row.int_or_zero("scan_count").max(0),
        updated_at: row.opt_timestamp("updated_at").unwrap_or(created_at),
        last_scanned_at: row.opt_timestamp("last_scanned_at"),
        created_at,
        code,
    })
}

fn content_from_row(row: &Row, code: &str) -> Result<LabelContent> {
    Ok(LabelContent {
        name: row.text("name")?,
        images: JsonList::decode_or_default(row.opt_text("images").as_deref(), "images", code)
            .into_inner(),
        size: row.opt_text("size"),
        price: row.int_or_zero("price").max(0),
        material: row.opt_text("material"),
        color: row.opt_text("color"),
        description: row.opt_text("description"),
        story: row.opt_text("story"),
        care_instructions: JsonList::decode_or_default(
            row.opt_text("care_instructions").as_deref(),
            "care_instructions",
            code,
        )
        .into_inner(),
        purchase_links: JsonList::decode_or_default(
            row.opt_text("purchase_links").as_deref(),
            "purchase_links",
            code,
        )
        .into_inner(),
    })
}

fn status_from_row(row: &Row) -> Result<CodeStatus> {
    row.text("status")?.parse().map_err(Error::RowShape)
}
