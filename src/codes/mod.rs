//! Short-code issuance, resolution and lifecycle.
//!
//! Every issued code owns one row in `codes`, whose UNIQUE constraint is the
//! only collision check: a candidate is generated, inserted, and regenerated
//! on a unique violation up to [`MAX_ISSUE_ATTEMPTS`] times. Labels add a row
//! in `labels` carrying their own display content.
//!
//! Resolution counts a scan and reads the result in one batch, so concurrent
//! verifications of the same code each add exactly one to `scan_count`.

mod generator;
mod input;
mod rows;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use generator::{CODE_ALPHABET, CODE_LENGTH, CodeSource, RandomCodes, normalize_code};
pub use input::{LabelPatch, NewLabel};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::store::{Statement, StoreClient, UpdateBuilder, format_datetime};
use crate::types::{Code, CodeStatus, JsonList, Label, LabelContent};
use rows::{CODE_COLUMNS, CODE_WITH_LABEL, code_from_row, has_label, label_from_row};

pub const MAX_ISSUE_ATTEMPTS: usize = 5;
pub const MAX_ISSUE_QUANTITY: usize = 1000;

/// Counts a scan only for codes that can be shown: active labels, or plain
/// codes still bound to a product.
const COUNT_SCAN: &str = "UPDATE codes SET scan_count = scan_count + 1, last_scanned_at = ?2
     WHERE code = ?1 AND (
         EXISTS (SELECT 1 FROM labels l WHERE l.code = codes.code AND l.is_active = 1)
         OR (product_id IS NOT NULL AND NOT EXISTS (SELECT 1 FROM labels l WHERE l.code = codes.code))
     )
     RETURNING scan_count";

/// A successfully verified code with the content to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedCode {
    pub code: String,
    pub status: CodeStatus,
    pub scan_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scanned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(flatten)]
    pub content: LabelContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Verification {
    Verified(VerifiedCode),
    /// The label exists but is unpublished.
    Inactive,
    NotFound,
}

#[derive(Clone)]
pub struct CodeService {
    store: StoreClient,
    catalog: Catalog,
    source: Arc<dyn CodeSource>,
}

impl CodeService {
    pub fn new(store: StoreClient, catalog: Catalog) -> Self {
        Self::with_source(store, catalog, Arc::new(RandomCodes))
    }

    pub fn with_source(store: StoreClient, catalog: Catalog, source: Arc<dyn CodeSource>) -> Self {
        Self {
            store,
            catalog,
            source,
        }
    }

    /// Issues `quantity` plain codes bound to `product_id`.
    ///
    /// Units are inserted one at a time; codes issued before a failure stay persisted.
    pub async fn issue_codes(&self, product_id: &str, quantity: usize) -> Result<Vec<Code>> {
        if quantity == 0 || quantity > MAX_ISSUE_QUANTITY {
            return Err(Error::validation(format!(
                "quantity must be between 1 and {MAX_ISSUE_QUANTITY}"
            )));
        }

        let mut issued = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            issued.push(self.issue_one(product_id).await?);
        }

        tracing::info!(product_id, count = issued.len(), "Issued codes");
        Ok(issued)
    }

    async fn issue_one(&self, product_id: &str) -> Result<Code> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let code = Code {
                id: Uuid::new_v4().to_string(),
                code: self.source.candidate(),
                product_id: Some(product_id.to_string()),
                status: CodeStatus::Active,
                scan_count: 0,
                created_at: Utc::now(),
                last_scanned_at: None,
            };

            match self.store.execute(insert_code(&code)).await {
                Ok(_) => return Ok(code),
                Err(Error::UniqueViolation) => {
                    tracing::debug!(attempt, "Code collision, regenerating");
                }
                Err(Error::ForeignKeyViolation) => return Err(Error::NotFound),
                Err(e) => return Err(e),
            }
        }

        Err(exhausted())
    }

    /// Issues one code together with its label content in a single batch.
    pub async fn issue_label(&self, label: NewLabel) -> Result<Label> {
        label.validate()?;

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let now = Utc::now();
            let code = Code {
                id: Uuid::new_v4().to_string(),
                code: self.source.candidate(),
                product_id: label.product_id.clone(),
                status: CodeStatus::Active,
                scan_count: 0,
                created_at: now,
                last_scanned_at: None,
            };
            let content = &label.content;

            let stmts = vec![
                insert_code(&code),
                Statement::new(
                    "INSERT INTO labels (code, product_id, name, images, size, price, material, color,
                         description, story, care_instructions, purchase_links, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                )
                .bind(code.code.clone())
                .bind(label.product_id.clone())
                .bind(content.name.clone())
                .bind(JsonList::new(content.images.clone()).encode())
                .bind(content.size.clone())
                .bind(content.price)
                .bind(content.material.clone())
                .bind(content.color.clone())
                .bind(content.description.clone())
                .bind(content.story.clone())
                .bind(JsonList::new(content.care_instructions.clone()).encode())
                .bind(JsonList::new(content.purchase_links.clone()).encode())
                .bind(label.is_active)
                .bind(format_datetime(&now))
                .bind(format_datetime(&now)),
            ];

            match self.store.batch(stmts).await {
                Ok(_) => {
                    tracing::info!(code = %code.code, "Issued label");
                    return Ok(Label {
                        code: code.code,
                        product_id: label.product_id,
                        content: label.content,
                        is_active: label.is_active,
                        status: CodeStatus::Active,
                        scan_count: 0,
                        created_at: now,
                        updated_at: now,
                        last_scanned_at: None,
                    });
                }
                Err(Error::UniqueViolation) => {
                    tracing::debug!(attempt, "Label code collision, regenerating");
                }
                Err(Error::ForeignKeyViolation) => return Err(Error::NotFound),
                Err(e) => return Err(e),
            }
        }

        Err(exhausted())
    }

    /// Verifies a scanned code and counts the scan.
    ///
    /// Unknown or malformed input is [`Verification::NotFound`], never an error.
    pub async fn resolve_code(&self, input: &str) -> Result<Verification> {
        let Some(code) = normalize_code(input) else {
            return Ok(Verification::NotFound);
        };

        let stmts = vec![
            Statement::new(COUNT_SCAN)
                .bind(code.clone())
                .bind(format_datetime(&Utc::now())),
            Statement::new(format!("{CODE_WITH_LABEL} WHERE c.code = ?1")).bind(code.clone()),
        ];
        let results = self.store.batch(stmts).await?;

        let Some(row) = results[1].rows.first() else {
            return Ok(Verification::NotFound);
        };

        if has_label(row) {
            let label = label_from_row(row)?;
            if !label.is_active {
                tracing::debug!(code = %code, "Scan of inactive label");
                return Ok(Verification::Inactive);
            }
            tracing::info!(code = %code, scan_count = label.scan_count, "Code verified");
            return Ok(Verification::Verified(VerifiedCode {
                code: label.code,
                status: label.status,
                scan_count: label.scan_count,
                last_scanned_at: label.last_scanned_at,
                product_id: label.product_id,
                content: label.content,
            }));
        }

        let record = code_from_row(row)?;
        let Some(product_id) = record.product_id.clone() else {
            return Ok(Verification::NotFound);
        };
        let Some(view) = self.catalog.product_by_id(&product_id).await? else {
            return Ok(Verification::NotFound);
        };

        tracing::info!(code = %code, scan_count = record.scan_count, "Code verified");
        Ok(Verification::Verified(VerifiedCode {
            content: LabelContent::from(&view),
            code: record.code,
            status: record.status,
            scan_count: record.scan_count,
            last_scanned_at: record.last_scanned_at,
            product_id: Some(product_id),
        }))
    }

    /// Reads a code without counting a scan.
    pub async fn get_code(&self, input: &str) -> Result<Code> {
        let code = normalize_code(input).ok_or(Error::NotFound)?;
        let rows = self
            .store
            .query(Statement::new(format!("SELECT {CODE_COLUMNS} FROM codes WHERE code = ?1")).bind(code))
            .await?;
        rows.first().map(code_from_row).ok_or(Error::NotFound)?
    }

    pub async fn list_product_codes(&self, product_id: &str) -> Result<Vec<Code>> {
        let rows = self
            .store
            .query(
                Statement::new(format!(
                    "SELECT {CODE_COLUMNS} FROM codes WHERE product_id = ?1
                     ORDER BY created_at DESC, rowid DESC"
                ))
                .bind(product_id.to_string()),
            )
            .await?;
        rows.iter().map(code_from_row).collect()
    }

    /// Moves an active code to `used` or `expired`.
    pub async fn set_code_status(&self, input: &str, next: CodeStatus) -> Result<Code> {
        let code = normalize_code(input).ok_or(Error::NotFound)?;
        if !CodeStatus::Active.can_transition_to(next) {
            return Err(Error::validation(format!(
                "cannot set status to {next}; use reset to reactivate a code"
            )));
        }

        let stmts = vec![
            Statement::new("SELECT status FROM codes WHERE code = ?1").bind(code.clone()),
            Statement::new(format!(
                "UPDATE codes SET status = ?2 WHERE code = ?1 AND status = 'active' RETURNING {CODE_COLUMNS}"
            ))
            .bind(code)
            .bind(next.as_str().to_string()),
        ];
        let results = self.store.batch(stmts).await?;

        let current = results[0].rows.first().ok_or(Error::NotFound)?.text("status")?;
        match results[1].rows.first() {
            Some(row) => code_from_row(row),
            None => Err(Error::validation(format!(
                "cannot move code from {current} to {next}"
            ))),
        }
    }

    /// Returns a code to `active` from any status. The scan count is kept.
    pub async fn reset_code(&self, input: &str) -> Result<Code> {
        let code = normalize_code(input).ok_or(Error::NotFound)?;
        let rows = self
            .store
            .query(
                Statement::new(format!(
                    "UPDATE codes SET status = 'active' WHERE code = ?1 RETURNING {CODE_COLUMNS}"
                ))
                .bind(code.clone()),
            )
            .await?;
        let reset = rows.first().map(code_from_row).ok_or(Error::NotFound)??;
        tracing::info!(code = %code, "Code reset to active");
        Ok(reset)
    }

    /// Expires every active code created before `cutoff`. Returns how many changed.
    pub async fn expire_codes_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let expired = self
            .store
            .execute(
                Statement::new(
                    "UPDATE codes SET status = 'expired' WHERE status = 'active' AND created_at < ?1",
                )
                .bind(format_datetime(&cutoff)),
            )
            .await?;
        tracing::info!(expired, cutoff = %cutoff, "Expired stale codes");
        Ok(expired)
    }

    /// Deletes a code and its label. Returns `false` when nothing matched.
    pub async fn delete_code(&self, input: &str) -> Result<bool> {
        let Some(code) = normalize_code(input) else {
            return Ok(false);
        };
        let deleted = self
            .store
            .execute(Statement::new("DELETE FROM codes WHERE code = ?1").bind(code))
            .await?;
        Ok(deleted > 0)
    }

    pub async fn get_label(&self, input: &str) -> Result<Label> {
        let code = normalize_code(input).ok_or(Error::NotFound)?;
        let rows = self
            .store
            .query(
                Statement::new(format!(
                    "{CODE_WITH_LABEL} WHERE c.code = ?1 AND l.code IS NOT NULL"
                ))
                .bind(code),
            )
            .await?;
        rows.first().map(label_from_row).ok_or(Error::NotFound)?
    }

    /// All labels, newest first. Unreadable rows are logged and skipped.
    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        let rows = self
            .store
            .query(Statement::new(format!(
                "{CODE_WITH_LABEL} WHERE l.code IS NOT NULL ORDER BY c.created_at DESC, c.rowid DESC"
            )))
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| match label_from_row(row) {
                Ok(label) => Some(label),
                Err(e) => {
                    tracing::warn!("Skipping unreadable label row: {e}");
                    None
                }
            })
            .collect())
    }

    pub async fn update_label(&self, input: &str, patch: LabelPatch) -> Result<Label> {
        let code = normalize_code(input).ok_or(Error::NotFound)?;
        patch.validate()?;

        let stmt = UpdateBuilder::new("labels")
            .set_opt("name", patch.name)
            .set_opt("images", patch.images.map(|v| JsonList::new(v).encode()))
            .set_opt("size", clearable(patch.size))
            .set_opt("price", patch.price)
            .set_opt("material", clearable(patch.material))
            .set_opt("color", clearable(patch.color))
            .set_opt("description", clearable(patch.description))
            .set_opt("story", clearable(patch.story))
            .set_opt(
                "care_instructions",
                patch.care_instructions.map(|v| JsonList::new(v).encode()),
            )
            .set_opt(
                "purchase_links",
                patch.purchase_links.map(|v| JsonList::new(v).encode()),
            )
            .set_opt("is_active", patch.is_active)
            .set("updated_at", format_datetime(&Utc::now()))
            .build("code", code.clone(), Some("code"));

        if self.store.query(stmt).await?.is_empty() {
            return Err(Error::NotFound);
        }
        self.get_label(&code).await
    }
}

fn insert_code(code: &Code) -> Statement {
    Statement::new(
        "INSERT INTO codes (id, code, product_id, status, scan_count, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
    )
    .bind(code.id.clone())
    .bind(code.code.clone())
    .bind(code.product_id.clone())
    .bind(code.status.as_str().to_string())
    .bind(format_datetime(&code.created_at))
}

fn exhausted() -> Error {
    Error::Conflict(format!(
        "could not generate a unique code after {MAX_ISSUE_ATTEMPTS} attempts"
    ))
}

/// Supplied-but-empty clears the column.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|s| Some(s).filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::task::JoinSet;

    use super::*;
    use crate::cache::{Cache, MemoryBackend};
    use crate::config::CacheTtl;
    use crate::store::{SqliteStore, Store};

    /// Replays queued candidates, then falls back to random ones.
    struct ScriptedCodes(Mutex<VecDeque<String>>);

    impl ScriptedCodes {
        fn new(codes: &[&str]) -> Self {
            Self(Mutex::new(codes.iter().map(|c| c.to_string()).collect()))
        }
    }

    impl CodeSource for ScriptedCodes {
        fn candidate(&self) -> String {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| RandomCodes.candidate())
        }
    }

    fn services(source: Arc<dyn CodeSource>) -> (StoreClient, CodeService) {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        store
            .execute(&Statement::new(
                "INSERT INTO products (id, name, collection, price, stock, created_at, updated_at)
                 VALUES ('prod_1', 'Veil Tee', 'dellerium', 250000, 3,
                         '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
            ))
            .unwrap();

        let client = StoreClient::new(Arc::new(store), Duration::from_secs(5));
        let cache = Arc::new(Cache::new(
            Arc::new(MemoryBackend::default()),
            Duration::from_millis(250),
        ));
        let catalog = Catalog::new(client.clone(), cache, CacheTtl::default());
        let codes = CodeService::with_source(client.clone(), catalog, source);
        (client, codes)
    }

    fn service() -> CodeService {
        services(Arc::new(RandomCodes)).1
    }

    fn verified(v: Verification) -> VerifiedCode {
        match v {
            Verification::Verified(code) => code,
            other => panic!("expected verified code, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_counts_each_scan() {
        let codes = service();
        let issued = codes.issue_codes("prod_1", 1).await.unwrap();
        assert_eq!(issued[0].status, CodeStatus::Active);
        assert_eq!(issued[0].scan_count, 0);

        let first = verified(codes.resolve_code(&issued[0].code).await.unwrap());
        assert_eq!(first.content.name, "Veil Tee");
        assert_eq!(first.product_id.as_deref(), Some("prod_1"));
        assert_eq!(first.scan_count, 1);
        assert!(first.last_scanned_at.is_some());

        let second = verified(codes.resolve_code(&issued[0].code.to_lowercase()).await.unwrap());
        assert_eq!(second.scan_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let codes = service();
        assert_eq!(codes.resolve_code("DOESNOTEXIST").await.unwrap(), Verification::NotFound);
        assert_eq!(codes.resolve_code("AB23CD45").await.unwrap(), Verification::NotFound);
        assert!(matches!(codes.get_code("AB23CD45").await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_verification_is_tagged_with_result() {
        let codes = service();
        let issued = codes.issue_codes("prod_1", 1).await.unwrap();

        let body = serde_json::to_value(codes.resolve_code(&issued[0].code).await.unwrap()).unwrap();
        assert_eq!(body["result"], "verified");
        assert_eq!(body["code"], issued[0].code.as_str());
        assert_eq!(body["name"], "Veil Tee");
        assert_eq!(body["scan_count"], 1);

        let missing = serde_json::to_value(Verification::NotFound).unwrap();
        assert_eq!(missing, serde_json::json!({"result": "not_found"}));
    }

    #[tokio::test]
    async fn test_get_code_does_not_count() {
        let codes = service();
        let issued = codes.issue_codes("prod_1", 1).await.unwrap();
        codes.get_code(&issued[0].code).await.unwrap();
        assert_eq!(codes.get_code(&issued[0].code).await.unwrap().scan_count, 0);
    }

    #[tokio::test]
    async fn test_issue_validates_quantity_and_product() {
        let codes = service();
        assert!(matches!(codes.issue_codes("prod_1", 0).await, Err(Error::Validation(_))));
        assert!(matches!(
            codes.issue_codes("prod_1", MAX_ISSUE_QUANTITY + 1).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(codes.issue_codes("ghost", 1).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_collision_is_retried() {
        let (_, codes) = services(Arc::new(ScriptedCodes::new(&[
            "AAAAAAAA", "AAAAAAAA", "AAAAAAAA", "BBBBBBBB",
        ])));

        let first = codes.issue_codes("prod_1", 1).await.unwrap();
        assert_eq!(first[0].code, "AAAAAAAA");

        let second = codes.issue_codes("prod_1", 1).await.unwrap();
        assert_eq!(second[0].code, "BBBBBBBB");
    }

    #[tokio::test]
    async fn test_collisions_exhaust_into_conflict() {
        let (_, codes) = services(Arc::new(ScriptedCodes::new(&["AAAAAAAA"; MAX_ISSUE_ATTEMPTS + 1])));
        codes.issue_codes("prod_1", 1).await.unwrap();

        assert!(matches!(codes.issue_codes("prod_1", 1).await, Err(Error::Conflict(_))));

        let label = NewLabel::new(LabelContent {
            name: "Veil Tee".into(),
            ..Default::default()
        });
        let (_, codes) = services(Arc::new(ScriptedCodes::new(&["AAAAAAAA"; MAX_ISSUE_ATTEMPTS + 1])));
        codes.issue_label(label.clone()).await.unwrap();
        assert!(matches!(codes.issue_label(label).await, Err(Error::Conflict(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issuance_yields_distinct_codes() {
        let codes = service();
        let mut tasks = JoinSet::new();
        for _ in 0..10 {
            let codes = codes.clone();
            tasks.spawn(async move { codes.issue_codes("prod_1", 100).await });
        }

        let mut seen = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            for code in joined.unwrap().unwrap() {
                assert!(seen.insert(code.code));
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(codes.list_product_codes("prod_1").await.unwrap().len(), 1000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolves_count_exactly() {
        let codes = service();
        let code = codes.issue_codes("prod_1", 1).await.unwrap().remove(0).code;

        let mut tasks = JoinSet::new();
        for _ in 0..50 {
            let codes = codes.clone();
            let code = code.clone();
            tasks.spawn(async move { codes.resolve_code(&code).await });
        }
        while let Some(joined) = tasks.join_next().await {
            verified(joined.unwrap().unwrap());
        }

        assert_eq!(codes.get_code(&code).await.unwrap().scan_count, 50);
    }

    #[tokio::test]
    async fn test_inactive_label_is_not_counted() {
        let codes = service();
        let mut new_label = NewLabel::new(LabelContent {
            name: "Requiem Hoodie".into(),
            price: 450_000,
            care_instructions: vec!["Cold wash".into()],
            ..Default::default()
        });
        new_label.is_active = false;
        let label = codes.issue_label(new_label).await.unwrap();

        assert_eq!(codes.resolve_code(&label.code).await.unwrap(), Verification::Inactive);
        assert_eq!(codes.get_label(&label.code).await.unwrap().scan_count, 0);

        let published = codes
            .update_label(
                &label.code,
                LabelPatch {
                    is_active: Some(true),
                    color: Some("black".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(published.is_active);
        assert_eq!(published.content.color.as_deref(), Some("black"));

        let hit = verified(codes.resolve_code(&label.code).await.unwrap());
        assert_eq!(hit.content.name, "Requiem Hoodie");
        assert_eq!(hit.content.care_instructions, vec!["Cold wash"]);
        assert_eq!(hit.scan_count, 1);
    }

    #[tokio::test]
    async fn test_label_survives_product_deletion() {
        let (client, codes) = services(Arc::new(RandomCodes));
        let mut new_label = NewLabel::new(LabelContent {
            name: "Veil Tee".into(),
            ..Default::default()
        });
        new_label.product_id = Some("prod_1".into());
        let label = codes.issue_label(new_label).await.unwrap();
        let plain = codes.issue_codes("prod_1", 1).await.unwrap().remove(0);

        client
            .execute(Statement::new("DELETE FROM products WHERE id = 'prod_1'"))
            .await
            .unwrap();

        let hit = verified(codes.resolve_code(&label.code).await.unwrap());
        assert_eq!(hit.content.name, "Veil Tee");

        assert_eq!(codes.resolve_code(&plain.code).await.unwrap(), Verification::NotFound);
        assert_eq!(codes.get_code(&plain.code).await.unwrap().scan_count, 0);
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let codes = service();
        let code = codes.issue_codes("prod_1", 1).await.unwrap().remove(0).code;

        let used = codes.set_code_status(&code, CodeStatus::Used).await.unwrap();
        assert_eq!(used.status, CodeStatus::Used);

        assert!(matches!(
            codes.set_code_status(&code, CodeStatus::Expired).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            codes.set_code_status(&code, CodeStatus::Active).await,
            Err(Error::Validation(_))
        ));

        // Resolution reports status without changing it.
        let hit = verified(codes.resolve_code(&code).await.unwrap());
        assert_eq!(hit.status, CodeStatus::Used);

        let reset = codes.reset_code(&code).await.unwrap();
        assert_eq!(reset.status, CodeStatus::Active);
        assert_eq!(reset.scan_count, 1);

        assert!(matches!(
            codes.set_code_status("ZZZZZZZZ", CodeStatus::Used).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_expire_codes_created_before() {
        let codes = service();
        let old = codes.issue_codes("prod_1", 2).await.unwrap();
        let cutoff = Utc::now() + chrono::Duration::milliseconds(1);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let fresh = codes.issue_codes("prod_1", 1).await.unwrap();

        codes.set_code_status(&old[1].code, CodeStatus::Used).await.unwrap();

        assert_eq!(codes.expire_codes_created_before(cutoff).await.unwrap(), 1);
        assert_eq!(codes.get_code(&old[0].code).await.unwrap().status, CodeStatus::Expired);
        assert_eq!(codes.get_code(&old[1].code).await.unwrap().status, CodeStatus::Used);
        assert_eq!(codes.get_code(&fresh[0].code).await.unwrap().status, CodeStatus::Active);
    }

    #[tokio::test]
    async fn test_delete_code_cascades_label() {
        let codes = service();
        let label = codes
            .issue_label(NewLabel::new(LabelContent {
                name: "Veil Tee".into(),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(codes.list_labels().await.unwrap().len(), 1);

        assert!(codes.delete_code(&label.code).await.unwrap());
        assert!(!codes.delete_code(&label.code).await.unwrap());
        assert!(codes.list_labels().await.unwrap().is_empty());
        assert!(matches!(codes.get_label(&label.code).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_update_missing_label_is_not_found() {
        let codes = service();
        let patch = LabelPatch {
            name: Some("New".into()),
            ..Default::default()
        };
        assert!(matches!(codes.update_label("AB23CD45", patch).await, Err(Error::NotFound)));
    }
}
