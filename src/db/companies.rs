use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::warn;

use super::Database;
use crate::models::{Company, SettingKey};
use crate::storage::{BackendKind, PersistenceBackend, StorageResult};

const LAST_SAVED_KEY: &str = "last_saved_at";

impl Database {
    // ==================== COMPANY WRITE ====================

    /// Replace the stored company list.
    ///
    /// Clear and insert run in one transaction; on any error the previous
    /// list stays in place.
    pub fn replace_companies(&self, companies: &[Company]) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM companies", [])?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO companies (id, position, title, city, state, disposition, data)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )?;
            for (position, company) in companies.iter().enumerate() {
                stmt.execute(params![
                    company.id,
                    position as i64,
                    company.title,
                    company.city,
                    company.state,
                    company.disposition.map(|d| d.as_str()),
                    serde_json::to_string(company)?,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)",
            params![LAST_SAVED_KEY, Utc::now().to_rfc3339()],
        )?;

        tx.commit()?;
        Ok(())
    }

    // ==================== COMPANY READ ====================

    /// All stored companies in their saved order. Rows that fail to decode are skipped.
    pub fn load_companies(&self) -> StorageResult<Vec<Company>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, data FROM companies ORDER BY position ASC")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let companies = rows
            .into_iter()
            .filter_map(|(id, data)| match serde_json::from_str::<Company>(&data) {
                Ok(company) => Some(company),
                Err(e) => {
                    warn!(id = %id, error = %e, "skipping unreadable company row");
                    None
                }
            })
            .collect();

        Ok(companies)
    }

    pub fn last_saved_at(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?",
                [LAST_SAVED_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    // ==================== SETTINGS ====================

    pub fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceBackend for Database {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn save_all(&self, companies: &[Company]) -> StorageResult<()> {
        self.replace_companies(companies)
    }

    async fn load_all(&self) -> StorageResult<Vec<Company>> {
        self.load_companies()
    }

    async fn save_setting(&self, key: SettingKey, value: i64) -> StorageResult<()> {
        self.set_setting(key.as_str(), &value.to_string())
    }

    async fn load_setting(&self, key: SettingKey) -> StorageResult<Option<i64>> {
        Ok(self
            .get_setting(key.as_str())?
            .and_then(|v| v.trim().parse::<i64>().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(title: &str, state: Option<&str>) -> Company {
        let mut c = Company::new(title.to_string());
        c.state = state.map(str::to_string);
        c
    }

    #[test]
    fn test_replace_and_load_preserves_order() {
        let db = Database::open_memory().unwrap();
        let companies: Vec<_> = ["Zeta", "Alpha", "Mid"]
            .iter()
            .map(|t| company(t, Some("NC")))
            .collect();

        db.replace_companies(&companies).unwrap();
        assert_eq!(db.load_companies().unwrap(), companies);
        assert!(db.last_saved_at().unwrap().is_some());
    }

    #[test]
    fn test_replace_is_full_replace() {
        let db = Database::open_memory().unwrap();
        db.replace_companies(&[company("Old", None), company("Older", None)]).unwrap();

        let fresh = vec![company("New", Some("SC"))];
        db.replace_companies(&fresh).unwrap();
        assert_eq!(db.load_companies().unwrap(), fresh);
    }

    #[test]
    fn test_failed_replace_keeps_previous_set() {
        let db = Database::open_memory().unwrap();
        let original = vec![company("Acme", Some("NC"))];
        db.replace_companies(&original).unwrap();

        // Duplicate ids violate the primary key midway through the insert
        let dup = company("Dup", None);
        let result = db.replace_companies(&[company("Fine", None), dup.clone(), dup]);
        assert!(result.is_err());
        assert_eq!(db.load_companies().unwrap(), original);
    }

    #[test]
    fn test_corrupt_row_is_skipped() {
        let db = Database::open_memory().unwrap();
        let good = company("Good", None);
        db.replace_companies(&[good.clone()]).unwrap();
        db.conn()
            .unwrap()
            .execute(
                "INSERT INTO companies (id, position, data) VALUES ('bad', 1, '{oops')",
                [],
            )
            .unwrap();

        assert_eq!(db.load_companies().unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn test_settings_via_backend() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.load_setting(SettingKey::CallClicks).await.unwrap(), None);

        db.save_setting(SettingKey::CallClicks, 9).await.unwrap();
        db.save_setting(SettingKey::CallClicks, 10).await.unwrap();
        assert_eq!(db.load_setting(SettingKey::CallClicks).await.unwrap(), Some(10));
        assert_eq!(db.get_setting("googleVoiceClicks").unwrap().as_deref(), Some("10"));
    }
}
