use crate::error::DbError;
use crate::models::PartnerRow;
use bpa_core::Partner;
use sqlx::SqlitePool;
use uuid::Uuid;

const PARTNER_COLUMNS: &str = "id, did, alias, connection_id, state, valid, aries_support, incoming, created_at, updated_at, last_seen";

#[derive(Clone)]
pub struct PartnerRepository {
    pool: SqlitePool,
}

impl PartnerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the partner record keyed by id. A connection id is
    /// unique, so a snapshot that reuses one takes it away from the old row.
    pub async fn save(&self, partner: &Partner) -> Result<Partner, DbError> {
        let row = PartnerRow::from(partner);
        let mut tx = self.pool.begin().await?;

        if let Some(connection_id) = &row.connection_id {
            let released = sqlx::query(
                "UPDATE partners SET connection_id = NULL WHERE connection_id = ? AND id != ?",
            )
            .bind(connection_id)
            .bind(&row.id)
            .execute(&mut *tx)
            .await?;

            if released.rows_affected() > 0 {
                tracing::debug!(
                    partner_id = %partner.id,
                    connection_id = %connection_id,
                    "Connection id moved to another partner"
                );
            }
        }

        sqlx::query(
            r#"
            INSERT INTO partners (id, did, alias, connection_id, state, valid, aries_support, incoming, created_at, updated_at, last_seen)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                did = excluded.did,
                alias = excluded.alias,
                connection_id = excluded.connection_id,
                state = excluded.state,
                valid = excluded.valid,
                aries_support = excluded.aries_support,
                incoming = excluded.incoming,
                updated_at = excluded.updated_at,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(&row.id)
        .bind(&row.did)
        .bind(&row.alias)
        .bind(&row.connection_id)
        .bind(&row.state)
        .bind(row.valid)
        .bind(row.aries_support)
        .bind(row.incoming)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.last_seen)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(partner.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Partner>, DbError> {
        let sql = format!("SELECT {PARTNER_COLUMNS} FROM partners WHERE id = ?");
        let row: Option<PartnerRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(PartnerRow::into_domain).transpose()
    }

    pub async fn find_by_connection_id(&self, connection_id: &str) -> Result<Option<Partner>, DbError> {
        let sql = format!("SELECT {PARTNER_COLUMNS} FROM partners WHERE connection_id = ?");
        let row: Option<PartnerRow> = sqlx::query_as(&sql)
            .bind(connection_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PartnerRow::into_domain).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<Partner>, DbError> {
        let sql = format!("SELECT {PARTNER_COLUMNS} FROM partners ORDER BY created_at DESC");
        let rows: Vec<PartnerRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(PartnerRow::into_domain).collect()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM partners WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_support::setup_test_db;
    use bpa_core::ConnectionState;

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let (pool, _dir) = setup_test_db().await;
        let repo = PartnerRepository::new(pool);

        let partner = Partner::new("did:sov:abc")
            .with_alias("Acme")
            .with_state(ConnectionState::Active);
        repo.save(&partner).await.unwrap();

        let found = repo.find_by_id(partner.id).await.unwrap().unwrap();
        assert_eq!(found.did, "did:sov:abc");
        assert_eq!(found.alias.as_deref(), Some("Acme"));
        assert_eq!(found.state, Some(ConnectionState::Active));
    }

    #[tokio::test]
    async fn test_find_by_connection_id() {
        let (pool, _dir) = setup_test_db().await;
        let repo = PartnerRepository::new(pool);

        let partner = Partner::new("did:sov:abc").with_connection_id("conn-42");
        repo.save(&partner).await.unwrap();

        let found = repo.find_by_connection_id("conn-42").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(partner.id));
        assert!(repo.find_by_connection_id("conn-0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_updates_existing() {
        let (pool, _dir) = setup_test_db().await;
        let repo = PartnerRepository::new(pool);

        let mut partner = Partner::new("did:sov:abc").with_state(ConnectionState::Request);
        repo.save(&partner).await.unwrap();

        partner.state = Some(ConnectionState::Active);
        partner.alias = Some("Renamed".to_string());
        repo.save(&partner).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].state, Some(ConnectionState::Active));
        assert_eq!(all[0].alias.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn test_save_takes_over_connection_id() {
        let (pool, _dir) = setup_test_db().await;
        let repo = PartnerRepository::new(pool);

        let old = Partner::new("did:sov:old").with_connection_id("conn-1");
        repo.save(&old).await.unwrap();

        let new = Partner::new("did:sov:new").with_connection_id("conn-1");
        repo.save(&new).await.unwrap();

        let owner = repo.find_by_connection_id("conn-1").await.unwrap().unwrap();
        assert_eq!(owner.id, new.id);

        let old = repo.find_by_id(old.id).await.unwrap().unwrap();
        assert!(old.connection_id.is_none());

        // saving the owner again leaves it in place
        repo.save(&new).await.unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
        assert_eq!(
            repo.find_by_connection_id("conn-1").await.unwrap().unwrap().id,
            new.id
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, _dir) = setup_test_db().await;
        let repo = PartnerRepository::new(pool);

        let partner = Partner::new("did:sov:abc");
        repo.save(&partner).await.unwrap();

        assert!(repo.delete(partner.id).await.unwrap());
        assert!(!repo.delete(partner.id).await.unwrap());
        assert!(repo.find_by_id(partner.id).await.unwrap().is_none());
    }
}
