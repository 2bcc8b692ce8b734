use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgConnection, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::DietStore;
use crate::diet::{
    AdherenceState, Blacklist, BlacklistEntry, DayLog, DayStatus, FoodId, Template, TemplateId,
};

/// PostgreSQL store; values are kept as JSONB next to a few indexed columns.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn status_label(status: DayStatus) -> &'static str {
    match status {
        DayStatus::Draft => "draft",
        DayStatus::Active => "active",
        DayStatus::Finalized => "finalized",
    }
}

async fn upsert_day(conn: &mut PgConnection, user: Uuid, day: &DayLog) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO day_logs (user_id, log_date, status, body)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, log_date)
        DO UPDATE SET status = EXCLUDED.status, body = EXCLUDED.body, updated_at = now()
        "#,
    )
    .bind(user)
    .bind(day.date())
    .bind(status_label(day.status()))
    .bind(Json(day))
    .execute(&mut *conn)
    .await
    .context("upsert day log")?;
    Ok(())
}

#[async_trait]
impl DietStore for PgStore {
    async fn list_templates(&self, user: Uuid) -> anyhow::Result<Vec<Template>> {
        let rows = sqlx::query_as::<_, (Json<Template>,)>(
            r#"
            SELECT body
              FROM meal_templates
             WHERE user_id = $1
             ORDER BY name ASC, id ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.db)
        .await
        .context("list templates")?;
        Ok(rows.into_iter().map(|(Json(t),)| t).collect())
    }

    async fn get_template(&self, user: Uuid, id: TemplateId) -> anyhow::Result<Option<Template>> {
        let row = sqlx::query_as::<_, (Json<Template>,)>(
            r#"
            SELECT body
              FROM meal_templates
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.0)
        .bind(user)
        .fetch_optional(&self.db)
        .await
        .context("get template")?;
        Ok(row.map(|(Json(t),)| t))
    }

    async fn save_template(&self, user: Uuid, template: &Template) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO meal_templates (id, user_id, name, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET name = EXCLUDED.name, body = EXCLUDED.body, updated_at = now()
             WHERE meal_templates.user_id = EXCLUDED.user_id
            "#,
        )
        .bind(template.id.0)
        .bind(user)
        .bind(&template.name)
        .bind(Json(template))
        .execute(&self.db)
        .await
        .context("save template")?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_day(&self, user: Uuid, date: Date) -> anyhow::Result<Option<DayLog>> {
        let row = sqlx::query_as::<_, (Json<DayLog>,)>(
            r#"
            SELECT body
              FROM day_logs
             WHERE user_id = $1 AND log_date = $2
            "#,
        )
        .bind(user)
        .bind(date)
        .fetch_optional(&self.db)
        .await
        .context("get day log")?;
        Ok(row.map(|(Json(d),)| d))
    }

    async fn save_day(&self, user: Uuid, day: &DayLog) -> anyhow::Result<()> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        upsert_day(&mut conn, user, day).await
    }

    async fn get_adherence(&self, user: Uuid) -> anyhow::Result<AdherenceState> {
        let row = sqlx::query_as::<_, (Json<AdherenceState>,)>(
            r#"SELECT body FROM adherence_states WHERE user_id = $1"#,
        )
        .bind(user)
        .fetch_optional(&self.db)
        .await
        .context("get adherence state")?;
        Ok(row.map(|(Json(s),)| s).unwrap_or_default())
    }

    async fn save_finalized(
        &self,
        user: Uuid,
        day: &DayLog,
        state: &AdherenceState,
    ) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        upsert_day(&mut *tx, user, day).await?;
        sqlx::query(
            r#"
            INSERT INTO adherence_states (user_id, streak, xp, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET streak = EXCLUDED.streak, xp = EXCLUDED.xp,
                          body = EXCLUDED.body, updated_at = now()
            "#,
        )
        .bind(user)
        .bind(i32::try_from(state.streak()).unwrap_or(i32::MAX))
        .bind(i64::try_from(state.xp()).unwrap_or(i64::MAX))
        .bind(Json(state))
        .execute(&mut *tx)
        .await
        .context("upsert adherence state")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn get_blacklist(&self, user: Uuid) -> anyhow::Result<Blacklist> {
        let rows = sqlx::query_as::<_, (Uuid, Option<String>, OffsetDateTime)>(
            r#"
            SELECT food_id, reason, created_at
              FROM blacklist_entries
             WHERE user_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.db)
        .await
        .context("list blacklist entries")?;
        Ok(Blacklist::from_entries(rows.into_iter().map(
            |(food, reason, created_at)| BlacklistEntry::new(FoodId(food), reason, created_at),
        )))
    }

    async fn save_blacklist(&self, user: Uuid, blacklist: &Blacklist) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query(r#"DELETE FROM blacklist_entries WHERE user_id = $1"#)
            .bind(user)
            .execute(&mut *tx)
            .await
            .context("clear blacklist")?;
        for entry in blacklist.entries() {
            sqlx::query(
                r#"
                INSERT INTO blacklist_entries (user_id, food_id, reason, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user)
            .bind(entry.food.0)
            .bind(entry.reason.as_deref())
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .context("insert blacklist entry")?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }
}
