use std::time::Duration;

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use super::{DietStore, MemoryStore};
use crate::diet::{AdherenceState, Blacklist, DayLog, Template, TemplateId};

/// [`MemoryStore`] that yields for a while on per-user reads, the way a
/// database round trip would. Lost updates show up under it.
#[derive(Default)]
pub struct SlowStore {
    inner: MemoryStore,
}

const LAG: Duration = Duration::from_millis(5);

#[async_trait]
impl DietStore for SlowStore {
    async fn list_templates(&self, user: Uuid) -> anyhow::Result<Vec<Template>> {
        self.inner.list_templates(user).await
    }

    async fn get_template(&self, user: Uuid, id: TemplateId) -> anyhow::Result<Option<Template>> {
        self.inner.get_template(user, id).await
    }

    async fn save_template(&self, user: Uuid, template: &Template) -> anyhow::Result<bool> {
        self.inner.save_template(user, template).await
    }

    async fn get_day(&self, user: Uuid, date: Date) -> anyhow::Result<Option<DayLog>> {
        self.inner.get_day(user, date).await
    }

    async fn save_day(&self, user: Uuid, day: &DayLog) -> anyhow::Result<()> {
        self.inner.save_day(user, day).await
    }

    async fn get_adherence(&self, user: Uuid) -> anyhow::Result<AdherenceState> {
        let state = self.inner.get_adherence(user).await?;
        tokio::time::sleep(LAG).await;
        Ok(state)
    }

    async fn save_finalized(
        &self,
        user: Uuid,
        day: &DayLog,
        state: &AdherenceState,
    ) -> anyhow::Result<()> {
        self.inner.save_finalized(user, day, state).await
    }

    async fn get_blacklist(&self, user: Uuid) -> anyhow::Result<Blacklist> {
        let blacklist = self.inner.get_blacklist(user).await?;
        tokio::time::sleep(LAG).await;
        Ok(blacklist)
    }

    async fn save_blacklist(&self, user: Uuid, blacklist: &Blacklist) -> anyhow::Result<()> {
        self.inner.save_blacklist(user, blacklist).await
    }
}
