use std::collections::HashMap;

use async_trait::async_trait;
use time::Date;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::DietStore;
use crate::diet::{AdherenceState, Blacklist, DayLog, Template, TemplateId};

#[derive(Default)]
struct Tables {
    templates: HashMap<TemplateId, (Uuid, Template)>,
    days: HashMap<(Uuid, Date), DayLog>,
    adherence: HashMap<Uuid, AdherenceState>,
    blacklists: HashMap<Uuid, Blacklist>,
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DietStore for MemoryStore {
    async fn list_templates(&self, user: Uuid) -> anyhow::Result<Vec<Template>> {
        let tables = self.tables.read().await;
        let mut out: Vec<Template> = tables
            .templates
            .values()
            .filter(|(owner, _)| *owner == user)
            .map(|(_, t)| t.clone())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get_template(&self, user: Uuid, id: TemplateId) -> anyhow::Result<Option<Template>> {
        let tables = self.tables.read().await;
        Ok(tables
            .templates
            .get(&id)
            .filter(|(owner, _)| *owner == user)
            .map(|(_, t)| t.clone()))
    }

    async fn save_template(&self, user: Uuid, template: &Template) -> anyhow::Result<bool> {
        let mut tables = self.tables.write().await;
        if let Some((owner, _)) = tables.templates.get(&template.id) {
            if *owner != user {
                return Ok(false);
            }
        }
        tables
            .templates
            .insert(template.id, (user, template.clone()));
        Ok(true)
    }

    async fn get_day(&self, user: Uuid, date: Date) -> anyhow::Result<Option<DayLog>> {
        Ok(self.tables.read().await.days.get(&(user, date)).cloned())
    }

    async fn save_day(&self, user: Uuid, day: &DayLog) -> anyhow::Result<()> {
        self.tables
            .write()
            .await
            .days
            .insert((user, day.date()), day.clone());
        Ok(())
    }

    async fn get_adherence(&self, user: Uuid) -> anyhow::Result<AdherenceState> {
        Ok(self
            .tables
            .read()
            .await
            .adherence
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_finalized(
        &self,
        user: Uuid,
        day: &DayLog,
        state: &AdherenceState,
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        tables.days.insert((user, day.date()), day.clone());
        tables.adherence.insert(user, state.clone());
        Ok(())
    }

    async fn get_blacklist(&self, user: Uuid) -> anyhow::Result<Blacklist> {
        Ok(self
            .tables
            .read()
            .await
            .blacklists
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_blacklist(&self, user: Uuid, blacklist: &Blacklist) -> anyhow::Result<()> {
        self.tables
            .write()
            .await
            .blacklists
            .insert(user, blacklist.clone());
        Ok(())
    }
}
