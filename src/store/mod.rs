//! Persistence for templates, day logs, blacklists and adherence state.
//!
//! The engine never touches storage; handlers load values through a
//! [`DietStore`], run the engine, and write the results back.

mod memory;
mod postgres;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::diet::{AdherenceState, Blacklist, DayLog, Template, TemplateId};

#[async_trait]
pub trait DietStore: Send + Sync {
    async fn list_templates(&self, user: Uuid) -> anyhow::Result<Vec<Template>>;
    async fn get_template(&self, user: Uuid, id: TemplateId) -> anyhow::Result<Option<Template>>;
    /// `false` when the id is already taken by another user's template.
    async fn save_template(&self, user: Uuid, template: &Template) -> anyhow::Result<bool>;

    async fn get_day(&self, user: Uuid, date: Date) -> anyhow::Result<Option<DayLog>>;
    async fn save_day(&self, user: Uuid, day: &DayLog) -> anyhow::Result<()>;

    /// A user with no finalized days gets the empty state.
    async fn get_adherence(&self, user: Uuid) -> anyhow::Result<AdherenceState>;
    /// Writes the finalized day and the new adherence state together.
    async fn save_finalized(
        &self,
        user: Uuid,
        day: &DayLog,
        state: &AdherenceState,
    ) -> anyhow::Result<()>;

    async fn get_blacklist(&self, user: Uuid) -> anyhow::Result<Blacklist>;
    async fn save_blacklist(&self, user: Uuid, blacklist: &Blacklist) -> anyhow::Result<()>;
}
