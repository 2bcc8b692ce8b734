use serde::{Deserialize, Serialize};

use crate::diet::{MacroVector, MealSlot, Template, TemplateId};

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    /// Supplying an existing id replaces that template.
    pub id: Option<TemplateId>,
    pub name: String,
    #[serde(default)]
    pub slots: Vec<MealSlot>,
    pub target: Option<MacroVector>,
}

impl CreateTemplateRequest {
    pub fn into_template(self) -> Template {
        Template {
            id: self.id.unwrap_or_default(),
            name: self.name.trim().to_string(),
            slots: self.slots,
            target: self.target,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemplateListItem {
    pub id: TemplateId,
    pub name: String,
    pub slots: usize,
    pub target: Option<MacroVector>,
}

impl From<&Template> for TemplateListItem {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            slots: t.slots.len(),
            target: t.target,
        }
    }
}
