use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateTemplateRequest, TemplateListItem};
use crate::diet::{CatalogRead, DietError, Missing, Template, TemplateId};
use crate::errors::{reject, ServiceError};
use crate::extractors::UserContext;
use crate::state::AppState;

pub fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/:id", get(get_template))
}

#[instrument(skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
) -> Result<Json<Vec<TemplateListItem>>, (StatusCode, String)> {
    let templates = state
        .store
        .list_templates(user_id)
        .await
        .map_err(|e| reject(e.into()))?;
    Ok(Json(templates.iter().map(TemplateListItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Template>, (StatusCode, String)> {
    let id = TemplateId(id);
    let template = state
        .store
        .get_template(user_id, id)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or_else(|| reject(DietError::NotFound(Missing::Template(id)).into()))?;
    Ok(Json(template))
}

#[instrument(skip(state, body))]
pub async fn create_template(
    State(state): State<AppState>,
    UserContext(user_id): UserContext,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>), (StatusCode, String)> {
    let template = body.into_template();
    if template.name.is_empty() {
        warn!("empty template name");
        return Err(reject(ServiceError::Invalid("name is required".into())));
    }

    // Every slot must point at something the catalog knows.
    {
        let catalog = state.catalog.read().await;
        for slot in &template.slots {
            catalog.unit_macros(slot.item)?;
        }
    }

    let saved = state
        .store
        .save_template(user_id, &template)
        .await
        .map_err(|e| reject(e.into()))?;
    if !saved {
        return Err(reject(ServiceError::Conflict(format!(
            "template {} belongs to another user",
            template.id
        ))));
    }
    info!(template = %template.id, slots = template.slots.len(), "template saved");
    Ok((StatusCode::CREATED, Json(template)))
}
