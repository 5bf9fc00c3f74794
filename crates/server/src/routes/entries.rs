use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use service::access::AuthContext;
use service::catalog::domain::{Entry, EntryDraft};
use service::pagination::{Page, PageRequest, Sort};

use crate::errors::JsonApiError;
use crate::routes::auth::{require_non_blank, ServerState};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// 0-based page index
    pub page: Option<u64>,
    pub size: Option<u64>,
    /// `field[,asc|desc]` with field one of id, number, name
    pub sort: Option<String>,
}

impl ListQuery {
    fn page_request(&self) -> Result<PageRequest, JsonApiError> {
        let sort = match self.sort.as_deref() {
            Some(s) => s.parse::<Sort>()?,
            None => Sort::default(),
        };
        Ok(PageRequest::new(self.page.unwrap_or(0), self.size.unwrap_or(PageRequest::DEFAULT_SIZE)).with_sort(sort))
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct RangeQuery {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

/// Request body for create and replace. Required fields are checked here so a missing
/// field is a 400 with a message rather than a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct EntryRequest {
    pub number: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub base_experience: Option<i32>,
    #[serde(default)]
    pub types: BTreeSet<String>,
    #[serde(default)]
    pub abilities: BTreeSet<String>,
    pub hp: Option<i32>,
    pub attack: Option<i32>,
    pub defense: Option<i32>,
    pub special_attack: Option<i32>,
    pub special_defense: Option<i32>,
    pub speed: Option<i32>,
    pub image_url: Option<String>,
    pub sprite_url: Option<String>,
}

impl EntryRequest {
    fn into_draft(self) -> Result<EntryDraft, JsonApiError> {
        let number = self.number.ok_or_else(|| JsonApiError::bad_request("number is required"))?;
        let name = self.name.unwrap_or_default();
        require_non_blank("name", &name)?;
        if self.types.is_empty() {
            return Err(JsonApiError::bad_request("types must not be empty"));
        }
        let draft = EntryDraft {
            number,
            name,
            description: self.description,
            height_m: self.height_m,
            weight_kg: self.weight_kg,
            base_experience: self.base_experience,
            types: self.types,
            abilities: self.abilities,
            hp: self.hp.unwrap_or(0),
            attack: self.attack.unwrap_or(0),
            defense: self.defense.unwrap_or(0),
            special_attack: self.special_attack.unwrap_or(0),
            special_defense: self.special_defense.unwrap_or(0),
            speed: self.speed.unwrap_or(0),
            image_url: self.image_url,
            sprite_url: self.sprite_url,
        };
        draft.validate()?;
        Ok(draft)
    }
}

#[utoipa::path(get, path = "/entries", tag = "entries", params(ListQuery), responses((status = 200, description = "One page of entries", body = crate::openapi::EntryPageDoc), (status = 400, description = "Bad sort")))]
pub async fn list(State(state): State<ServerState>, Query(q): Query<ListQuery>) -> Result<Json<Page<Entry>>, JsonApiError> {
    Ok(Json(state.catalog.list_paged(q.page_request()?).await?))
}

#[utoipa::path(post, path = "/entries", tag = "entries", request_body = crate::openapi::EntryDraftDoc, responses((status = 201, description = "Created", body = crate::openapi::EntryDoc), (status = 400, description = "Validation Error"), (status = 404, description = "Owner account no longer exists"), (status = 409, description = "Number taken")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<EntryRequest>,
) -> Result<(StatusCode, Json<Entry>), JsonApiError> {
    let draft = input.into_draft()?;
    let entry = state.catalog.create(draft, ctx.user_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(get, path = "/entries/{id}", tag = "entries", params(("id" = i64, Path, description = "Entry id")), responses((status = 200, description = "OK", body = crate::openapi::EntryDoc), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, Path(id): Path<i64>) -> Result<Json<Entry>, JsonApiError> {
    state.catalog.get_by_id(id).await?.map(Json).ok_or_else(|| JsonApiError::not_found("entry"))
}

#[utoipa::path(put, path = "/entries/{id}", tag = "entries", params(("id" = i64, Path, description = "Entry id")), request_body = crate::openapi::EntryDraftDoc, responses((status = 200, description = "Replaced", body = crate::openapi::EntryDoc), (status = 400, description = "Validation Error"), (status = 403, description = "Not the owner"), (status = 404, description = "Not Found"), (status = 409, description = "Number taken")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(input): Json<EntryRequest>,
) -> Result<Json<Entry>, JsonApiError> {
    let draft = input.into_draft()?;
    state.catalog.update_as(&ctx, id, draft).await?.map(Json).ok_or_else(|| JsonApiError::not_found("entry"))
}

#[utoipa::path(delete, path = "/entries/{id}", tag = "entries", params(("id" = i64, Path, description = "Entry id")), responses((status = 204, description = "Deleted"), (status = 403, description = "Not the owner"), (status = 404, description = "Not Found")))]
pub async fn delete(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    if state.catalog.delete_as(&ctx, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("entry"))
    }
}

#[utoipa::path(get, path = "/entries/number/{number}", tag = "entries", params(("number" = i32, Path, description = "Entry number")), responses((status = 200, description = "OK", body = crate::openapi::EntryDoc), (status = 404, description = "Not Found")))]
pub async fn by_number(State(state): State<ServerState>, Path(number): Path<i32>) -> Result<Json<Entry>, JsonApiError> {
    state.catalog.get_by_number(number).await?.map(Json).ok_or_else(|| JsonApiError::not_found("entry"))
}

#[utoipa::path(get, path = "/entries/type/{type}", tag = "entries", params(("type" = String, Path, description = "Type tag, exact match")), responses((status = 200, description = "Matching entries", body = [crate::openapi::EntryDoc])))]
pub async fn by_type(State(state): State<ServerState>, Path(type_tag): Path<String>) -> Result<Json<Vec<Entry>>, JsonApiError> {
    Ok(Json(state.catalog.list_by_type(&type_tag).await?))
}

#[utoipa::path(get, path = "/entries/search", tag = "entries", params(SearchQuery), responses((status = 200, description = "Entries whose name contains the fragment", body = [crate::openapi::EntryDoc]), (status = 400, description = "Missing name")))]
pub async fn search(State(state): State<ServerState>, Query(q): Query<SearchQuery>) -> Result<Json<Vec<Entry>>, JsonApiError> {
    let name = q.name.unwrap_or_default();
    require_non_blank("name", &name)?;
    Ok(Json(state.catalog.search_by_name(&name).await?))
}

#[utoipa::path(get, path = "/entries/range", tag = "entries", params(RangeQuery), responses((status = 200, description = "Entries with start <= number <= end", body = [crate::openapi::EntryDoc]), (status = 400, description = "Missing bound")))]
pub async fn range(State(state): State<ServerState>, Query(q): Query<RangeQuery>) -> Result<Json<Vec<Entry>>, JsonApiError> {
    let (Some(start), Some(end)) = (q.start, q.end) else {
        return Err(JsonApiError::bad_request("start and end are required"));
    };
    Ok(Json(state.catalog.list_by_number_range(start, end).await?))
}

#[utoipa::path(get, path = "/entries/mine", tag = "entries", params(ListQuery), responses((status = 200, description = "Entries owned by the caller", body = crate::openapi::EntryPageDoc)))]
pub async fn mine(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Page<Entry>>, JsonApiError> {
    Ok(Json(state.catalog.list_by_owner(ctx.user_id, q.page_request()?).await?))
}

#[utoipa::path(get, path = "/entries/owner/{username}", tag = "entries", params(("username" = String, Path, description = "Owner username"), ListQuery), responses((status = 200, description = "Entries owned by the user; empty for unknown users", body = crate::openapi::EntryPageDoc)))]
pub async fn by_owner(
    State(state): State<ServerState>,
    Path(username): Path<String>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Page<Entry>>, JsonApiError> {
    Ok(Json(state.catalog.list_by_owner_username(&username, q.page_request()?).await?))
}
