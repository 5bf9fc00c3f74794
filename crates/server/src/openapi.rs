//! OpenAPI document. The `*Doc` structs mirror the JSON shapes of the domain types for
//! schema generation only.

use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequestDoc {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginRequestDoc { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct UpdateUserRequestDoc {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    /// Replaced only when present and non-empty
    pub password: Option<String>,
}

#[derive(ToSchema)]
pub struct UserDoc {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// STANDARD or ADMIN
    pub role: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct LoginResponseDoc {
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    pub user: UserDoc,
}

#[derive(ToSchema)]
pub struct EntryDraftDoc {
    pub number: i32,
    pub name: String,
    pub description: Option<String>,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub base_experience: Option<i32>,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
    pub image_url: Option<String>,
    pub sprite_url: Option<String>,
}

#[derive(ToSchema)]
pub struct EntryDoc {
    pub id: i64,
    pub number: i32,
    pub name: String,
    pub description: Option<String>,
    pub height_m: Option<f64>,
    pub weight_kg: Option<f64>,
    pub base_experience: Option<i32>,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
    pub image_url: Option<String>,
    pub sprite_url: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct EntryPageDoc {
    pub content: Vec<EntryDoc>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page: u64,
    pub size: u64,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::update,
        crate::routes::users::delete,
        crate::routes::users::deactivate,
        crate::routes::entries::list,
        crate::routes::entries::create,
        crate::routes::entries::get,
        crate::routes::entries::update,
        crate::routes::entries::delete,
        crate::routes::entries::by_number,
        crate::routes::entries::by_type,
        crate::routes::entries::search,
        crate::routes::entries::range,
        crate::routes::entries::mine,
        crate::routes::entries::by_owner,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequestDoc,
            LoginRequestDoc,
            LoginResponseDoc,
            UpdateUserRequestDoc,
            UserDoc,
            EntryDraftDoc,
            EntryDoc,
            EntryPageDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "entries")
    )
)]
pub struct ApiDoc;
