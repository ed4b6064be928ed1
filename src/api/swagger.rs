use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Management Service API",
        version = "1.0.0",
        description = "Signup/login and CRUD over the user directory.\n\n**Authentication:** login issues a 24h JWT Bearer token; `/auth/verify` checks it. Directory routes are currently open."
    ),
    paths(
        // Auth endpoints
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::verify,

        // User directory
        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::LoginResponse,

            // Users
            crate::services::user_service::CreateUserRequest,
            crate::services::user_service::UpdateUserRequest,
            crate::services::user_service::UserListResponse,
            crate::services::user_service::Pagination,
            crate::models::UserResponse,
            crate::models::Role,

            // Health
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Signup, login and token verification."),
        (name = "Users", description = "Paginated, searchable user directory with CRUD operations."),
        (name = "Health", description = "Liveness endpoint for monitoring."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
