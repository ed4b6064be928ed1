use crate::database::MongoDB;
use crate::services::user_service::{
    self, CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserListResponse,
};
use crate::utils::error::AppError;
use crate::utils::response::ApiResponse;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Paginated user listing", body = UserListResponse)
    )
)]
pub async fn list_users(
    db: web::Data<MongoDB>,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse, AppError> {
    let listing = user_service::list(&db, &query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Users retrieved successfully", listing)))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = crate::models::UserResponse),
        (status = 400, description = "Validation error or duplicate email")
    )
)]
pub async fn create_user(
    db: web::Data<MongoDB>,
    request: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /users - email: {}", request.email);

    let user = user_service::create(&db, &request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok("User created successfully", user)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ObjectId (24 hex chars)")),
    responses(
        (status = 200, description = "User found", body = crate::models::UserResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::get_by_id(&db, &path).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("User retrieved successfully", user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ObjectId (24 hex chars)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = crate::models::UserResponse),
        (status = 400, description = "Malformed id or invalid fields"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️ PUT /users/{}", path);

    let user = user_service::update(&db, &path, &request).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("User updated successfully", user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ObjectId (24 hex chars)")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️ DELETE /users/{}", path);

    user_service::delete(&db, &path).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "User deleted successfully",
        serde_json::json!({ "deleted": true }),
    )))
}
