use crate::database::MongoDB;
use crate::services::auth_service::{self, LoginRequest, LoginResponse, SignupRequest};
use crate::utils::error::AppError;
use crate::utils::response::ApiResponse;
use actix_web::{web, HttpRequest, HttpResponse};

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Signup successful"),
        (status = 400, description = "Invalid name, email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    db: web::Data<MongoDB>,
    request: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📝 POST /auth/signup - email: {}", request.email);

    auth_service::signup(&db, &request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::<()>::ok_empty("Signup successful")))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 403, description = "Wrong email or password")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    let response = auth_service::login(&db, &request).await?;

    log::info!("✅ Login successful: {}", response.email);
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 403, description = "Missing, malformed or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = auth_service::verify_token(token)?;

    log::info!("✓ Token valid for: {}", claims.email);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Token is valid",
        serde_json::json!({
            "id": claims.sub,
            "email": claims.email,
            "exp": claims.exp,
        }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};
    use actix_web::test::TestRequest;
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

    fn token_for(email: &str) -> String {
        std::env::set_var("JWT_SECRET", "test-secret");
        let user = User {
            id: Some(ObjectId::new()),
            name: "Test".to_string(),
            email: email.to_string(),
            password: String::new(),
            role: Role::User,
            created_at: BsonDateTime::now(),
        };
        auth_service::generate_jwt(&user).unwrap()
    }

    #[actix_web::test]
    async fn test_verify_accepts_bearer_token() {
        let token = token_for("verify@example.com");
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        let response = verify(req).await.unwrap();
        assert_eq!(response.status(), actix_web::http::StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_verify_rejects_missing_header() {
        let req = TestRequest::default().to_http_request();
        let result = verify(req).await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[actix_web::test]
    async fn test_verify_rejects_non_bearer_scheme() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        let result = verify(req).await;
        assert!(result.is_err());
    }
}
