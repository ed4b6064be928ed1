use crate::{
    database::MongoDB,
    models::{Role, User},
    utils::error::{is_duplicate_key, AppError},
    utils::validation,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const COLLECTION: &str = "users";

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (hex ObjectId)
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Flat response shape the frontend expects: token and identity next to
// the envelope fields, not nested under data.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
    pub email: String,
    pub name: String,
}

// No default secret. main.rs checks this at startup, so a misconfigured
// process never serves requests.
fn get_jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET is not set".to_string()))
}

// Generate session token, valid for 24 hours
pub fn generate_jwt(user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        email: user.email.clone(),
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    let secret = get_jwt_secret()?;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let secret = get_jwt_secret()?;
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidCredentials)
}

/// Lookups are case-insensitive; the store keeps emails lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// User signup
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<(), AppError> {
    validation::validate_name(&request.name)?;
    validation::validate_email(&request.email)?;
    validation::validate_password(&request.password)?;

    let email = normalize_email(&request.email);
    let collection = db.collection::<User>(COLLECTION);

    let existing = collection.find_one(doc! { "email": &email }).await?;
    if existing.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let hashed = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let new_user = User {
        id: None,
        name: request.name.clone(),
        email,
        password: hashed,
        role: Role::default(),
        created_at: BsonDateTime::now(),
    };

    // The unique index on email decides the race between concurrent
    // signups; the later writer lands here with E11000.
    collection.insert_one(&new_user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::DuplicateEmail
        } else {
            AppError::from(e)
        }
    })?;

    log::info!("✅ User registered: {}", new_user.email);
    Ok(())
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<LoginResponse, AppError> {
    let email = normalize_email(&request.email);
    let collection = db.collection::<User>(COLLECTION);

    // Unknown email and wrong password collapse into the same failure.
    let user = collection
        .find_one(doc! { "email": &email })
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_jwt(&user)?;

    Ok(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        jwt_token: token,
        email: user.email,
        name: user.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    // Every test writes the same value, so parallel execution is safe.
    fn set_test_secret() {
        std::env::set_var("JWT_SECRET", "test-secret");
    }

    fn sample_user() -> User {
        User {
            id: Some(ObjectId::new()),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "irrelevant-here".to_string(),
            role: Role::User,
            created_at: BsonDateTime::now(),
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        set_test_secret();
        let user = sample_user();
        let token = generate_jwt(&user).unwrap();
        assert!(!token.is_empty());

        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.unwrap().to_hex());
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn test_jwt_expiry_is_24h() {
        set_test_secret();
        let token = generate_jwt(&sample_user()).unwrap();
        let claims = verify_token(&token).unwrap();
        let window = claims.exp - claims.iat;
        assert_eq!(window, 24 * 60 * 60);
    }

    #[test]
    fn test_garbage_token_rejected() {
        set_test_secret();
        let result = verify_token("not.a.token");
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        set_test_secret();
        let token = generate_jwt(&sample_user()).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('a') { 'b' } else { 'a' });
        assert!(verify_token(&tampered).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_password_hash_round_trip() {
        // DEFAULT_COST is slow on purpose; one round trip is enough.
        let hashed = hash("secret123", DEFAULT_COST).unwrap();
        assert_ne!(hashed, "secret123");
        assert!(verify("secret123", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
