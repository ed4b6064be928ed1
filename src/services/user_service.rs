use crate::{
    database::MongoDB,
    models::{User, UserResponse},
    services::auth_service,
    utils::error::{is_duplicate_key, AppError},
    utils::validation,
};
use bcrypt::{hash, DEFAULT_COST};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};

const COLLECTION: &str = "users";

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;

/// Raw query string parameters. Page and limit arrive as strings so that
/// non-numeric values fall back to defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_users: u64,
    pub users_per_page: u64,
}

// Capped so `limit as i64` stays positive and skip math cannot overflow.
const MAX_PAGE_PARAM: u64 = i64::MAX as u64;

fn parse_or_default(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n.min(MAX_PAGE_PARAM))
        .unwrap_or(default)
}

/// Regex metacharacters in a search term must match literally.
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if ".^$*+?()[]{}|\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn build_filter(search: Option<&str>, role: Option<&str>) -> Document {
    let mut filter = Document::new();

    if let Some(term) = search.filter(|s| !s.is_empty()) {
        let pattern = escape_regex(term);
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
                doc! { "email": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    if let Some(role) = role.filter(|r| !r.is_empty()) {
        filter.insert("role", role);
    }

    filter
}

fn total_pages(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit)
}

fn parse_object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidId)
}

// List users with pagination, substring search and role filter
pub async fn list(db: &MongoDB, query: &ListUsersQuery) -> Result<UserListResponse, AppError> {
    let page = parse_or_default(query.page.as_deref(), DEFAULT_PAGE);
    let limit = parse_or_default(query.limit.as_deref(), DEFAULT_LIMIT);
    let skip = (page - 1).saturating_mul(limit);

    let filter = build_filter(query.search.as_deref(), query.role.as_deref());
    let collection = db.collection::<User>(COLLECTION);

    let total_users = collection.count_documents(filter.clone()).await?;

    let cursor = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(skip)
        .limit(limit as i64)
        .await?;

    let users: Vec<User> = cursor.try_collect().await?;

    Ok(UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        pagination: Pagination {
            current_page: page,
            total_pages: total_pages(total_users, limit),
            total_users,
            users_per_page: limit,
        },
    })
}

// Create user via the directory. Passwords are hashed here exactly like
// signup, so both write paths store the same thing.
pub async fn create(db: &MongoDB, request: &CreateUserRequest) -> Result<UserResponse, AppError> {
    validation::validate_name(&request.name)?;
    validation::validate_email(&request.email)?;
    validation::validate_password(&request.password)?;

    let role = match request.role.as_deref().filter(|r| !r.is_empty()) {
        Some(raw) => validation::validate_role(raw)?,
        None => Default::default(),
    };

    let email = auth_service::normalize_email(&request.email);
    let collection = db.collection::<User>(COLLECTION);

    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::Validation("Email already in use".to_string()));
    }

    let hashed = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let mut new_user = User {
        id: None,
        name: request.name.clone(),
        email,
        password: hashed,
        role,
        created_at: BsonDateTime::now(),
    };

    let result = collection.insert_one(&new_user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Validation("Email already in use".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    new_user.id = result.inserted_id.as_object_id();

    log::info!("✅ User created via directory: {}", new_user.email);
    Ok(UserResponse::from(new_user))
}

pub async fn get_by_id(db: &MongoDB, id: &str) -> Result<UserResponse, AppError> {
    let object_id = parse_object_id(id)?;
    let collection = db.collection::<User>(COLLECTION);

    let user = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("No user with that ID".to_string()))?;

    Ok(UserResponse::from(user))
}

// Update user. Only name and role are writable; anything else in the
// request body never reaches the store.
pub async fn update(
    db: &MongoDB,
    id: &str,
    request: &UpdateUserRequest,
) -> Result<UserResponse, AppError> {
    let object_id = parse_object_id(id)?;

    let mut set = Document::new();
    if let Some(name) = &request.name {
        validation::validate_name(name)?;
        set.insert("name", name.as_str());
    }
    if let Some(role) = &request.role {
        let role = validation::validate_role(role)?;
        set.insert("role", role.as_str());
    }

    // Nothing to change: behave like a fetch
    if set.is_empty() {
        return get_by_id(db, id).await;
    }

    let collection = db.collection::<User>(COLLECTION);

    let updated = collection
        .find_one_and_update(doc! { "_id": object_id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("No user with that ID".to_string()))?;

    Ok(UserResponse::from(updated))
}

pub async fn delete(db: &MongoDB, id: &str) -> Result<(), AppError> {
    let object_id = parse_object_id(id)?;
    let collection = db.collection::<User>(COLLECTION);

    let result = collection.delete_one(doc! { "_id": object_id }).await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("No user with that ID".to_string()));
    }

    log::info!("🗑️ User deleted: {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_and_limit_defaults() {
        assert_eq!(parse_or_default(None, DEFAULT_PAGE), 1);
        assert_eq!(parse_or_default(Some("abc"), DEFAULT_PAGE), 1);
        assert_eq!(parse_or_default(Some(""), DEFAULT_LIMIT), 10);
        assert_eq!(parse_or_default(Some("0"), DEFAULT_PAGE), 1);
        assert_eq!(parse_or_default(Some("-3"), DEFAULT_LIMIT), 10);
        assert_eq!(parse_or_default(Some("2"), DEFAULT_PAGE), 2);
        assert_eq!(parse_or_default(Some("50"), DEFAULT_LIMIT), 50);
    }

    #[test]
    fn test_extreme_pagination_values_stay_in_range() {
        // u64::MAX in both params must neither overflow the skip math
        // nor go negative when limit is narrowed to i64.
        let huge = u64::MAX.to_string();
        let page = parse_or_default(Some(&huge), DEFAULT_PAGE);
        let limit = parse_or_default(Some(&huge), DEFAULT_LIMIT);

        assert_eq!(page, MAX_PAGE_PARAM);
        assert_eq!(limit, MAX_PAGE_PARAM);
        assert!(limit as i64 > 0);

        let skip = (page - 1).saturating_mul(limit);
        assert_eq!(skip, u64::MAX);
    }

    #[test]
    fn test_total_pages_math() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn test_filter_empty_when_no_params() {
        let filter = build_filter(None, None);
        assert!(filter.is_empty());
        // Empty-string params behave like absent ones
        let filter = build_filter(Some(""), Some(""));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_filter_search_matches_name_or_email() {
        let filter = build_filter(Some("ali"), None);
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
        let name_clause = or[0].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(name_clause.get_str("$regex").unwrap(), "ali");
        assert_eq!(name_clause.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_filter_role_is_exact() {
        let filter = build_filter(None, Some("admin"));
        assert_eq!(filter.get_str("role").unwrap(), "admin");
        assert!(filter.get("$or").is_none());
    }

    #[test]
    fn test_filter_combines_search_and_role() {
        let filter = build_filter(Some("bob"), Some("editor"));
        assert!(filter.get_array("$or").is_ok());
        assert_eq!(filter.get_str("role").unwrap(), "editor");
    }

    #[test]
    fn test_regex_escaping() {
        assert_eq!(escape_regex("a.b"), "a\\.b");
        assert_eq!(escape_regex("x+y*z"), "x\\+y\\*z");
        assert_eq!(escape_regex("plain"), "plain");
        assert_eq!(escape_regex("(grp)|[set]"), "\\(grp\\)\\|\\[set\\]");
    }

    #[test]
    fn test_object_id_parsing() {
        assert!(parse_object_id("not-an-id").is_err());
        assert!(parse_object_id("64b0c8a19f1d2c3a4b5e6f70").is_ok());
        assert!(matches!(
            parse_object_id("123"),
            Err(AppError::InvalidId)
        ));
    }
}
