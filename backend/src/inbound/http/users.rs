//! Users API handlers.
//!
//! ```text
//! GET    /api/users?page=1&items_per_page=10&sort_by=email&sort_type=desc
//! GET    /api/users/{id}
//! POST   /api/users {"username":"ada","email":"ada@example.com","password":"secret"}
//! PUT    /api/users/{id} {"email":"lovelace@example.com"}
//! DELETE /api/users/{id}
//! DELETE /api/users/1,2,3/bulk
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use tracing::debug;

use crate::domain::{Error, ListUsersRequest, NewUser, UserChanges};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users_dto::{
    CreateUserRequest, ListUsersQuery, MessageResponse, UpdateUserRequest, UserDto, UserEnvelope,
    UserPageEnvelope,
};
use crate::inbound::http::validation::{
    FieldName, parse_bulk_ids, parse_user_id, user_field_error,
};

/// List users one page at a time.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use user_service::inbound::http::users::list_users;
///
/// let app = App::new().service(list_users);
/// ```
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = UserPageEnvelope),
        (status = 400, description = "Invalid sort or filter", body = Error),
        (status = 422, description = "Invalid page parameters", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<UserPageEnvelope>> {
    let request = ListUsersRequest::try_from(query.into_inner())?;
    debug!(
        page = request.page.page(),
        per_page = request.page.per_page(),
        sort_by = %request.sort_by,
        sort_type = %request.sort_type,
        "listing users"
    );
    let page = state.users_query.list_users(request).await?;
    Ok(web::Json(UserPageEnvelope::from(page)))
}

/// Fetch one user.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserEnvelope),
        (status = 404, description = "Unknown user", body = Error),
        (status = 422, description = "Malformed identifier", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let id = parse_user_id(&path, FieldName::new("id"))?;
    let user = state.users_query.find_user(id).await?;
    Ok(web::Json(UserEnvelope::ok(&user)))
}

/// Register a user. Responds 201 with the stored record.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 409, description = "Email already registered", body = Error),
        (status = 422, description = "Invalid field", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let new_user =
        NewUser::try_from(payload.into_inner()).map_err(|err| user_field_error(&err))?;
    let user = state.users_command.create_user(new_user).await?;
    Ok(HttpResponse::Created().json(UserDto::from(&user)))
}

/// Change a user's username, email, or password.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 404, description = "Unknown user", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 422, description = "Invalid field", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let id = parse_user_id(&path, FieldName::new("id"))?;
    let changes =
        UserChanges::try_from(payload.into_inner()).map_err(|err| user_field_error(&err))?;
    let user = state.users_command.update_user(id, changes).await?;
    Ok(web::Json(UserEnvelope::ok(&user)))
}

/// Delete a user and return the removed record.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User deleted", body = UserEnvelope),
        (status = 404, description = "Unknown user", body = Error),
        (status = 422, description = "Malformed identifier", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let id = parse_user_id(&path, FieldName::new("id"))?;
    let user = state.users_command.delete_user(id).await?;
    Ok(web::Json(UserEnvelope::ok(&user)))
}

/// Delete several users given as a comma-separated id list.
#[utoipa::path(
    delete,
    path = "/api/users/{ids}/bulk",
    params(("ids" = String, Path, description = "Comma-separated user identifiers", example = "1,2,3")),
    responses(
        (status = 200, description = "Users deleted", body = MessageResponse),
        (status = 400, description = "Malformed identifier list", body = Error),
        (status = 404, description = "No listed user exists", body = Error)
    ),
    tags = ["users"],
    operation_id = "bulkDeleteUsers"
)]
#[delete("/users/{ids}/bulk")]
pub async fn bulk_delete_users(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let ids = parse_bulk_ids(&path)?;
    let deleted = state.users_command.bulk_delete_users(ids).await?;
    let raw: Vec<i64> = deleted.iter().map(|id| id.get()).collect();
    Ok(web::Json(MessageResponse {
        message: format!("Deleted users with IDs: {raw:?}"),
        status_code: None,
    }))
}

#[cfg(test)]
mod tests;
