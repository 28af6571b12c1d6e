//! Tests for users API handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{TimeZone, Utc};
use mockable::DefaultClock;
use pagination::Paginated;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{MockUsersCommand, MockUsersQuery};
use crate::domain::{EmailAddress, User, UserId, UserService, Username, UsernamePolicy};
use crate::inbound::http::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::outbound::memory::InMemoryUserRepository;

fn app_with_state(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/api")
                .service(list_users)
                .service(get_user)
                .service(create_user)
                .service(update_user)
                .service(bulk_delete_users)
                .service(delete_user),
        )
}

fn memory_state() -> HttpState {
    let service = Arc::new(UserService::new(
        Arc::new(InMemoryUserRepository::default()),
        Arc::new(DefaultClock),
    ));
    HttpState::new(service.clone(), service)
}

fn mock_state(query: MockUsersQuery, command: MockUsersCommand) -> HttpState {
    HttpState::new(Arc::new(query), Arc::new(command))
}

fn sample_user(id: i64) -> User {
    let at = Utc
        .with_ymd_and_hms(2024, 3, 9, 8, 5, 1)
        .single()
        .expect("valid timestamp");
    User::new(
        UserId::new(id).expect("valid id"),
        Username::new("ada", UsernamePolicy::Create).expect("valid username"),
        EmailAddress::new("ada@example.com").expect("valid email"),
        at,
        at,
    )
}

fn create_body(username: &str, email: &str) -> Value {
    json!({ "username": username, "email": email, "password": "hunter22" })
}

async fn read_json(response: actix_web::dev::ServiceResponse) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}

#[actix_web::test]
async fn create_then_fetch_round_trip() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;

    let created = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/users")
            .set_json(create_body("ada", "ada@example.com"))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = read_json(created).await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["email"], "ada@example.com");
    assert!(created.get("password").is_none());

    let fetched = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/users/1").to_request(),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched = read_json(fetched).await;
    assert_eq!(fetched["status_code"], 200);
    assert_eq!(fetched["data"]["username"], "ada");
}

#[actix_web::test]
async fn duplicate_email_conflicts() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/users")
                .set_json(create_body("ada", "ada@example.com"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
}

#[rstest]
#[case(create_body("ab", "ab@example.com"), "username", "too_short")]
#[case(create_body("ada", "not-an-email"), "email", "invalid_format")]
#[case(json!({ "username": "ada", "email": "ada@example.com", "password": "" }), "password", "required")]
#[actix_web::test]
async fn create_rejects_invalid_fields(
    #[case] body: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/users")
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let value = read_json(res).await;
    assert_eq!(value["code"], "validation_failed");
    assert_eq!(value["details"]["field"], field);
    assert_eq!(value["details"]["code"], code);
}

#[actix_web::test]
async fn create_rejects_missing_fields() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/users")
            .set_json(json!({ "username": "ada" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn update_applies_partial_changes() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/users")
            .set_json(create_body("ada", "ada@example.com"))
            .to_request(),
    )
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/users/1")
            .set_json(json!({ "email": "lovelace@example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let value = read_json(res).await;
    assert_eq!(value["data"]["email"], "lovelace@example.com");
    assert_eq!(value["data"]["username"], "ada");
}

#[actix_web::test]
async fn update_enforces_shorter_username_limit() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/users/1")
            .set_json(json!({ "username": "a".repeat(21) }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let value = read_json(res).await;
    assert_eq!(value["details"]["code"], "too_long");
}

#[rstest]
#[case("/api/users/abc")]
#[case("/api/users/0")]
#[case("/api/users/-4")]
#[actix_web::test]
async fn malformed_ids_fail_validation(#[case] uri: &str) {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    let res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let value = read_json(res).await;
    assert_eq!(value["details"]["code"], "invalid_id");
}

#[actix_web::test]
async fn missing_user_is_not_found() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri("/api/users/99")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let value = read_json(res).await;
    assert_eq!(value["message"], "User with ID 99 not found");
}

#[actix_web::test]
async fn bulk_delete_reports_removed_ids() {
    let mut command = MockUsersCommand::new();
    command
        .expect_bulk_delete_users()
        .withf(|ids| ids.iter().map(|id| id.get()).collect::<Vec<_>>() == vec![3, 1, 2])
        .times(1)
        .return_once(|_| {
            Ok(vec![
                UserId::new(1).expect("valid id"),
                UserId::new(2).expect("valid id"),
            ])
        });
    let app = actix_test::init_service(app_with_state(mock_state(
        MockUsersQuery::new(),
        command,
    )))
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri("/api/users/3,1,2/bulk")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let value = read_json(res).await;
    assert_eq!(
        value,
        json!({ "message": "Deleted users with IDs: [1, 2]" })
    );
}

#[rstest]
#[case("/api/users/1,x/bulk")]
#[case("/api/users/1,-2/bulk")]
#[case("/api/users/,/bulk")]
#[actix_web::test]
async fn bulk_delete_rejects_malformed_lists(#[case] uri: &str) {
    let mut command = MockUsersCommand::new();
    command.expect_bulk_delete_users().never();
    let app = actix_test::init_service(app_with_state(mock_state(
        MockUsersQuery::new(),
        command,
    )))
    .await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete().uri(uri).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn list_passes_parsed_request_to_port() {
    let mut query = MockUsersQuery::new();
    query
        .expect_list_users()
        .withf(|request| {
            request.page.page() == 2
                && request.page.per_page() == 5
                && request.sort_by.to_string() == "email"
                && request.sort_type.to_string() == "desc"
        })
        .times(1)
        .return_once(|request| {
            Ok(Paginated::new(vec![sample_user(6)], request.page, 6))
        });
    let app = actix_test::init_service(app_with_state(mock_state(
        query,
        MockUsersCommand::new(),
    )))
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/users?page=2&items_per_page=5&sort_by=email&sort_type=desc")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let value = read_json(res).await;
    assert_eq!(value["status_code"], 200);
    assert_eq!(value["meta"]["current_page"], 2);
    assert_eq!(value["meta"]["last_page"], 2);
    assert_eq!(value["meta"]["first_item"], 6);
    assert_eq!(value["data"][0]["created_at"], "2024-03-09 08:05:01");
}

#[actix_web::test]
async fn empty_listing_reports_not_found_in_body() {
    let app = actix_test::init_service(app_with_state(memory_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/users").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let value = read_json(res).await;
    assert_eq!(value["status_code"], 404);
    assert_eq!(value["data"], json!([]));
    assert_eq!(value["meta"]["total"], 0);
}

#[rstest]
#[case("/api/users?sort_by=password", StatusCode::BAD_REQUEST)]
#[case("/api/users?sort_type=up", StatusCode::BAD_REQUEST)]
#[case(
    "/api/users?start_date=2024-02-01&end_date=2024-01-01",
    StatusCode::BAD_REQUEST
)]
#[case("/api/users?page=0", StatusCode::UNPROCESSABLE_ENTITY)]
#[case("/api/users?items_per_page=0", StatusCode::UNPROCESSABLE_ENTITY)]
#[case("/api/users?page=abc", StatusCode::UNPROCESSABLE_ENTITY)]
#[actix_web::test]
async fn list_rejects_bad_parameters(#[case] uri: &str, #[case] expected: StatusCode) {
    let mut query = MockUsersQuery::new();
    query.expect_list_users().never();
    let app = actix_test::init_service(app_with_state(mock_state(
        query,
        MockUsersCommand::new(),
    )))
    .await;
    let res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), expected);
}

#[actix_web::test]
async fn unavailable_repository_maps_to_service_unavailable() {
    let mut query = MockUsersQuery::new();
    query
        .expect_find_user()
        .times(1)
        .return_once(|_| Err(Error::service_unavailable("user repository unavailable")));
    let app = actix_test::init_service(app_with_state(mock_state(
        query,
        MockUsersCommand::new(),
    )))
    .await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/users/5").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}
