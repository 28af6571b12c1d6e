//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every users and health endpoint together with the
//! request and response shapes they exchange. The generated document is
//! served by Swagger UI in debug builds and exported by the `openapi-dump`
//! binary.

use utoipa::OpenApi;
use utoipa::openapi::server::Server;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::users_dto::{
    CreateUserRequest, MessageResponse, PageMetaDto, UpdateUserRequest, UserDto, UserEnvelope,
    UserPageEnvelope,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User service API",
        description = "Create, list, update, and delete user records.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::bulk_delete_users,
        crate::inbound::http::health::health_check,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        UserDto,
        CreateUserRequest,
        UpdateUserRequest,
        UserEnvelope,
        UserPageEnvelope,
        PageMetaDto,
        MessageResponse,
        Error,
        ErrorCode
    )),
    tags(
        (name = "users", description = "Operations related to users"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the document with its server entry set to `root_path`, the
    /// API Gateway stage prefix the service is deployed under.
    #[must_use]
    pub fn for_root_path(root_path: &str) -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        doc.servers = Some(vec![Server::new(root_path)]);
        doc
    }
}
