use actix_web::{delete, error, get, post, put, web, HttpResponse};
use serde_json::json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::errors::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    LoginRequest, RegisterRequest, RegisterResponse, TodoItem, TodoItemRequest, TokenResponse,
    UserProfile,
};
use crate::service;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Username or email already registered")
    )
)]
#[post("/register")]
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let state = state.into_inner();
    let req = req.into_inner();
    // bcrypt is deliberately slow; keep it off the async workers.
    let id = web::block(move || service::register(&state, &req)).await??;
    Ok(HttpResponse::Created().json(RegisterResponse { id }))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User logged in successfully", body = TokenResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Invalid email or password")
    )
)]
#[post("/login")]
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let state = state.into_inner();
    let req = req.into_inner();
    let issued = web::block(move || service::login(&state, &req)).await??;
    Ok(HttpResponse::Ok().json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = UserProfile),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
#[get("/me")]
async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let profile = service::profile(&state, user)?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/todos",
    responses(
        (status = 200, description = "Todos owned by the caller", body = [TodoItem]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = []))
)]
#[get("/todos")]
async fn get_todos(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let todos = service::list_todos(&state, user)?;
    Ok(HttpResponse::Ok().json(todos))
}

#[utoipa::path(
    post,
    path = "/todos",
    request_body = TodoItemRequest,
    responses(
        (status = 201, description = "Todo added successfully", body = TodoItem),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
#[post("/todos")]
async fn create_todo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<TodoItemRequest>,
) -> Result<HttpResponse, ApiError> {
    let item = service::create_todo(&state, user, &req)?;
    Ok(HttpResponse::Created().json(item))
}

#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(
        ("id" = String, Path, description = "Unique identifier of the todo item")
    ),
    responses(
        (status = 200, description = "Todo item retrieved successfully", body = TodoItem),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Todo item belongs to another user"),
        (status = 404, description = "Todo item not found")
    ),
    security(("bearer_auth" = []))
)]
#[get("/todos/{id}")]
async fn get_todo_by_id(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    todo_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let item = service::get_todo(&state, user, &todo_id)?;
    Ok(HttpResponse::Ok().json(item))
}

#[utoipa::path(
    put,
    path = "/todos/{id}",
    request_body = TodoItemRequest,
    params(
        ("id" = String, Path, description = "Unique identifier of the todo item")
    ),
    responses(
        (status = 200, description = "Todo item updated successfully", body = TodoItem),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Todo item belongs to another user"),
        (status = 404, description = "Todo item not found")
    ),
    security(("bearer_auth" = []))
)]
#[put("/todos/{id}")]
async fn update_todo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    todo_id: web::Path<String>,
    update_data: web::Json<TodoItemRequest>,
) -> Result<HttpResponse, ApiError> {
    let item = service::update_todo(&state, user, &todo_id, &update_data)?;
    Ok(HttpResponse::Ok().json(item))
}

#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(
        ("id" = String, Path, description = "Unique identifier of the todo item")
    ),
    responses(
        (status = 204, description = "Todo item deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Todo item belongs to another user"),
        (status = 404, description = "Todo item not found")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/todos/{id}")]
async fn delete_todo(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    todo_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    service::delete_todo(&state, user, &todo_id)?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Register every route plus a JSON extractor config that reports body
/// errors in the API's error shape.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("rejected request body: {}", err);
        error::Error::from(ApiError::invalid("body"))
    }))
    .service(health)
    .service(register)
    .service(login)
    .service(me)
    .service(get_todos)
    .service(create_todo)
    .service(get_todo_by_id)
    .service(update_todo)
    .service(delete_todo);
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        me,
        get_todos,
        create_todo,
        get_todo_by_id,
        update_todo,
        delete_todo
    ),
    components(schemas(
        TodoItem,
        TodoItemRequest,
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        TokenResponse,
        UserProfile
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
