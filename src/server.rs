use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{Role, TokenService};
use crate::config::{AppConfig, QueryConfig};
use crate::handlers::{auth, health, tasks, todos, users};
use crate::middleware::{access_gate, require_role, AccessGate};
use crate::store::Store;

/// Shared, immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub gate: Arc<AccessGate>,
    pub query: QueryConfig,
    pub password_cost: u32,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn Store>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.security));
        let gate = Arc::new(AccessGate::new(
            tokens.clone(),
            &config.security.bypass_paths,
        ));

        Self {
            store,
            tokens,
            gate,
            query: config.query.clone(),
            password_cost: config.security.password_cost,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let gate = state.gate.clone();

    Router::new()
        .merge(public_routes())
        .merge(admin_routes())
        .merge(todo_routes())
        .merge(task_routes())
        .layer(from_fn_with_state(gate, access_gate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/user/signUp", post(users::sign_up))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(users::list_users))
        .route("/user/:id", delete(users::delete_user))
        .route_layer(from_fn_with_state(Role::Admin, require_role))
}

fn todo_routes() -> Router<AppState> {
    Router::new()
        // POST takes the owning user id; the other methods take the todo id
        .route(
            "/todo/:id",
            post(todos::create)
                .get(todos::get)
                .patch(todos::update)
                .delete(todos::delete),
        )
        .route(
            "/todo/findAllNotCompleted/:id",
            get(todos::find_not_completed),
        )
        .route("/todo/findAllCompleted/:id", get(todos::find_completed))
}

fn task_routes() -> Router<AppState> {
    Router::new()
        // POST and GET take the todo id; PATCH and DELETE take the task id
        .route(
            "/task/:id",
            post(tasks::create)
                .get(tasks::list)
                .patch(tasks::update)
                .delete(tasks::delete),
        )
        .route("/task/item/:id", get(tasks::get))
}
