//! HTTP surface of the panel.
//!
//! Routes (all under `/{prefix}`):
//! - `POST authenticate`, `POST logout`            - session handling, unprotected
//! - `GET  status|current-branch|branches|log|diff|stash/list|tags|user|info`
//! - `POST add|commit|push|pull|fetch|checkout|merge|branch/create|stash|stash/pop`
//! - `POST reset|full-push|custom|artisan|user/config|tag/create|push-tags`
//! - `DELETE branch/delete|tag/delete`

use crate::api::requests::{
    AddRequest, ApiRequest, AuthenticateRequest, CheckoutRequest, CommandRequest, CommitRequest,
    CreateBranchRequest, DeleteBranchRequest, DiffRequest, FullPushRequest, LogRequest,
    MergeRequest, MessageRequest, RemoteBranchRequest, RemoteRequest, ResetRequest, TagRequest,
    UserConfigRequest, parse,
};
use crate::api::{ApiResponse, Controller};
use crate::audit::AuditLogger;
use crate::auth::{AuthSession, SESSION_COOKIE, SessionCodec, now_epoch, verify_password};
use crate::config::Settings;
use crate::console::AppConsole;
use crate::error::{AppResult, GitError};
use crate::git::{BinaryResolver, GitManager, ProcessRunner, RepositoryContext};
use axum::{
    Router,
    body::Bytes,
    extract::{Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runner shared by every request
pub type SharedRunner = Arc<dyn ProcessRunner>;

/// Shared, read-only server state
pub struct AppState {
    pub settings: Arc<Settings>,
    pub runner: SharedRunner,
    pub sessions: SessionCodec,
    pub audit: Option<Arc<AuditLogger>>,
}

impl AppState {
    /// Set up session signing and open the audit log, if configured
    pub fn new(settings: Settings, runner: SharedRunner) -> AppResult<Self> {
        let sessions = match settings.session_secret.as_deref() {
            Some(secret) => SessionCodec::new(secret.as_bytes())?,
            None => SessionCodec::random(),
        };

        let audit = match &settings.audit_log {
            Some(path) => Some(Arc::new(AuditLogger::with_path(path)?)),
            None => None,
        };

        Ok(Self {
            settings: Arc::new(settings),
            runner,
            sessions,
            audit,
        })
    }

    /// Build the per-request facade, resolving the git binary afresh. Fails
    /// only when the repository path is unusable.
    fn controller(&self) -> Result<Controller<SharedRunner>, GitError> {
        let settings = &self.settings;
        let binary = BinaryResolver::git().resolve(&self.runner);
        debug!(binary = %binary, "resolved git binary");

        let ctx = RepositoryContext::new(&settings.repository_path, binary)
            .with_credentials(settings.credentials())
            .with_timeout(settings.timeout());

        let git = GitManager::new(ctx, self.runner.clone(), &settings.fallback_identity())?
            .with_audit(self.audit.clone());
        let console = AppConsole::new(&settings.app_command, &settings.repository_path)
            .with_timeout(settings.timeout());

        Ok(Controller::new(git, console, settings.default_remote.as_str()))
    }

    fn session_cookie(&self, token: &str, max_age: u64) -> String {
        format!(
            "{}={}; Path={}; HttpOnly; SameSite=Strict; Max-Age={}",
            SESSION_COOKIE,
            token,
            cookie_path(&self.settings.route_prefix),
            max_age
        )
    }
}

fn cookie_path(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", prefix)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self.body)).into_response()
    }
}

/// Build the axum [`Router`] with all routes and shared state
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(banner))
        .route("/status", get(status))
        .route("/current-branch", get(current_branch))
        .route("/branches", get(branches))
        .route("/log", get(log))
        .route("/diff", get(diff))
        .route("/add", post(add))
        .route("/commit", post(commit))
        .route("/push", post(push))
        .route("/pull", post(pull))
        .route("/fetch", post(fetch))
        .route("/checkout", post(checkout))
        .route("/merge", post(merge))
        .route("/branch/create", post(create_branch))
        .route("/branch/delete", delete(delete_branch))
        .route("/stash", post(stash))
        .route("/stash/pop", post(stash_pop))
        .route("/stash/list", get(stash_list))
        .route("/reset", post(reset))
        .route("/full-push", post(full_push))
        .route("/custom", post(custom))
        .route("/artisan", post(artisan))
        .route("/user/config", post(config_user))
        .route("/user", get(git_user))
        .route("/info", get(repository_info))
        .route("/tags", get(tags))
        .route("/tag/create", post(create_tag))
        .route("/tag/delete", delete(delete_tag))
        .route("/push-tags", post(push_tags))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let routes = Router::new()
        .route("/authenticate", post(authenticate))
        .route("/logout", post(logout))
        .merge(protected)
        .with_state(state.clone());

    if state.settings.route_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&format!("/{}", state.settings.route_prefix), routes)
    }
}

/// Serve until the process is stopped
pub async fn serve(state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&state.settings.listen_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        prefix = %cookie_path(&state.settings.route_prefix),
        repository = %state.settings.repository_path.display(),
        "git panel listening"
    );

    axum::serve(listener, create_router(state)).await
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

fn setup_required() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        axum::Json(json!({
            "success": false,
            "setup_required": true,
            "message": "No access password is configured. Run the setup command first.",
        })),
    )
        .into_response()
}

fn session_from_headers(state: &AppState, headers: &HeaderMap) -> AuthSession {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| state.sessions.decode(token))
        .unwrap_or_default()
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!(error = %e, "invalid session cookie header"),
    }
    response
}

async fn require_auth(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if !state.settings.has_access_password() {
        return setup_required();
    }

    let session = session_from_headers(&state, request.headers());
    if session.is_active(now_epoch(), state.settings.session_duration_minutes) {
        return next.run(request).await;
    }

    let message = if session.authenticated {
        "Session expired"
    } else {
        "Authentication required"
    };
    let response = ApiResponse {
        status: 401,
        body: json!({ "success": false, "authenticated": false, "message": message }),
    }
    .into_response();

    if session.authenticated {
        with_cookie(response, &state.session_cookie("", 0))
    } else {
        response
    }
}

async fn authenticate(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    if !state.settings.has_access_password() {
        return setup_required();
    }

    let password = match parse_body::<AuthenticateRequest>(&body) {
        Ok(password) => password,
        Err(response) => return response,
    };

    match verify_password(&password, &state.settings.access_password) {
        Ok(true) => {}
        Ok(false) => {
            warn!("rejected panel login attempt");
            return ApiResponse::error(401, "Invalid password").into_response();
        }
        Err(e) => {
            error!(error = %e, "stored access password hash is unusable");
            return ApiResponse::error(500, "Stored access password is malformed. Re-run setup.").into_response();
        }
    }

    let session = AuthSession::started_at(now_epoch());
    let token = match state.sessions.encode(&session) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "failed to sign session");
            return ApiResponse::error(500, e.to_string()).into_response();
        }
    };

    info!("panel session started");
    let minutes = state.settings.session_duration_minutes;
    let response = ApiResponse::ok(json!({
        "success": true,
        "message": "Authenticated successfully",
        "expires_at": session.expires_at(minutes),
    }))
    .into_response();

    with_cookie(response, &state.session_cookie(&token, minutes.saturating_mul(60)))
}

async fn logout(State(state): State<Arc<AppState>>) -> Response {
    info!("panel session ended");
    let response = ApiResponse::ok(json!({ "success": true, "message": "Logged out" })).into_response();
    with_cookie(response, &state.session_cookie("", 0))
}

// ---------------------------------------------------------------------------
// Dispatch helpers
// ---------------------------------------------------------------------------

/// Validate a JSON body; failures become the 422 response
fn parse_body<T: ApiRequest>(body: &Bytes) -> Result<T::Valid, Response> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(e) => {
                let errors = crate::api::ValidationErrors::single("request", format!("Malformed JSON body: {}", e));
                return Err(ApiResponse::validation(&errors).into_response());
            }
        }
    };

    parse::<T>(value).map_err(|errors| ApiResponse::validation(&errors).into_response())
}

fn parse_query<T: ApiRequest>(query: HashMap<String, String>) -> Result<T::Valid, Response> {
    let value = Value::Object(query.into_iter().map(|(k, v)| (k, Value::String(v))).collect());
    parse::<T>(value).map_err(|errors| ApiResponse::validation(&errors).into_response())
}

/// Run one controller call on the blocking pool
async fn dispatch<F>(state: Arc<AppState>, op: F) -> Response
where
    F: FnOnce(&Controller<SharedRunner>) -> ApiResponse + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || state.controller().map(|controller| op(&controller)));

    let failure = match task.await {
        Ok(Ok(response)) => return response.into_response(),
        Ok(Err(e)) => e,
        Err(e) => GitError::TaskFailed(e.to_string()),
    };

    error!(error = %failure, "request failed");
    ApiResponse::error(500, failure.to_string()).into_response()
}

async fn with_body<T, F>(state: Arc<AppState>, body: Bytes, op: F) -> Response
where
    T: ApiRequest,
    T::Valid: Send + 'static,
    F: FnOnce(&Controller<SharedRunner>, T::Valid) -> ApiResponse + Send + 'static,
{
    match parse_body::<T>(&body) {
        Ok(params) => dispatch(state, move |controller| op(controller, params)).await,
        Err(response) => response,
    }
}

async fn with_query<T, F>(state: Arc<AppState>, query: HashMap<String, String>, op: F) -> Response
where
    T: ApiRequest,
    T::Valid: Send + 'static,
    F: FnOnce(&Controller<SharedRunner>, T::Valid) -> ApiResponse + Send + 'static,
{
    match parse_query::<T>(query) {
        Ok(params) => dispatch(state, move |controller| op(controller, params)).await,
        Err(response) => response,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

type AppStateExt = State<Arc<AppState>>;
type QueryMap = Query<HashMap<String, String>>;

async fn banner(State(state): AppStateExt) -> Response {
    ApiResponse::ok(json!({
        "success": true,
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "repository": state.settings.repository_path.display().to_string(),
    }))
    .into_response()
}

async fn status(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.status()).await
}

async fn current_branch(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.current_branch()).await
}

async fn branches(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.branches()).await
}

async fn log(State(state): AppStateExt, Query(query): QueryMap) -> Response {
    with_query::<LogRequest, _>(state, query, |c, limit| c.log(limit)).await
}

async fn diff(State(state): AppStateExt, Query(query): QueryMap) -> Response {
    with_query::<DiffRequest, _>(state, query, |c, p| c.diff(p)).await
}

async fn add(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<AddRequest, _>(state, body, |c, p| c.add(p)).await
}

async fn commit(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<CommitRequest, _>(state, body, |c, p| c.commit(p)).await
}

async fn push(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<RemoteBranchRequest, _>(state, body, |c, p| c.push(p)).await
}

async fn pull(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<RemoteBranchRequest, _>(state, body, |c, p| c.pull(p)).await
}

async fn fetch(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<RemoteRequest, _>(state, body, |c, p| c.fetch(p)).await
}

async fn checkout(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<CheckoutRequest, _>(state, body, |c, p| c.checkout(p)).await
}

async fn merge(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<MergeRequest, _>(state, body, |c, p| c.merge(p)).await
}

async fn create_branch(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<CreateBranchRequest, _>(state, body, |c, p| c.create_branch(p)).await
}

async fn delete_branch(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<DeleteBranchRequest, _>(state, body, |c, p| c.delete_branch(p)).await
}

async fn stash(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<MessageRequest, _>(state, body, |c, p| c.stash(p)).await
}

async fn stash_pop(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.stash_pop()).await
}

async fn stash_list(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.stash_list()).await
}

async fn reset(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<ResetRequest, _>(state, body, |c, p| c.reset(p)).await
}

async fn full_push(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<FullPushRequest, _>(state, body, |c, p| c.full_push(p)).await
}

async fn custom(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<CommandRequest, _>(state, body, |c, p| c.execute_custom(p)).await
}

async fn artisan(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<CommandRequest, _>(state, body, |c, p| c.run_app_command(p)).await
}

async fn config_user(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<UserConfigRequest, _>(state, body, |c, p| c.config_user(p)).await
}

async fn git_user(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.git_user()).await
}

async fn repository_info(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.info()).await
}

async fn tags(State(state): AppStateExt) -> Response {
    dispatch(state, |c| c.tags()).await
}

async fn create_tag(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<TagRequest, _>(state, body, |c, p| c.create_tag(p)).await
}

async fn delete_tag(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<TagRequest, _>(state, body, |c, p| c.delete_tag(p)).await
}

async fn push_tags(State(state): AppStateExt, body: Bytes) -> Response {
    with_body::<RemoteRequest, _>(state, body, |c, p| c.push_tags(p)).await
}
