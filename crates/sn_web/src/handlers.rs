use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sn_core::{auth, ApiResponse, Error, StockNews, StockStorage, User, UserStorage};
use tracing::{error, info};

use crate::session::{expired_cookie, session_cookie, token_from_headers};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddStocksRequest {
    #[serde(rename = "stockIds", default)]
    pub stock_ids: Vec<i64>,
}

fn envelope<T: Serialize>(http: StatusCode, status: u16, error: bool, message: T) -> Response {
    (http, Json(ApiResponse::new(status, error, message))).into_response()
}

fn internal_error(context: &str, e: &Error) -> Response {
    error!(error = %e, "{}", context);
    envelope(StatusCode::INTERNAL_SERVER_ERROR, 500, true, format!("An error occurred while {}", context))
}

fn sign_in_required() -> Response {
    envelope(StatusCode::OK, 403, true, "Sign In required")
}

/// Resolves the session cookie to a user, or the response to send instead.
async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, Response> {
    let Some(token) = token_from_headers(headers) else {
        return Err(sign_in_required());
    };
    let Some(email) = state.sessions.email(&token).await else {
        return Err(sign_in_required());
    };
    match state.storage.get_user(&email).await {
        Ok(Some(record)) => Ok(record.user),
        Ok(None) => {
            state.sessions.remove(&token).await;
            Err(sign_in_required())
        }
        Err(e) => Err(internal_error("loading the session user", &e)),
    }
}

async fn start_session(state: &AppState, user: &User, http: StatusCode, status: u16, message: &str) -> Response {
    let token = state.sessions.create(&user.email).await;
    (
        http,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(ApiResponse::new(status, false, message)),
    )
        .into_response()
}

pub async fn root() -> &'static str {
    "HELLO"
}

pub async fn signup(State(state): State<AppState>, Json(form): Json<SignupRequest>) -> Response {
    match auth::signup(state.storage.as_ref(), &form.name, &form.email, &form.password).await {
        Ok(user) => {
            info!(email = %user.email, "User signed up");
            start_session(
                &state,
                &user,
                StatusCode::CREATED,
                201,
                "User created and logged in successfully",
            )
            .await
        }
        Err(Error::Validation(message)) | Err(Error::Conflict(message)) => {
            envelope(StatusCode::OK, 403, true, message)
        }
        Err(e) => internal_error("signing up", &e),
    }
}

pub async fn login(State(state): State<AppState>, Json(form): Json<LoginRequest>) -> Response {
    match auth::login(state.storage.as_ref(), &form.email, &form.password).await {
        Ok(user) => start_session(&state, &user, StatusCode::OK, 200, "Logged in successfully").await,
        Err(Error::Unauthorized(_)) => envelope(StatusCode::OK, 401, true, "Username or password incorrect!"),
        Err(e) => internal_error("logging in", &e),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.remove(&token).await;
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired_cookie())],
        Json(ApiResponse::ok("Logged out successfully")),
    )
        .into_response()
}

pub async fn all_stocks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user(&state, &headers).await {
        return response;
    }
    match state.storage.all_stocks().await {
        Ok(stocks) => envelope(StatusCode::OK, 200, false, stocks),
        Err(e) => internal_error("fetching stocks", &e),
    }
}

pub async fn add_stocks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddStocksRequest>,
) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.storage.add_user_stocks(&user.email, &request.stock_ids).await {
        Ok(()) => envelope(StatusCode::OK, 200, false, "Stocks added successfully"),
        Err(Error::NotFound(message)) => envelope(StatusCode::BAD_REQUEST, 400, true, message),
        Err(e) => internal_error("adding stocks", &e),
    }
}

/// News for every stock on the caller's watchlist, one crawl per stock.
pub async fn stocks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_user(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let names = match state.storage.user_stocks(&user.email).await {
        Ok(names) => names,
        Err(Error::NotFound(message)) => return envelope(StatusCode::BAD_REQUEST, 400, true, message),
        Err(e) => return internal_error("fetching stocks", &e),
    };

    let mut response = Vec::with_capacity(names.len());
    for stock in names {
        info!(%stock, "Collecting news");
        let news = state.crawler.news(&stock).await;
        response.push(StockNews { stock, news });
    }
    envelope(StatusCode::OK, 200, false, response)
}
