// Path: crates/http-gateway/src/routes.rs

//! Request handlers. Each one unpacks its input, calls exactly one service
//! operation and shapes the JSON response.

use crate::{AppError, AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Json,
};
use flora_services::parameters::{DELETED_MESSAGE, UPDATED_MESSAGE};
use flora_services::pipeline::{LOADED_MESSAGE, PROCESSED_MESSAGE, SPLIT_MESSAGE};
use flora_types::error::ServiceError;
use flora_types::identity::NewUser;
use flora_types::parameters::ParameterMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

type JsonResult = Result<Json<Value>, AppError>;

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn to_value<T: Serialize>(body: T) -> JsonResult {
    serde_json::to_value(body)
        .map(Json)
        .map_err(|e| AppError(ServiceError::Internal(e.to_string())))
}

/// Attaches `message` to the fields of a serializable body.
#[derive(Serialize)]
struct WithMessage<T> {
    message: &'static str,
    #[serde(flatten)]
    body: T,
}

pub(crate) async fn hello(Path(name): Path<String>) -> Json<Value> {
    Json(json!({ "message": format!("Hello {name}, from fastapi test route ! BANG !") }))
}

// --- Auth ---

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct MakeAdminRequest {
    uid: String,
}

pub(crate) async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(user) = payload?;
    let registered = state.auth.register(user).await?;
    Ok((StatusCode::CREATED, to_value(registered)?))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> JsonResult {
    let Json(req) = payload?;
    to_value(state.auth.login(&req.email, &req.password).await?)
}

pub(crate) async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> JsonResult {
    state.auth.authorize_admin(authorization(&headers)).await?;
    let users = state.auth.list_users().await?;
    Ok(Json(json!({ "users": users })))
}

pub(crate) async fn make_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<MakeAdminRequest>, JsonRejection>,
) -> JsonResult {
    let caller = state.auth.authorize_admin(authorization(&headers)).await?;
    let Json(req) = payload?;
    let message = state.auth.make_admin(&req.uid).await?;
    tracing::info!(target: "gateway", by = %caller.uid, uid = %req.uid, "admin granted");
    Ok(Json(json!({ "message": message })))
}

// --- Parameters ---

pub(crate) async fn retrieve_parameters(State(state): State<AppState>) -> JsonResult {
    let parameters = state.parameters.retrieve().await?;
    Ok(Json(json!({ "parameters": parameters })))
}

pub(crate) async fn add_parameters(
    State(state): State<AppState>,
    payload: Result<Json<ParameterMap>, JsonRejection>,
) -> JsonResult {
    let Json(incoming) = payload?;
    let (outcome, parameters) = state.parameters.add(incoming).await?;
    Ok(Json(
        json!({ "message": outcome.message(), "parameters": parameters }),
    ))
}

pub(crate) async fn update_parameters(
    State(state): State<AppState>,
    payload: Result<Json<ParameterMap>, JsonRejection>,
) -> JsonResult {
    let Json(incoming) = payload?;
    let parameters = state.parameters.update(incoming).await?;
    Ok(Json(
        json!({ "message": UPDATED_MESSAGE, "parameters": parameters }),
    ))
}

pub(crate) async fn delete_parameters(
    State(state): State<AppState>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> JsonResult {
    let Json(keys) = payload?;
    let result = state.parameters.delete_keys(keys).await?;
    Ok(Json(json!({
        "message": DELETED_MESSAGE,
        "deleted_parameters": result.deleted,
        "remaining_parameters": result.remaining,
    })))
}

// --- Iris pipeline ---

#[derive(Deserialize)]
pub(crate) struct SplitQuery {
    test_size: Option<f64>,
    random_state: Option<u64>,
}

#[derive(Deserialize)]
pub(crate) struct PredictRequest {
    features: Vec<f64>,
}

pub(crate) async fn load_iris(State(state): State<AppState>) -> JsonResult {
    let data = state.pipeline.load().await?;
    Ok(Json(json!({ "message": LOADED_MESSAGE, "data": data })))
}

pub(crate) async fn process_iris(State(state): State<AppState>) -> JsonResult {
    let processed = state.pipeline.process().await?;
    to_value(WithMessage {
        message: PROCESSED_MESSAGE,
        body: processed,
    })
}

pub(crate) async fn split_iris(
    State(state): State<AppState>,
    query: Result<Query<SplitQuery>, QueryRejection>,
) -> JsonResult {
    let Query(q) = query?;
    let split = state.pipeline.split(q.test_size, q.random_state).await?;
    to_value(WithMessage {
        message: SPLIT_MESSAGE,
        body: split,
    })
}

pub(crate) async fn train_iris(State(state): State<AppState>) -> JsonResult {
    to_value(state.pipeline.train().await?)
}

pub(crate) async fn predict_iris(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> JsonResult {
    let Json(req) = payload?;
    let prediction = state.pipeline.predict(req.features).await?;
    Ok(Json(json!({ "prediction": prediction })))
}
