use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Cars whose model year is more than this many years old are returned by
/// `/findByModel`.
pub const AGE_THRESHOLD_YEARS: i32 = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub registration: String,
    #[serde(default)]
    pub owner: String,
}

#[derive(Deserialize)]
pub struct NewCar {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub registration: String,
    #[serde(default)]
    pub owner: String,
}

#[derive(Deserialize)]
pub struct CarPatch {
    pub make: Option<String>,
    pub model: Option<String>,
    pub registration: Option<String>,
    pub owner: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerChange {
    pub owner: String,
    pub new_owner: String,
}

pub type Db = Arc<RwLock<Vec<Car>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Year the age filter measures against.
    pub current_year: i32,
}

pub fn app() -> Router {
    app_with(Vec::new(), chrono::Utc::now().year())
}

/// Router over a pre-seeded collection, with a fixed "current" year.
pub fn app_with(cars: Vec<Car>, current_year: i32) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(cars)),
        current_year,
    };
    Router::new()
        .route("/findAllCars", get(find_all_cars))
        .route("/addCar", post(add_car))
        .route("/findByModel", post(find_by_model))
        .route("/updateById/{id}", put(update_by_id))
        .route("/updateMultipleCars", put(update_multiple_cars))
        .route("/removeById/{id}", delete(remove_by_id))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn serve_with(listener: TcpListener, cars: Vec<Car>, current_year: i32) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(cars, current_year)).await
}

/// `true` when `model` reads as a year more than the threshold before `current_year`.
pub fn is_older_than_threshold(model: &str, current_year: i32) -> bool {
    model
        .trim()
        .parse::<i32>()
        .map(|year| current_year - year > AGE_THRESHOLD_YEARS)
        .unwrap_or(false)
}

async fn find_all_cars(State(state): State<AppState>) -> Json<Vec<Car>> {
    let cars = state.db.read().await;
    Json(cars.clone())
}

async fn add_car(State(state): State<AppState>, Json(input): Json<NewCar>) -> (StatusCode, Json<Car>) {
    let car = Car {
        id: Uuid::new_v4().to_string(),
        make: input.make,
        model: input.model,
        registration: input.registration,
        owner: input.owner,
    };
    state.db.write().await.push(car.clone());
    info!(id = %car.id, "car added");
    (StatusCode::CREATED, Json(car))
}

// The body is the add-form draft; the filter does not look at it.
async fn find_by_model(State(state): State<AppState>, Json(_draft): Json<serde_json::Value>) -> Json<Vec<Car>> {
    let cars = state.db.read().await;
    Json(
        cars.iter()
            .filter(|car| is_older_than_threshold(&car.model, state.current_year))
            .cloned()
            .collect(),
    )
}

async fn update_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CarPatch>,
) -> Result<Json<Car>, StatusCode> {
    let mut cars = state.db.write().await;
    let car = cars.iter_mut().find(|car| car.id == id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(make) = input.make {
        car.make = make;
    }
    if let Some(model) = input.model {
        car.model = model;
    }
    if let Some(registration) = input.registration {
        car.registration = registration;
    }
    if let Some(owner) = input.owner {
        car.owner = owner;
    }
    info!(%id, "car updated");
    Ok(Json(car.clone()))
}

async fn update_multiple_cars(
    State(state): State<AppState>,
    Json(input): Json<OwnerChange>,
) -> Result<Json<Vec<Car>>, StatusCode> {
    let mut cars = state.db.write().await;
    let updated: Vec<Car> = cars
        .iter_mut()
        .filter(|car| car.owner == input.owner)
        .map(|car| {
            car.owner = input.new_owner.clone();
            car.clone()
        })
        .collect();
    if updated.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    info!(owner = %input.owner, new_owner = %input.new_owner, count = updated.len(), "owners changed");
    Ok(Json(updated))
}

async fn remove_by_id(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Car>, StatusCode> {
    let mut cars = state.db.write().await;
    let index = cars.iter().position(|car| car.id == id).ok_or(StatusCode::NOT_FOUND)?;
    let removed = cars.remove(index);
    info!(%id, "car removed");
    Ok(Json(removed))
}
