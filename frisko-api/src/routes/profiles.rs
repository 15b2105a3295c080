use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::geo::{validate_coordinates, Coordinates};
use frisko_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::profiles;
use crate::AppState;

const SELLER_ROLES: &[&str] = &["seller", "farmer"];

/// GET /profiles/:id - public profile
pub async fn get_profile(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile: Profile = profiles::table
        .find(profile_id)
        .first::<Profile>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}

/// GET /me - the authenticated user's own profile
pub async fn get_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile: Profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}

#[derive(Debug, Deserialize, Validate, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_address: Option<String>,
}

impl UpdateProfileRequest {
    fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.cover_url.is_none()
            && self.location_lat.is_none()
            && self.location_lng.is_none()
            && self.location_address.is_none()
    }
}

/// PATCH /me - update own profile
pub async fn update_me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Location comes as a pair or not at all
    match (req.location_lat, req.location_lng) {
        (None, None) => {}
        (Some(lat), Some(lng)) => {
            if !validate_coordinates(lat, lng) {
                return Err(AppError::new(
                    ErrorCode::InvalidCoordinates,
                    "latitude must be in [-90, 90] and longitude in [-180, 180]",
                ));
            }
        }
        _ => {
            return Err(AppError::new(
                ErrorCode::InvalidCoordinates,
                "location_lat and location_lng must be provided together",
            ));
        }
    }

    // Diesel rejects a changeset with no fields
    if req.is_empty() {
        return get_me(user, State(state)).await;
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile: Profile = diesel::update(profiles::table.find(user.id))
        .set(&req)
        .get_result(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                AppError::new(ErrorCode::ProfileNotFound, "profile not found")
            }
            other => AppError::Database(other),
        })?;

    Ok(Json(ApiResponse::ok(profile)))
}

#[derive(Debug, Deserialize)]
pub struct OpgListParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OpgSummary {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// GET /opgs?lat=&lng=&max_km= - list seller profiles, optionally filtered
/// and sorted by distance from the caller's coordinates.
pub async fn list_opgs(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<OpgListParams>,
) -> AppResult<Json<ApiResponse<Vec<OpgSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let sellers: Vec<Profile> = profiles::table
        .filter(profiles::role.eq_any(SELLER_ROLES))
        .order(profiles::rating.desc())
        .load::<Profile>(&mut conn)
        .map_err(AppError::Database)?;

    let origin = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => {
            let origin = Coordinates::new(lat, lng);
            if !origin.is_valid() {
                return Err(AppError::new(
                    ErrorCode::InvalidCoordinates,
                    "latitude must be in [-90, 90] and longitude in [-180, 180]",
                ));
            }
            Some(origin)
        }
        (None, None) => None,
        _ => {
            return Err(AppError::new(
                ErrorCode::InvalidCoordinates,
                "lat and lng must be provided together",
            ));
        }
    };

    let results = match origin {
        None => sellers
            .into_iter()
            .map(|profile| OpgSummary { profile, distance_km: None })
            .collect(),
        Some(origin) => {
            let max_km = params.max_km.unwrap_or(state.config.default_max_distance_km);

            let mut nearby: Vec<OpgSummary> = sellers
                .into_iter()
                .filter_map(|profile| {
                    let (Some(p_lat), Some(p_lng)) = (profile.location_lat, profile.location_lng)
                    else {
                        return None;
                    };
                    let distance = origin.distance_km(&Coordinates::new(p_lat, p_lng));
                    (distance <= max_km).then_some(OpgSummary {
                        profile,
                        distance_km: Some(distance),
                    })
                })
                .collect();

            nearby.sort_by(|a, b| {
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            nearby
        }
    };

    Ok(Json(ApiResponse::ok(results)))
}
