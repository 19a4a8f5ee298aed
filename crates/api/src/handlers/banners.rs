//! Handlers for homepage hero banners.
//!
//! Banners are written as `multipart/form-data` with the image in the
//! `banner_image` field. At most a fixed number may be active at once; the
//! check and the write run under a table lock so two editors cannot both
//! activate the last slot. The image is written to disk before the lock is
//! taken, so a rejected banner can leave an unreferenced file behind.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use boganto_core::banner::{
    check_active_limit, validate_banner_fields, BannerFieldsInput, ValidatedBanner,
};
use boganto_core::error::CoreError;
use boganto_core::types::DbId;
use boganto_core::upload::SUBFOLDER_BANNERS;
use boganto_db::models::banner::{BannerChanges, BannerRow, BannerView, NewBanner};
use boganto_db::repositories::{BannerRepo, PostRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::payload::{MultipartForm, FIELD_BANNER_IMAGE};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "Banner";

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

async fn read_banner_form(
    state: &AppState,
    multipart: Multipart,
) -> AppResult<(ValidatedBanner, MultipartForm)> {
    let form = MultipartForm::read(multipart).await?;
    let input: BannerFieldsInput = form.fields()?;
    let banner = validate_banner_fields(&input)?;

    if let Some(post_id) = banner.post_id {
        if !PostRepo::exists(&state.pool, post_id).await? {
            return Err(CoreError::invalid(format!("Linked post {post_id} does not exist")).into());
        }
    }

    Ok((banner, form))
}

fn views(state: &AppState, rows: Vec<BannerRow>) -> Vec<BannerView> {
    rows.into_iter()
        .map(|row| BannerView::from_row(row, state.public_base()))
        .collect()
}

/* --------------------------------------------------------------------------
Reads
-------------------------------------------------------------------------- */

/// GET /banners
///
/// Active banners in carousel order.
pub async fn list_active_banners(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = BannerRepo::list(&state.pool, true).await?;
    Ok(Json(DataResponse { data: views(&state, rows) }))
}

/// GET /admin/banners
pub async fn list_banners(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rows = BannerRepo::list(&state.pool, false).await?;
    Ok(Json(DataResponse { data: views(&state, rows) }))
}

/* --------------------------------------------------------------------------
Writes
-------------------------------------------------------------------------- */

/// POST /admin/banners
pub async fn create_banner(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (banner, mut form) = read_banner_form(&state, multipart).await?;
    let image = form
        .take_file(FIELD_BANNER_IMAGE)
        .ok_or_else(|| CoreError::invalid("Banner image is required"))?;
    let image_url = state.images.store(&image, Some(SUBFOLDER_BANNERS)).await?;

    let mut tx = state.pool.begin().await?;
    if banner.is_active {
        BannerRepo::lock_for_activation(&mut tx).await?;
        let active = BannerRepo::count_active_excluding(&mut tx, None).await?;
        check_active_limit(true, active)?;
    }

    let row = BannerRepo::create(
        &mut tx,
        &NewBanner {
            title: banner.title,
            subtitle: banner.subtitle,
            image_url,
            post_id: banner.post_id,
            link_url: banner.link_url,
            sort_order: banner.sort_order,
            is_active: banner.is_active,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(banner_id = row.id, is_active = row.is_active, "Banner created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BannerView::from_row(row, state.public_base()),
        }),
    ))
}

/// PUT /admin/banners/{id}
///
/// Replaces every field; the image only when a new one is uploaded.
pub async fn update_banner(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    if BannerRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(CoreError::NotFound { entity: ENTITY, id }.into());
    }

    let (banner, mut form) = read_banner_form(&state, multipart).await?;
    let image_url = match form.take_file(FIELD_BANNER_IMAGE) {
        Some(image) => Some(state.images.store(&image, Some(SUBFOLDER_BANNERS)).await?),
        None => None,
    };

    let mut tx = state.pool.begin().await?;
    if banner.is_active {
        BannerRepo::lock_for_activation(&mut tx).await?;
        let others = BannerRepo::count_active_excluding(&mut tx, Some(id)).await?;
        check_active_limit(true, others)?;
    }

    let row = BannerRepo::update(
        &mut tx,
        id,
        &BannerChanges {
            title: banner.title,
            subtitle: banner.subtitle,
            image_url,
            post_id: banner.post_id,
            link_url: banner.link_url,
            sort_order: banner.sort_order,
            is_active: banner.is_active,
        },
    )
    .await?
    .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    tx.commit().await?;

    tracing::info!(banner_id = id, is_active = row.is_active, "Banner updated");
    Ok(Json(DataResponse {
        data: BannerView::from_row(row, state.public_base()),
    }))
}

/// DELETE /admin/banners/{id}
pub async fn delete_banner(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !BannerRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: ENTITY, id }.into());
    }
    tracing::info!(banner_id = id, "Banner deleted");
    Ok(StatusCode::NO_CONTENT)
}
