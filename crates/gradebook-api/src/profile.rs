use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use tracing::error;

use gradebook_db::models::UserUpdate;
use gradebook_types::api::{Ack, PhotoUploaded, UpdateProfileRequest};

use crate::auth::{AppState, hash_password};
use crate::convert::user_profile;
use crate::error::ApiError;
use crate::extract::{JsonBody, present};
use crate::notify::notify;
use crate::task::blocking;
use crate::uploads::{PHOTO_EXTENSIONS, allowed_extension, is_safe_id, read_multipart, stored_name};

/// GET /profile/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_id(&id)? else {
            return Ok(None);
        };
        let student = db.get_student(&user.id)?;
        Ok::<_, ApiError>(Some(user_profile(user, student)))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(profile))
}

/// PUT /profile/{id}: only the fields present and non-empty change.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut update = UserUpdate {
        name: present(&req.name).map(str::to_string),
        email: present(&req.email).map(str::to_string),
        bio: req.bio.filter(|b| !b.is_empty()),
        ..Default::default()
    };
    let password = req.password.filter(|p| !p.is_empty());

    if update.name.is_none() && update.email.is_none() && update.bio.is_none() && password.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let uid = id.clone();
    let found = blocking(&state, move |db| {
        if let Some(password) = password {
            update.password_hash = Some(hash_password(&password)?);
        }
        Ok::<_, ApiError>(db.update_user(&uid, &update)?)
    })
    .await?;

    if !found {
        return Err(ApiError::not_found("User not found"));
    }

    notify(&state, &id, "Your profile was updated").await;

    Ok(Json(Ack::new("Profile updated")))
}

/// POST /profile/{id}/photo (multipart field `photo`)
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    if !is_safe_id(&id) {
        return Err(ApiError::bad_request("Invalid user id"));
    }

    let (_, photo) = read_multipart(multipart, "photo").await?;
    let photo = photo.ok_or_else(|| ApiError::bad_request("No photo provided"))?;
    if photo.file_name.is_empty() || photo.data.is_empty() {
        return Err(ApiError::bad_request("Invalid photo"));
    }
    let ext = allowed_extension(&photo.file_name, PHOTO_EXTENSIONS)
        .ok_or_else(|| ApiError::bad_request("Invalid file type"))?;

    let uid = id.clone();
    if blocking(&state, move |db| db.get_user_by_id(&uid)).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let filename = stored_name(&id, &ext);
    state.uploads.save(&filename, &photo.data).await.map_err(|e| {
        error!("Failed to store photo {}: {}", filename, e);
        ApiError::internal("Upload failed", e)
    })?;

    let (uid, photo_name) = (id.clone(), filename.clone());
    let stored = blocking(&state, move |db| {
        db.update_user(
            &uid,
            &UserUpdate {
                profile_photo: Some(photo_name),
                ..Default::default()
            },
        )
    })
    .await;

    match stored {
        Ok(true) => {}
        Ok(false) => {
            state.uploads.discard(&filename).await;
            return Err(ApiError::not_found("User not found"));
        }
        Err(e) => {
            state.uploads.discard(&filename).await;
            return Err(e);
        }
    }

    notify(&state, &id, "Profile photo updated").await;

    Ok(Json(PhotoUploaded {
        message: "Photo uploaded".into(),
        photo: filename,
    }))
}
