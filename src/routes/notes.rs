/// Note Routes
///
/// All routes require a valid access token; the caller's `userId` from the
/// token is the only owner they can act on.

use actix_web::{web, HttpResponse};

use crate::auth::Claims;
use crate::error::AppError;
use crate::gate::NoteGate;
use crate::models::NoteDraft;
use crate::response::{ApiResponse, ResponseData};

/// GET /notes
pub async fn list_notes(
    claims: web::ReqData<Claims>,
    notes: web::Data<NoteGate>,
) -> Result<HttpResponse, AppError> {
    let list = notes.list(&claims.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Notes retrieved successfully",
        ResponseData::Notes(list),
    )))
}

/// POST /notes
///
/// Any `userId` in the body is ignored.
pub async fn create_note(
    claims: web::ReqData<Claims>,
    notes: web::Data<NoteGate>,
    body: web::Json<NoteDraft>,
) -> Result<HttpResponse, AppError> {
    let note = notes.create(&claims.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Note created successfully",
        ResponseData::Note(note),
    )))
}

/// GET /notes/{note_id}
pub async fn get_note(
    claims: web::ReqData<Claims>,
    notes: web::Data<NoteGate>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let note = notes.get(&claims.user_id, &path).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Note retrieved successfully",
        ResponseData::Note(note),
    )))
}

/// PUT /notes/{note_id}
///
/// # Errors
/// - 400: Invalid title/content, or a `userId` other than the caller's
/// - 404: No such note for this user
pub async fn update_note(
    claims: web::ReqData<Claims>,
    notes: web::Data<NoteGate>,
    path: web::Path<String>,
    body: web::Json<NoteDraft>,
) -> Result<HttpResponse, AppError> {
    let note = notes
        .update(&claims.user_id, &path, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Note updated successfully",
        ResponseData::Note(note),
    )))
}

/// DELETE /notes/{note_id}
pub async fn delete_note(
    claims: web::ReqData<Claims>,
    notes: web::Data<NoteGate>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    notes.delete(&claims.user_id, &path).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::empty("Note deleted successfully")))
}
