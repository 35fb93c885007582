use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::io::Write;

use crate::classifier::ClassifierError;
use crate::service::VerificationService;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/verify").route(web::post().to(handle_verify)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn handle_verify(
    service: web::Data<VerificationService>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    // First non-empty file field wins; one submission carries one photo.
    let mut image_data = Vec::new();
    while let Ok(Some(mut field)) = payload.try_next().await {
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_data.write_all(&data)?;
        }
        if !image_data.is_empty() {
            break;
        }
    }

    if image_data.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse {
            error: "No photo uploaded".into(),
        }));
    }

    let image = match image::load_from_memory(&image_data) {
        Ok(image) => image,
        Err(e) => {
            info!("Rejected upload: {}", e);
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: format!("Unsupported image format: {}", e),
            }));
        }
    };

    match service.verify(&image) {
        Ok(response) => {
            info!(
                "Submission {} verified: {} ({:.1}%)",
                response.id, response.verdict, response.confidence
            );
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e @ ClassifierError::UnsupportedImageFormat(_)) => {
            info!("Rejected upload: {}", e);
            Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
        Err(e) => {
            error!("Verification failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Verification failed: {}", e),
            }))
        }
    }
}
