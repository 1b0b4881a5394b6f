use actix_web::http::header::ContentType;
use actix_web::HttpResponse;

/// Fallback for every unknown path, and for known paths hit with the wrong
/// method.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type(ContentType::plaintext())
        .body("Not Found")
}
