use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::Next,
};

/// Requests under this prefix get JSON errors instead of redirects.
const API_PREFIX: &str = "/api/";

/// Require a logged-in session. Pages redirect to `/login`; API calls get a
/// 401 with a JSON body.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let logged_in = req.get_session().get::<i64>("user_id").unwrap_or(None).is_some();
    if logged_in {
        return next.call(req).await.map(|res| res.map_into_left_body());
    }

    log::debug!("Unauthenticated request to {}", req.path());
    let response = if req.path().starts_with(API_PREFIX) {
        HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Login required" }))
    } else {
        HttpResponse::SeeOther().insert_header(("Location", "/login")).finish()
    };
    Ok(req.into_response(response).map_into_right_body())
}

fn is_mutation(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Reject JSON API mutations whose body is not `application/json`.
/// Browsers cannot send cross-origin JSON with cookies via a plain form post.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let is_json = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_mutation(req.method()) && !is_json {
        let response = HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Content-Type must be application/json for mutation requests"
        }));
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
