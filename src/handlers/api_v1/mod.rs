pub mod candidates;
pub mod weeks;

use actix_web::web;

use crate::auth::middleware::require_json_content_type;

/// Routes under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/weeks")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::get().to(weeks::list))
            .route("", web::post().to(weeks::create))
            .route("/{id}", web::get().to(weeks::read))
            .route("/{id}", web::put().to(weeks::update))
    );
    cfg.route("/candidates", web::get().to(candidates::list));
}
