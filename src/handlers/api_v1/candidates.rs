use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::assignments::{Candidate, SlotRole, load_candidates};
use crate::auth::session::{WEEKS_EDIT, require_permission};
use crate::errors::AppError;
use crate::models::directory::PgDirectory;
use crate::models::week::RelationTo;

#[derive(Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOption {
    pub value: i64,
    pub label: String,
    pub relation_to: RelationTo,
}

impl From<&Candidate> for CandidateOption {
    fn from(c: &Candidate) -> Self {
        let r = c.reference();
        CandidateOption { value: r.value, label: c.display_name().to_string(), relation_to: r.relation_to }
    }
}

/// GET /api/v1/candidates?role=<slot role key>
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<CandidateQuery>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let Some(role) = SlotRole::parse(&query.role) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Unknown role '{}'", query.role),
        })));
    };
    let candidates = load_candidates(&PgDirectory::new(&pool), role).await?;
    let options: Vec<CandidateOption> = candidates.iter().map(CandidateOption::from).collect();
    Ok(HttpResponse::Ok().json(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::VisitorRecord;

    #[test]
    fn visitor_option_serializes_with_relation() {
        let c = Candidate::Visitor(VisitorRecord { id: 4, name: "Carl Gast".to_string() });
        let json = serde_json::to_value(CandidateOption::from(&c)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": 4, "label": "Carl Gast", "relationTo": "visitors" }));
    }
}
