//! Directory lookups and the publisher, group and talk records behind them.

mod common;

use chrono::NaiveDate;
use sqlx::PgPool;

use versammlung::assignments::{
    AssignmentPermission as P, Candidate, Directory, PublisherFilter, SlotRole, load_candidates,
};
use versammlung::models::directory::PgDirectory;
use versammlung::models::publisher::{self, Absence, PublisherInput};
use versammlung::models::public_talk::{self, Delivery};
use versammlung::models::{entity, group};
use common::*;

async fn add_publisher(pool: &PgPool, first: &str, surname: &str, perms: &[P]) -> i64 {
    let input = PublisherInput {
        first_name: first.to_string(),
        surname: surname.to_string(),
        gender: "sister".to_string(),
        assignment_permissions: perms.iter().copied().collect(),
        ..Default::default()
    };
    publisher::create(pool, &input).await.expect("create publisher")
}

#[tokio::test]
async fn test_find_publishers_filters_by_permission_and_name() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let anna = add_publisher(pool, "Anna", "Lind", &[P::FieldMinistry, P::BibleReading]).await;
    let _bea = add_publisher(pool, "Bea", "Ostermann", &[P::Prayer]).await;
    let directory = PgDirectory::new(pool);

    let readers = directory.find_publishers(&PublisherFilter::with_permission(P::BibleReading)).await.unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].id, anna);
    assert!(readers[0].assignment_permissions.contains(&P::FieldMinistry));

    let by_name = directory.find_publishers(&PublisherFilter::by_name("Anna Lind")).await.unwrap();
    assert_eq!(by_name.len(), 1);
    // case-sensitive
    let lower = directory.find_publishers(&PublisherFilter::by_name("anna lind")).await.unwrap();
    assert!(lower.is_empty());
}

#[tokio::test]
async fn test_find_publisher_by_id() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let id = add_publisher(pool, "Dora", "Weiss", &[]).await;
    let directory = PgDirectory::new(pool);

    let found = directory.find_publisher(id).await.unwrap().expect("publisher");
    assert_eq!(found.display_name, "Dora Weiss");
    assert!(found.assignment_permissions.is_empty());
    assert!(directory.find_publisher(id + 10_000).await.unwrap().is_none());
}

#[tokio::test]
async fn test_created_visitors_are_candidates_for_every_role() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    add_publisher(pool, "Emil", "Roth", &[P::Chairman]).await;
    let directory = PgDirectory::new(pool);
    let visitor = directory.create_visitor("Gerd Gast").await.unwrap();

    let candidates = load_candidates(&directory, SlotRole::WeekendChairman).await.unwrap();
    let names: Vec<&str> = candidates.iter().map(Candidate::display_name).collect();
    assert_eq!(names, vec!["Emil Roth", "Gerd Gast"]);

    let readers = load_candidates(&directory, SlotRole::BibleReadingAssignee).await.unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].reference().value, visitor.id);
}

#[tokio::test]
async fn test_publisher_details_roundtrip() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let group_id = group::create(pool, "North", None, None).await.unwrap();

    let input = PublisherInput {
        first_name: "Frieda".to_string(),
        surname: "Brandt".to_string(),
        gender: "sister".to_string(),
        privileges: vec!["pioneer".to_string()],
        assignment_permissions: [P::FieldMinistry].into_iter().collect(),
        group_id: Some(group_id),
        absences: vec![Absence {
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
            reason: "Holiday".to_string(),
        }],
        ..Default::default()
    };
    let id = publisher::create(pool, &input).await.unwrap();

    let detail = publisher::find_by_id(pool, id).await.unwrap().expect("detail");
    assert_eq!(detail.display_name(), "Frieda Brandt");
    assert!(detail.has_privilege("pioneer"));
    assert!(detail.has_permission("field-ministry"));
    assert_eq!(detail.group_id, Some(group_id));
    assert_eq!(detail.absences, input.absences);
    assert!(!detail.has_login);

    let groups = group::find_all(pool).await.unwrap();
    assert_eq!(groups[0].member_count, 1);
}

#[tokio::test]
async fn test_talk_numbers_are_unique() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let deliveries = vec![Delivery {
        date: NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(),
        speaker: "Hans Vogel".to_string(),
    }];
    let id = public_talk::create(pool, 12, "Is there a creator?", &deliveries).await.unwrap();

    let err = public_talk::create(pool, 12, "Duplicate", &[]).await.unwrap_err();
    assert!(versammlung::db::is_unique_violation(&err));

    let talk = public_talk::find_by_id(pool, id).await.unwrap().expect("talk");
    assert_eq!(talk.numbered_title(), "12. Is there a creator?");
    assert_eq!(talk.deliveries, deliveries);

    assert!(entity::delete_typed(pool, "public_talk_title", id).await.unwrap());
    assert!(public_talk::find_by_id(pool, id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_seed_creates_admin_with_login() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let login = publisher::find_login(pool, ADMIN_USER).await.unwrap().expect("admin");
    assert!(versammlung::auth::password::verify_password(ADMIN_PASS, &login.password));
}
