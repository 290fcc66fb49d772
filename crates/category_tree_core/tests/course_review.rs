use category_tree_core::db::open_db_in_memory;
use category_tree_core::{
    CategoryStore, CourseRepoError, CourseService, CourseServiceError, CourseStatus, NewCategory,
    SqliteCategoryStore, SqliteCourseRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn submitted_course_starts_pending_with_trimmed_title() {
    let conn = setup();
    let math = SqliteCategoryStore::try_new(&conn)
        .unwrap()
        .create_category(&NewCategory::root("Math"))
        .unwrap();
    let service = CourseService::new(SqliteCourseRepository::try_new(&conn).unwrap());

    let course = service.submit(math.id, "  Calculus I ").unwrap();
    assert_eq!(course.title, "Calculus I");
    assert_eq!(course.status, CourseStatus::Pending);
    assert_eq!(course.category_id, math.id);
    assert!(course.review_note.is_none());

    assert!(matches!(
        service.submit(math.id, "   "),
        Err(CourseServiceError::BlankTitle)
    ));
    assert!(matches!(
        service.submit(Uuid::new_v4(), "Orphan"),
        Err(CourseServiceError::Repo(CourseRepoError::CategoryNotFound(_)))
    ));
}

#[test]
fn approve_and_reject_only_from_pending() {
    let conn = setup();
    let math = SqliteCategoryStore::try_new(&conn)
        .unwrap()
        .create_category(&NewCategory::root("Math"))
        .unwrap();
    let service = CourseService::new(SqliteCourseRepository::try_new(&conn).unwrap());

    let calculus = service.submit(math.id, "Calculus").unwrap();
    let astrology = service.submit(math.id, "Astrology").unwrap();

    let approved = service.approve(calculus.id).unwrap();
    assert_eq!(approved.status, CourseStatus::Approved);

    let rejected = service
        .reject(astrology.id, Some("  not mathematics  "))
        .unwrap();
    assert_eq!(rejected.status, CourseStatus::Rejected);
    assert_eq!(rejected.review_note.as_deref(), Some("not mathematics"));

    assert!(matches!(
        service.reject(calculus.id, None),
        Err(CourseServiceError::InvalidTransition {
            from: CourseStatus::Approved,
            to: CourseStatus::Rejected,
            ..
        })
    ));
    assert!(matches!(
        service.approve(Uuid::new_v4()),
        Err(CourseServiceError::NotFound(_))
    ));
}

#[test]
fn review_queue_lists_pending_courses_only() {
    let conn = setup();
    let categories = SqliteCategoryStore::try_new(&conn).unwrap();
    let math = categories.create_category(&NewCategory::root("Math")).unwrap();
    let art = categories.create_category(&NewCategory::root("Art")).unwrap();
    let service = CourseService::new(SqliteCourseRepository::try_new(&conn).unwrap());

    let algebra = service.submit(math.id, "Algebra").unwrap();
    let geometry = service.submit(math.id, "Geometry").unwrap();
    let sketching = service.submit(art.id, "Sketching").unwrap();
    service.approve(geometry.id).unwrap();

    let mut pending: Vec<Uuid> = service
        .pending_review()
        .unwrap()
        .into_iter()
        .map(|course| course.id)
        .collect();
    pending.sort();
    let mut expected = vec![algebra.id, sketching.id];
    expected.sort();
    assert_eq!(pending, expected);

    let in_math = service.list_in_category(math.id).unwrap();
    assert_eq!(in_math.len(), 2);
    assert!(in_math.iter().all(|course| course.category_id == math.id));

    // Every course counts against deletion, whatever its review status.
    let math = categories.get_category(math.id).unwrap().unwrap();
    assert_eq!(math.course_count, 2);
}
