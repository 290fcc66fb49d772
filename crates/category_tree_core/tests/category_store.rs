use category_tree_core::db::open_db_in_memory;
use category_tree_core::{
    CategoryLevel, CategoryPatch, CategoryRepoError, CategoryStore, CourseRepository, NewCategory,
    OrderUpdate, SqliteCategoryStore, SqliteCourseRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn orders_under(store: &SqliteCategoryStore<'_>, parent: Option<Uuid>) -> Vec<(Uuid, i64)> {
    let mut rows: Vec<(Uuid, i64)> = store
        .list_categories()
        .unwrap()
        .into_iter()
        .filter(|record| record.parent_id == parent)
        .map(|record| (record.id, record.order))
        .collect();
    rows.sort_by_key(|(_, order)| *order);
    rows
}

#[test]
fn create_appends_siblings_in_order() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();

    let math = store.create_category(&NewCategory::root("Math")).unwrap();
    let art = store
        .create_category(&NewCategory::root("Art").with_description("  Visual  "))
        .unwrap();
    let algebra = store
        .create_category(&NewCategory::child(
            "Algebra",
            CategoryLevel::Two,
            math.id,
        ))
        .unwrap();

    assert_eq!(math.order, 0);
    assert_eq!(art.order, 1);
    assert_eq!(art.description, "Visual");
    assert_eq!(algebra.order, 0);
    assert_eq!(algebra.parent_id, Some(math.id));
    assert_eq!(algebra.course_count, 0);
    assert!(algebra.created_at > 0);
}

#[test]
fn create_rejects_parent_at_wrong_level() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();
    let math = store.create_category(&NewCategory::root("Math")).unwrap();

    let err = store
        .create_category(&NewCategory::child(
            "Proofs",
            CategoryLevel::Three,
            math.id,
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        CategoryRepoError::ParentLevelMismatch {
            expected: CategoryLevel::Two,
            actual: CategoryLevel::One,
            ..
        }
    ));

    let missing = Uuid::new_v4();
    let err = store
        .create_category(&NewCategory::child("Lost", CategoryLevel::Two, missing))
        .unwrap_err();
    assert!(matches!(err, CategoryRepoError::ParentNotFound(id) if id == missing));
}

#[test]
fn update_changes_only_given_fields() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();
    let math = store
        .create_category(&NewCategory::root("Math").with_description("Numbers"))
        .unwrap();

    store
        .update_category(
            math.id,
            &CategoryPatch {
                name: Some(" Mathematics ".to_string()),
                ..CategoryPatch::default()
            },
        )
        .unwrap();

    let loaded = store.get_category(math.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Mathematics");
    assert_eq!(loaded.description, "Numbers");
    assert_eq!(loaded.order, 0);

    let err = store
        .update_category(Uuid::new_v4(), &CategoryPatch::order(1))
        .unwrap_err();
    assert!(matches!(err, CategoryRepoError::NotFound(_)));
}

#[test]
fn course_count_reflects_assigned_courses() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();
    let courses = SqliteCourseRepository::try_new(&conn).unwrap();
    let math = store.create_category(&NewCategory::root("Math")).unwrap();

    for title in ["Calculus I", "Calculus II", "Statistics"] {
        courses.create_course(math.id, title).unwrap();
    }

    let loaded = store.get_category(math.id).unwrap().unwrap();
    assert_eq!(loaded.course_count, 3);
}

#[test]
fn delete_rejects_children_and_courses_then_compacts_siblings() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();
    let courses = SqliteCourseRepository::try_new(&conn).unwrap();

    let math = store.create_category(&NewCategory::root("Math")).unwrap();
    let art = store.create_category(&NewCategory::root("Art")).unwrap();
    let music = store.create_category(&NewCategory::root("Music")).unwrap();
    store
        .create_category(&NewCategory::child(
            "Algebra",
            CategoryLevel::Two,
            math.id,
        ))
        .unwrap();
    courses.create_course(music.id, "Harmony").unwrap();

    assert!(matches!(
        store.delete_category(math.id).unwrap_err(),
        CategoryRepoError::HasChildren(id) if id == math.id
    ));
    assert!(matches!(
        store.delete_category(music.id).unwrap_err(),
        CategoryRepoError::HasCourses { course_count: 1, .. }
    ));

    store.delete_category(art.id).unwrap();
    assert!(store.get_category(art.id).unwrap().is_none());
    assert_eq!(
        orders_under(&store, None),
        vec![(math.id, 0), (music.id, 1)]
    );
}

#[test]
fn move_promotes_and_cascades_descendant_levels() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();

    let science = store.create_category(&NewCategory::root("Science")).unwrap();
    let physics = store
        .create_category(&NewCategory::child(
            "Physics",
            CategoryLevel::Two,
            science.id,
        ))
        .unwrap();
    let chemistry = store
        .create_category(&NewCategory::child(
            "Chemistry",
            CategoryLevel::Two,
            science.id,
        ))
        .unwrap();
    let optics = store
        .create_category(&NewCategory::child(
            "Optics",
            CategoryLevel::Three,
            physics.id,
        ))
        .unwrap();

    store
        .move_category(physics.id, CategoryLevel::One, None)
        .unwrap();

    let physics = store.get_category(physics.id).unwrap().unwrap();
    let optics = store.get_category(optics.id).unwrap().unwrap();
    assert_eq!(physics.level, CategoryLevel::One);
    assert_eq!(physics.parent_id, None);
    assert_eq!(physics.order, 1);
    assert_eq!(optics.level, CategoryLevel::Two);
    assert_eq!(optics.parent_id, Some(physics.id));
    assert_eq!(
        orders_under(&store, Some(science.id)),
        vec![(chemistry.id, 0)]
    );
}

#[test]
fn move_rejects_descendants_past_level_three() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();

    let science = store.create_category(&NewCategory::root("Science")).unwrap();
    let art = store.create_category(&NewCategory::root("Art")).unwrap();
    let physics = store
        .create_category(&NewCategory::child(
            "Physics",
            CategoryLevel::Two,
            science.id,
        ))
        .unwrap();
    let painting = store
        .create_category(&NewCategory::child(
            "Painting",
            CategoryLevel::Two,
            art.id,
        ))
        .unwrap();
    store
        .create_category(&NewCategory::child(
            "Optics",
            CategoryLevel::Three,
            physics.id,
        ))
        .unwrap();

    let err = store
        .move_category(physics.id, CategoryLevel::Three, Some(painting.id))
        .unwrap_err();
    assert!(matches!(
        err,
        CategoryRepoError::DepthExceeded { deepest_level: 4, .. }
    ));

    let unchanged = store.get_category(physics.id).unwrap().unwrap();
    assert_eq!(unchanged.level, CategoryLevel::Two);
    assert_eq!(unchanged.parent_id, Some(science.id));
}

#[test]
fn move_rejects_parent_inside_own_subtree() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();

    let science = store.create_category(&NewCategory::root("Science")).unwrap();
    let physics = store
        .create_category(&NewCategory::child(
            "Physics",
            CategoryLevel::Two,
            science.id,
        ))
        .unwrap();

    let err = store
        .move_category(science.id, CategoryLevel::Three, Some(physics.id))
        .unwrap_err();
    assert!(matches!(
        err,
        CategoryRepoError::WouldCreateCycle { id, parent_id }
            if id == science.id && parent_id == physics.id
    ));
}

#[test]
fn apply_orders_is_all_or_nothing() {
    let conn = setup();
    let store = SqliteCategoryStore::try_new(&conn).unwrap();
    let a = store.create_category(&NewCategory::root("A")).unwrap();
    let b = store.create_category(&NewCategory::root("B")).unwrap();

    let outcomes = store.apply_orders(&[
        OrderUpdate { id: b.id, order: 0 },
        OrderUpdate { id: a.id, order: 1 },
    ]);
    assert!(outcomes.iter().all(|outcome| outcome.is_ok()));
    assert_eq!(orders_under(&store, None), vec![(b.id, 0), (a.id, 1)]);

    let missing = Uuid::new_v4();
    let outcomes = store.apply_orders(&[
        OrderUpdate { id: a.id, order: 0 },
        OrderUpdate {
            id: missing,
            order: 1,
        },
    ]);
    assert!(outcomes.iter().all(|outcome| !outcome.is_ok()));
    assert!(outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .starts_with("batch rolled back"));
    assert!(outcomes[1].error.as_deref().unwrap().contains("not found"));
    assert_eq!(orders_under(&store, None), vec![(b.id, 0), (a.id, 1)]);
}
