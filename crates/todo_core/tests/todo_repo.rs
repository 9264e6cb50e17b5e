mod common;

use common::{at, seed_user, store};
use std::collections::HashSet;
use todo_core::{
    parse_list_params, RepoError, SortKey, SortOrder, SqliteTodoRepository, Title, Todo,
    TodoListFilter, TodoRepository, TodoUpdate,
};
use uuid::Uuid;

#[test]
fn create_and_find_roundtrip() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let todo = Todo::new(
        alice.id(),
        "Buy milk",
        Some(String::new()),
        Some(at(2026, 3, 1, 9, 30)),
    )
    .unwrap();
    let created = repo.create(todo.clone()).unwrap();
    assert_eq!(created, todo);

    let loaded = repo.find_by_id(todo.id(), alice.id()).unwrap().unwrap();
    assert_eq!(loaded, todo);
    assert_eq!(loaded.description().map(|d| d.as_str()), Some(""));
}

#[test]
fn create_with_existing_id_is_conflict() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let todo = Todo::new(alice.id(), "once", None, None).unwrap();
    repo.create(todo.clone()).unwrap();

    let err = repo.create(todo).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn other_owner_sees_not_found_for_every_operation() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let bob = seed_user(&store, "bob");
    let repo = SqliteTodoRepository::new(&store);

    let todo = repo
        .create(Todo::new(alice.id(), "private", None, None).unwrap())
        .unwrap();

    assert_eq!(repo.find_by_id(todo.id(), bob.id()).unwrap(), None);
    assert_eq!(repo.find_by_id(Uuid::new_v4(), bob.id()).unwrap(), None);

    let err = repo.delete(todo.id(), bob.id()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == todo.id()));
    let missing = Uuid::new_v4();
    let err = repo.delete(missing, bob.id()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));

    let title = Title::new("copy").unwrap();
    assert_eq!(
        repo.duplicate(todo.id(), bob.id(), Uuid::new_v4(), title)
            .unwrap(),
        None
    );

    assert!(repo.find_by_id(todo.id(), alice.id()).unwrap().is_some());
}

#[test]
fn update_of_missing_row_is_not_found() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let never_stored = Todo::new(alice.id(), "ghost", None, None).unwrap();
    let err = repo.update(never_stored.clone()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == never_stored.id()));
}

#[test]
fn update_persists_completion_state() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let mut todo = repo
        .create(Todo::new(alice.id(), "task", None, None).unwrap())
        .unwrap();
    todo.apply_update(TodoUpdate {
        completed: Some(true),
        ..TodoUpdate::default()
    })
    .unwrap();
    repo.update(todo.clone()).unwrap();

    let loaded = repo.find_by_id(todo.id(), alice.id()).unwrap().unwrap();
    assert!(loaded.completed());
    assert_eq!(loaded.completed_at(), todo.completed_at());
    assert_eq!(loaded.updated_at(), todo.updated_at());
}

#[test]
fn pagination_reports_total_and_disjoint_pages() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let bob = seed_user(&store, "bob");
    let repo = SqliteTodoRepository::new(&store);

    for index in 0..25 {
        repo.create(Todo::new(alice.id(), format!("item {index}"), None, None).unwrap())
            .unwrap();
    }
    repo.create(Todo::new(bob.id(), "bob's", None, None).unwrap())
        .unwrap();

    let first = repo
        .list_by_filter(&TodoListFilter {
            limit: Some(20),
            offset: Some(0),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(first.items.len(), 20);
    assert_eq!(first.total, 25);

    let second = repo
        .list_by_filter(&TodoListFilter {
            limit: Some(20),
            offset: Some(20),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(second.items.len(), 5);
    assert_eq!(second.total, 25);

    let ids: HashSet<_> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(Todo::id)
        .collect();
    assert_eq!(ids.len(), 25);
    assert!(first
        .items
        .iter()
        .chain(second.items.iter())
        .all(|todo| todo.owner_id() == alice.id()));
}

#[test]
fn limit_and_offset_are_clamped() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);
    for index in 0..3 {
        repo.create(Todo::new(alice.id(), format!("item {index}"), None, None).unwrap())
            .unwrap();
    }

    let page = repo
        .list_by_filter(&TodoListFilter {
            limit: Some(0),
            offset: Some(-4),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(page.limit, 1);
    assert_eq!(page.offset, 0);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 3);

    let page = repo
        .list_by_filter(&TodoListFilter {
            limit: Some(1000),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(page.limit, 100);
    assert_eq!(page.items.len(), 3);
}

#[test]
fn completed_and_due_range_filters_combine() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let dues = [
        Some(at(2026, 3, 4, 23, 59)),
        Some(at(2026, 3, 5, 0, 0)),
        Some(at(2026, 3, 7, 12, 0)),
        Some(at(2026, 3, 10, 23, 59)),
        Some(at(2026, 3, 11, 0, 0)),
        None,
    ];
    for (index, due) in dues.iter().enumerate() {
        let mut todo = Todo::new(alice.id(), format!("todo {index}"), None, *due).unwrap();
        if index != 2 {
            todo.apply_update(TodoUpdate {
                completed: Some(true),
                ..TodoUpdate::default()
            })
            .unwrap();
        }
        repo.create(todo).unwrap();
    }

    let mut filter = parse_list_params([
        ("due_from", "2026-03-05"),
        ("due_to", "2026-03-10"),
        ("completed", "true"),
    ])
    .unwrap();
    filter.owner_id = alice.id();
    let page = repo.list_by_filter(&filter).unwrap();

    let from = at(2026, 3, 5, 0, 0);
    let to = at(2026, 3, 11, 0, 0);
    assert_eq!(page.total, 2);
    for todo in &page.items {
        assert!(todo.completed());
        let due = todo.due_date().unwrap();
        assert!(due >= from && due < to, "due {due} outside range");
    }

    let open = repo
        .list_by_filter(&TodoListFilter {
            completed: Some(false),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(open.total, 1);
    assert_eq!(open.items[0].title().as_str(), "todo 2");
}

#[test]
fn substring_filters_are_case_insensitive_and_literal() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    repo.create(Todo::new(alice.id(), "Buy MILK", None, None).unwrap())
        .unwrap();
    repo.create(
        Todo::new(alice.id(), "Groceries", Some("milk and eggs".to_string()), None).unwrap(),
    )
    .unwrap();
    repo.create(Todo::new(alice.id(), "50% off", None, None).unwrap())
        .unwrap();
    repo.create(Todo::new(alice.id(), "500 items", None, None).unwrap())
        .unwrap();

    let by_query = repo
        .list_by_filter(&TodoListFilter {
            query: Some("milk".to_string()),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(by_query.total, 2);

    let by_title = repo
        .list_by_filter(&TodoListFilter {
            title_contains: Some("milk".to_string()),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(by_title.total, 1);

    let by_description = repo
        .list_by_filter(&TodoListFilter {
            description_contains: Some("EGGS".to_string()),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(by_description.total, 1);
    assert_eq!(by_description.items[0].title().as_str(), "Groceries");

    let literal_percent = repo
        .list_by_filter(&TodoListFilter {
            title_contains: Some("50%".to_string()),
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap();
    assert_eq!(literal_percent.total, 1);
    assert_eq!(literal_percent.items[0].title().as_str(), "50% off");
}

#[test]
fn default_order_is_created_at_desc_and_sort_is_configurable() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let banana = repo
        .create(Todo::new(alice.id(), "banana", None, Some(at(2026, 5, 1, 0, 0))).unwrap())
        .unwrap();
    let apple = repo
        .create(Todo::new(alice.id(), "apple", None, None).unwrap())
        .unwrap();
    let cherry = repo
        .create(Todo::new(alice.id(), "cherry", None, Some(at(2026, 4, 1, 0, 0))).unwrap())
        .unwrap();

    for (todo, created_at) in [(&banana, 1_000_i64), (&apple, 2_000), (&cherry, 3_000)] {
        store
            .with_conn::<_, RepoError>(|conn| {
                conn.execute(
                    "UPDATE todos SET created_at = ?1 WHERE id = ?2;",
                    rusqlite::params![created_at, todo.id().to_string()],
                )?;
                Ok(())
            })
            .unwrap();
    }

    let titles = |sort: SortKey, order: SortOrder| -> Vec<String> {
        repo.list_by_filter(&TodoListFilter {
            sort,
            order,
            ..TodoListFilter::for_owner(alice.id())
        })
        .unwrap()
        .items
        .iter()
        .map(|todo| todo.title().as_str().to_string())
        .collect()
    };

    assert_eq!(
        titles(SortKey::default(), SortOrder::default()),
        ["cherry", "apple", "banana"]
    );
    assert_eq!(
        titles(SortKey::Title, SortOrder::Asc),
        ["apple", "banana", "cherry"]
    );
    assert_eq!(
        titles(SortKey::DueDate, SortOrder::Asc),
        ["cherry", "banana", "apple"]
    );
    assert_eq!(
        titles(SortKey::DueDate, SortOrder::Desc),
        ["banana", "cherry", "apple"]
    );
}

#[test]
fn duplicate_copies_description_and_resets_state() {
    let store = store();
    let alice = seed_user(&store, "alice");
    let repo = SqliteTodoRepository::new(&store);

    let mut source = Todo::new(
        alice.id(),
        "Buy milk",
        Some("2 liters".to_string()),
        Some(at(2026, 3, 1, 0, 0)),
    )
    .unwrap();
    source
        .apply_update(TodoUpdate {
            completed: Some(true),
            ..TodoUpdate::default()
        })
        .unwrap();
    let source = repo.create(source).unwrap();

    let new_id = Uuid::new_v4();
    let copy = repo
        .duplicate(
            source.id(),
            alice.id(),
            new_id,
            Title::new("Buy milk (copy)").unwrap(),
        )
        .unwrap()
        .unwrap();

    assert_eq!(copy.id(), new_id);
    assert_eq!(copy.title().as_str(), "Buy milk (copy)");
    assert_eq!(copy.description().unwrap().as_str(), "2 liters");
    assert!(!copy.completed());
    assert_eq!(copy.completed_at(), None);
    assert_eq!(copy.due_date(), None);
    assert_eq!(repo.find_by_id(new_id, alice.id()).unwrap(), Some(copy));
    assert_eq!(
        repo.list_by_filter(&TodoListFilter::for_owner(alice.id()))
            .unwrap()
            .total,
        2
    );
}
