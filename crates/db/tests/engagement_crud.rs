//! Integration tests for the engagement and task repositories.
//!
//! - Create, scope-by-owner lookups, partial update and status change
//! - Filtered listing with counts
//! - Cascade delete to invoice and task
//! - Single-query stats

use chrono::NaiveDate;
use influberry_core::invoice::InvoiceAmounts;
use influberry_db::models::engagement::{CreateEngagement, EngagementFilter, UpdateEngagement};
use influberry_db::models::invoice::CreateInvoice;
use influberry_db::models::task::{CreateEngagementTask, TodoFilter};
use influberry_db::models::user::CreateUser;
use influberry_db::repositories::{EngagementRepo, InvoiceRepo, TaskRepo, UserRepo};
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: None,
            plan_type: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_engagement(user_id: i64, name: &str, amount: i64, deadline: NaiveDate) -> CreateEngagement {
    CreateEngagement {
        user_id,
        counterparty_name: name.to_string(),
        amount: Decimal::from(amount),
        deadline,
        description: format!("{name} campaign"),
        display_name: None,
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_starts_proposed(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let e = EngagementRepo::create(&pool, &new_engagement(user_id, "Acme", 50_000, date(2025, 10, 1)))
        .await
        .unwrap();
    assert_eq!(e.status, "proposed");
    assert_eq!(e.amount, Decimal::from(50_000));
    assert_eq!(e.user_id, user_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_amount_must_be_positive(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let result =
        EngagementRepo::create(&pool, &new_engagement(user_id, "Zero", 0, date(2025, 10, 1))).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lookup_is_scoped_to_owner(pool: PgPool) {
    let owner = seed_user(&pool, "owner").await;
    let other = seed_user(&pool, "other").await;
    let e = EngagementRepo::create(&pool, &new_engagement(owner, "Acme", 1_000, date(2025, 10, 1)))
        .await
        .unwrap();

    assert!(EngagementRepo::find_for_user(&pool, owner, e.id)
        .await
        .unwrap()
        .is_some());
    assert!(EngagementRepo::find_for_user(&pool, other, e.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_and_set_status(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let e = EngagementRepo::create(&pool, &new_engagement(user_id, "Acme", 1_000, date(2025, 10, 1)))
        .await
        .unwrap();

    let updated = EngagementRepo::update(
        &pool,
        e.id,
        &UpdateEngagement {
            amount: Some(Decimal::new(250_050, 2)),
            notes: Some("bring samples".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.amount, Decimal::new(250_050, 2));
    assert_eq!(updated.notes.as_deref(), Some("bring samples"));
    assert_eq!(updated.counterparty_name, "Acme");

    let contracted = EngagementRepo::set_status(&pool, e.id, "contracted")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contracted.status, "contracted");
    assert!(contracted.updated_at >= updated.updated_at);

    assert!(EngagementRepo::set_status(&pool, e.id, "archived").await.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_orders_and_counts(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    for (name, day) in [("Late", 20), ("Early", 5), ("Middle", 10)] {
        EngagementRepo::create(&pool, &new_engagement(user_id, name, 1_000, date(2025, 10, day)))
            .await
            .unwrap();
    }

    let all = EngagementRepo::list(&pool, user_id, &EngagementFilter::default())
        .await
        .unwrap();
    let names: Vec<_> = all.iter().map(|e| e.counterparty_name.as_str()).collect();
    assert_eq!(names, ["Early", "Middle", "Late"]);

    let window = EngagementFilter {
        deadline_from: Some(date(2025, 10, 6)),
        deadline_to: Some(date(2025, 10, 31)),
        limit: Some(1),
        ..Default::default()
    };
    let page = EngagementRepo::list(&pool, user_id, &window).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].counterparty_name, "Middle");
    assert_eq!(EngagementRepo::count(&pool, user_id, &window).await.unwrap(), 2);

    let contracted = EngagementFilter {
        status: Some("contracted".to_string()),
        ..Default::default()
    };
    assert_eq!(EngagementRepo::count(&pool, user_id, &contracted).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_overdue_and_upcoming(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let today = date(2025, 9, 30);

    let past = EngagementRepo::create(&pool, &new_engagement(user_id, "Past", 1_000, date(2025, 9, 20)))
        .await
        .unwrap();
    let done = EngagementRepo::create(&pool, &new_engagement(user_id, "Done", 1_000, date(2025, 9, 21)))
        .await
        .unwrap();
    EngagementRepo::set_status(&pool, done.id, "completed").await.unwrap();
    let soon = EngagementRepo::create(&pool, &new_engagement(user_id, "Soon", 1_000, date(2025, 10, 7)))
        .await
        .unwrap();
    EngagementRepo::create(&pool, &new_engagement(user_id, "Later", 1_000, date(2025, 10, 8)))
        .await
        .unwrap();

    let overdue = EngagementRepo::list_overdue(&pool, user_id, today).await.unwrap();
    assert_eq!(overdue.iter().map(|e| e.id).collect::<Vec<_>>(), [past.id]);

    let upcoming = EngagementRepo::list_upcoming(&pool, user_id, today, date(2025, 10, 7))
        .await
        .unwrap();
    assert_eq!(upcoming.iter().map(|e| e.id).collect::<Vec<_>>(), [soon.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_cascades_to_invoice_and_task(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let e = EngagementRepo::create(&pool, &new_engagement(user_id, "Acme", 10_000, date(2025, 10, 1)))
        .await
        .unwrap();

    TaskRepo::create(
        &pool,
        &CreateEngagementTask {
            engagement_id: e.id,
            title: "Shoot video".to_string(),
            description: None,
            due_date: None,
            priority: None,
            importance: None,
        },
    )
    .await
    .unwrap();

    let invoice = InvoiceRepo::create(
        &pool,
        &CreateInvoice {
            user_id,
            engagement_id: e.id,
            invoice_number: "INV-202509-001".to_string(),
            invoice_date: date(2025, 9, 30),
            due_date: date(2025, 10, 30),
            amounts: InvoiceAmounts::compute(Decimal::from(10_000), Decimal::TEN).unwrap(),
            display_name: None,
            description: e.description.clone(),
            client_company: e.counterparty_name.clone(),
            client_address: None,
            client_contact: None,
            issuer_name: "creator".to_string(),
            issuer_address: None,
            issuer_email: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    assert!(EngagementRepo::delete(&pool, e.id).await.unwrap());

    assert!(InvoiceRepo::find_for_user(&pool, user_id, invoice.id)
        .await
        .unwrap()
        .is_none());
    assert!(TaskRepo::find(&pool, e.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_task_violates_primary_key(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let e = EngagementRepo::create(&pool, &new_engagement(user_id, "Acme", 1_000, date(2025, 10, 1)))
        .await
        .unwrap();
    let task = CreateEngagementTask {
        engagement_id: e.id,
        title: "Draft script".to_string(),
        description: None,
        due_date: Some(date(2025, 10, 1)),
        priority: Some("high".to_string()),
        importance: Some(4),
    };
    let created = TaskRepo::create(&pool, &task).await.unwrap();
    assert_eq!(created.state, "pending");

    let err = TaskRepo::create(&pool, &task).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_todos_filters_and_stats(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let today = date(2025, 9, 30);

    let specs = [
        ("A", Some(today), Some("high"), Some(5)),
        ("B", Some(date(2025, 10, 3)), Some("low"), Some(2)),
        ("C", Some(date(2025, 10, 20)), Some("high"), Some(5)),
    ];
    let mut ids = Vec::new();
    for (name, due, priority, importance) in specs {
        let e = EngagementRepo::create(&pool, &new_engagement(user_id, name, 1_000, date(2025, 10, 30)))
            .await
            .unwrap();
        TaskRepo::create(
            &pool,
            &CreateEngagementTask {
                engagement_id: e.id,
                title: format!("{name} task"),
                description: None,
                due_date: due,
                priority: priority.map(str::to_string),
                importance,
            },
        )
        .await
        .unwrap();
        ids.push(e.id);
    }
    // An engagement without a task never shows up as a todo.
    EngagementRepo::create(&pool, &new_engagement(user_id, "Plain", 1_000, date(2025, 10, 30)))
        .await
        .unwrap();

    TaskRepo::set_state(&pool, ids[2], "completed").await.unwrap();

    let all = TaskRepo::list_todos(&pool, user_id, &TodoFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].task_title, "A task");
    assert_eq!(all[0].engagement.counterparty_name, "A");

    let high = TodoFilter {
        priority: Some("high".to_string()),
        state: Some("pending".to_string()),
        ..Default::default()
    };
    let rows = TaskRepo::list_todos(&pool, user_id, &high).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].engagement.id, ids[0]);

    let stats = TaskRepo::stats(&pool, user_id, today).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.due_today, 1);
    assert_eq!(stats.due_soon, 2);
    assert_eq!(stats.high_priority, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_engagement_stats_single_query(pool: PgPool) {
    let user_id = seed_user(&pool, "creator").await;
    let other = seed_user(&pool, "other").await;

    EngagementRepo::create(&pool, &new_engagement(user_id, "P", 10_000, date(2025, 10, 1)))
        .await
        .unwrap();
    let contracted = EngagementRepo::create(&pool, &new_engagement(user_id, "C", 20_000, date(2025, 10, 1)))
        .await
        .unwrap();
    let completed = EngagementRepo::create(&pool, &new_engagement(user_id, "D", 30_000, date(2025, 10, 1)))
        .await
        .unwrap();
    EngagementRepo::set_status(&pool, contracted.id, "contracted").await.unwrap();
    EngagementRepo::set_status(&pool, completed.id, "completed").await.unwrap();
    EngagementRepo::create(&pool, &new_engagement(other, "X", 99_000, date(2025, 10, 1)))
        .await
        .unwrap();

    let stats = EngagementRepo::stats(&pool, user_id).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.proposed, 1);
    assert_eq!(stats.contracted, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total_earnings, Decimal::from(30_000));
    assert_eq!(stats.total_potential, Decimal::from(60_000));

    let empty = EngagementRepo::stats(&pool, seed_user(&pool, "nobody").await)
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.total_earnings, Decimal::ZERO);
}
