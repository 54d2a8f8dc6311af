//! PostgreSQL 仓储集成测试
//!
//! 需要可用的数据库：
//! DATABASE_URL=postgres://... cargo test -p recognition-engine -- --ignored

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use recognition_engine::catalog::seed_catalog;
use recognition_engine::repository::{
    AwardRepository, BadgeRepository, CounterRepository, KudoRepository, KudoRepositoryTrait,
    PeerGrantRepository, UserRepository, UserRepositoryTrait,
};
use recognition_engine::{
    InsertOutcome, KudoDirection, LeaderboardKind, NewAward, NewKudo, NewPeerGrant,
    PeerGrantInsert, TriggerKind,
};
use recognition_shared::database::Database;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::from_pool(PgPool::connect(&url).await.unwrap());
    db.health_check().await.unwrap();
    db.run_migrations().await.unwrap();
    db.pool().clone()
}

async fn create_user(pool: &PgPool) -> (i64, String) {
    let username = format!("user-{}", Uuid::new_v4());
    let id: i64 = sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(&username)
        .fetch_one(pool)
        .await
        .unwrap();
    (id, username)
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_catalog_seed_and_unheld_query() {
    let pool = pool().await;
    let badges = BadgeRepository::new(pool.clone());
    let awards = AwardRepository::new(pool.clone());
    seed_catalog(&badges).await.unwrap();
    let (user_id, _) = create_user(&pool).await;

    let first_pr = badges.find_by_slug("first-pr").await.unwrap().unwrap();
    assert_eq!(first_pr.trigger_kind, TriggerKind::PullRequests);

    let before = badges
        .list_unheld_automatic(user_id, Some(TriggerKind::PullRequests))
        .await
        .unwrap();
    assert!(before.iter().any(|b| b.id == first_pr.id));

    awards
        .insert_if_absent(&NewAward {
            user_id,
            badge_id: first_pr.id,
            awarded_by: "system".to_string(),
            reason: None,
            awarded_at: Utc::now(),
        })
        .await
        .unwrap();

    let after = badges
        .list_unheld_automatic(user_id, Some(TriggerKind::PullRequests))
        .await
        .unwrap();
    assert!(after.iter().all(|b| b.id != first_pr.id));
    assert!(after.iter().all(|b| !b.trigger_kind.is_manual()));
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_insert_if_absent_and_delete() {
    let pool = pool().await;
    let badges = BadgeRepository::new(pool.clone());
    let awards = AwardRepository::new(pool.clone());
    seed_catalog(&badges).await.unwrap();
    let (user_id, _) = create_user(&pool).await;
    let mvp = badges.find_by_slug("mvp").await.unwrap().unwrap();

    let award = NewAward {
        user_id,
        badge_id: mvp.id,
        awarded_by: "lead".to_string(),
        reason: Some("Shipped".to_string()),
        awarded_at: Utc::now(),
    };
    assert!(matches!(
        awards.insert_if_absent(&award).await.unwrap(),
        InsertOutcome::Inserted(_)
    ));
    assert_eq!(
        awards.insert_if_absent(&award).await.unwrap(),
        InsertOutcome::AlreadyExists
    );

    assert!(awards.delete_award(user_id, mvp.id).await.unwrap());
    assert!(!awards.delete_award(user_id, mvp.id).await.unwrap());
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_quota_critical_section_under_concurrency() {
    let pool = pool().await;
    let grants = Arc::new(PeerGrantRepository::new(pool.clone()));
    let (from, _) = create_user(&pool).await;
    let (to, _) = create_user(&pool).await;
    let granted_at = Utc.with_ymd_and_hms(2025, 5, 5, 10, 0, 0).unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let grants = grants.clone();
            tokio::spawn(async move {
                grants
                    .record_grant_within_quota(
                        &NewPeerGrant {
                            from_user_id: from,
                            to_user_id: to,
                            message: "Thanks for the help".to_string(),
                            granted_at,
                        },
                        2,
                    )
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut recorded = 0;
    for handle in handles {
        if let PeerGrantInsert::Recorded(_) = handle.await.unwrap() {
            recorded += 1;
        }
    }

    assert_eq!(recorded, 2);
    assert_eq!(grants.count_grants_in_year(from, 2025).await.unwrap(), 2);
    assert_eq!(grants.count_grants_in_year(from, 2026).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_counters_and_user_lookup() {
    let pool = pool().await;
    let users = UserRepository::new(pool.clone());
    let counters = CounterRepository::new(pool.clone());
    let (user_id, username) = create_user(&pool).await;

    sqlx::query(
        "INSERT INTO github_stats (user_id, commits, pull_requests, reviews, issues_closed) VALUES ($1, 5, 3, 2, 1)",
    )
    .bind(user_id)
    .execute(&pool)
    .await
    .unwrap();

    let found = users
        .find_by_username(&username.to_uppercase())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user_id);

    let snapshot = counters.fetch_counters(user_id, Utc::now()).await.unwrap();
    assert_eq!(snapshot.pull_requests, 3);
    assert_eq!(snapshot.github_commits, 5);
    assert_eq!(snapshot.code_reviews, 2);
    assert_eq!(snapshot.issues_closed, 1);
    assert_eq!(snapshot.tenure_days, 0);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_kudo_listing_and_leaderboard() {
    let pool = pool().await;
    let users = UserRepository::new(pool.clone());
    let kudos = KudoRepository::new(pool.clone());
    let (ana, _) = create_user(&pool).await;
    let (ben, _) = create_user(&pool).await;
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    for is_public in [true, false, true] {
        kudos
            .create(&NewKudo {
                from_user_id: ana,
                to_user_id: ben,
                message: "thanks for the review".to_string(),
                category: None,
                is_public,
                created_at: at,
            })
            .await
            .unwrap();
    }

    let public = kudos
        .list_for_user(ben, KudoDirection::Received, false, 50)
        .await
        .unwrap();
    assert_eq!(public.len(), 2);
    assert!(public[0].id > public[1].id);

    let all = kudos.list_for_user(ana, KudoDirection::All, true, 50).await.unwrap();
    assert_eq!(all.len(), 3);

    let page = kudos.list_public(1, Some(public[0].id)).await.unwrap();
    assert!(page.iter().all(|k| k.is_public && k.id != public[0].id));

    let found = users.find_by_ids(&[ana, ben]).await.unwrap();
    assert_eq!(found.len(), 2);

    let board = users.leaderboard(LeaderboardKind::KudosSent, 5).await.unwrap();
    assert!(board.len() <= 5);
    assert!(board.windows(2).all(|w| w[0].count >= w[1].count && w[1].rank == w[0].rank + 1));
}

