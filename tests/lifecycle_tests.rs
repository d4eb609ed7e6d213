mod common;

use rally::error::ServiceError;
use rally::services::activity_service::{self, MyActivitiesFilter, RefineDraftInput};
use rally::services::resolver_service::ActivityRef;
use rally::services::roster_service;

fn patch(activity_id: &str) -> RefineDraftInput {
    RefineDraftInput {
        activity_id: activity_id.to_string(),
        title: None,
        category: None,
        location_name: None,
        location_hint: None,
        latitude: None,
        longitude: None,
        start_at: None,
        max_participants: None,
        summary: None,
        reason: None,
    }
}

#[tokio::test]
async fn refine_overwrites_only_the_fields_present() {
    let ctx = common::setup().await;
    let draft_id = common::create_draft(&ctx.pool, "creator", "Calligraphy class", 6).await;

    let view = activity_service::refine_draft(
        &ctx.pool,
        "creator",
        &RefineDraftInput {
            title: Some("Calligraphy & tea".to_string()),
            max_participants: Some(8),
            ..patch(&draft_id)
        },
    )
    .await
    .expect("refine");

    assert_eq!(view.title, "Calligraphy & tea");
    assert_eq!(view.max_participants, 8);
    // Untouched fields keep their prior values.
    assert_eq!(view.category, "social");
    assert_eq!(view.location_name, "Riverside Park");
    assert_eq!(view.status, "draft");
}

#[tokio::test]
async fn refine_is_creator_only_and_draft_only() {
    let ctx = common::setup().await;
    let draft_id = common::create_draft(&ctx.pool, "creator", "Chess night", 4).await;

    let err = activity_service::refine_draft(
        &ctx.pool,
        "stranger",
        &RefineDraftInput {
            title: Some("Hijacked".to_string()),
            ..patch(&draft_id)
        },
    )
    .await
    .expect_err("not the creator");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    activity_service::publish_activity(&ctx.pool, "creator", &draft_id)
        .await
        .expect("publish");
    let err = activity_service::refine_draft(
        &ctx.pool,
        "creator",
        &RefineDraftInput {
            title: Some("Too late".to_string()),
            ..patch(&draft_id)
        },
    )
    .await
    .expect_err("no longer a draft");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn refine_rejects_invalid_field_values() {
    let ctx = common::setup().await;
    let draft_id = common::create_draft(&ctx.pool, "creator", "Pottery", 4).await;

    let err = activity_service::refine_draft(
        &ctx.pool,
        "creator",
        &RefineDraftInput {
            max_participants: Some(1),
            ..patch(&draft_id)
        },
    )
    .await
    .expect_err("below minimum");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));

    let err = activity_service::refine_draft(
        &ctx.pool,
        "creator",
        &RefineDraftInput {
            category: Some("quantum".to_string()),
            ..patch(&draft_id)
        },
    )
    .await
    .expect_err("unknown category");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));
}

#[tokio::test]
async fn cancel_works_once_from_draft_or_active() {
    let ctx = common::setup().await;

    let draft_id = common::create_draft(&ctx.pool, "creator", "Draft plan", 4).await;
    activity_service::cancel_activity(&ctx.pool, "creator", &draft_id, Some("rained out"))
        .await
        .expect("cancel draft");
    assert_eq!(common::activity_status(&ctx.pool, &draft_id).await, "cancelled");

    let active_id = common::create_published(&ctx.pool, "creator", "Active plan", 4).await;
    activity_service::cancel_activity(&ctx.pool, "creator", &active_id, None)
        .await
        .expect("cancel active");

    // Cancelling again is an error, not a no-op.
    let err = activity_service::cancel_activity(&ctx.pool, "creator", &active_id, None)
        .await
        .expect_err("already cancelled");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn cancel_completed_is_invalid_state() {
    let ctx = common::setup().await;
    let activity_id = common::create_published(&ctx.pool, "creator", "Past event", 4).await;
    // The external scheduler owns this transition; simulate its outcome.
    common::set_status(&ctx.pool, &activity_id, "completed").await;

    let err = activity_service::cancel_activity(&ctx.pool, "creator", &activity_id, None)
        .await
        .expect_err("completed is terminal");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn detail_reports_membership_and_joinability() {
    let ctx = common::setup().await;
    let activity_id = common::create_published(&ctx.pool, "creator", "Cycling tour", 3).await;

    let by_id = ActivityRef {
        activity_id: Some(activity_id.clone()),
        title_hint: None,
    };

    let view = activity_service::get_activity_detail(&ctx.pool, "user-a", &by_id)
        .await
        .expect("detail for outsider");
    assert!(view.can_join);
    assert!(!view.is_joined);
    assert_eq!(view.participants.len(), 1); // the creator

    roster_service::join_activity(&ctx.pool, "user-a", &activity_id)
        .await
        .expect("join");
    let view = activity_service::get_activity_detail(&ctx.pool, "user-a", &by_id)
        .await
        .expect("detail for member");
    assert!(view.is_joined);
    assert!(!view.can_join);
    assert_eq!(view.participants.len(), 2);

    let view = activity_service::get_activity_detail(&ctx.pool, "creator", &by_id)
        .await
        .expect("detail for creator");
    assert!(view.is_creator);
    assert!(!view.can_join);
}

#[tokio::test]
async fn drafts_stay_private_until_published() {
    let ctx = common::setup().await;
    let draft_id = common::create_draft(&ctx.pool, "creator", "Secret plan", 4).await;

    let reference = ActivityRef {
        activity_id: Some(draft_id.clone()),
        title_hint: None,
    };
    let err = activity_service::get_activity_detail(&ctx.pool, "stranger", &reference)
        .await
        .expect_err("draft hidden from others");
    assert!(matches!(err, ServiceError::NotFound(_)));

    activity_service::get_activity_detail(&ctx.pool, "creator", &reference)
        .await
        .expect("creator sees own draft");
}

#[tokio::test]
async fn my_activities_separates_created_from_joined() {
    let ctx = common::setup().await;
    let mine = common::create_published(&ctx.pool, "user-a", "Mine", 4).await;
    let theirs = common::create_published(&ctx.pool, "user-b", "Theirs", 4).await;
    roster_service::join_activity(&ctx.pool, "user-a", &theirs)
        .await
        .expect("join theirs");

    let created =
        activity_service::get_my_activities(&ctx.pool, "user-a", MyActivitiesFilter::Created, 10)
            .await
            .expect("created list");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].activity_id, mine);
    assert!(created[0].is_creator);

    let joined =
        activity_service::get_my_activities(&ctx.pool, "user-a", MyActivitiesFilter::Joined, 10)
            .await
            .expect("joined list");
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].activity_id, theirs);
    assert!(!joined[0].is_creator);
}

#[tokio::test]
async fn create_rejects_malformed_input() {
    let ctx = common::setup().await;

    let mut input = common::draft_input("", 4);
    let err = activity_service::create_draft(&ctx.pool, "creator", &input)
        .await
        .expect_err("empty title");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));

    input = common::draft_input("Ok title", 51);
    let err = activity_service::create_draft(&ctx.pool, "creator", &input)
        .await
        .expect_err("capacity above bound");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));

    input = common::draft_input("Ok title", 4);
    input.start_at = "next tuesday".to_string();
    let err = activity_service::create_draft(&ctx.pool, "creator", &input)
        .await
        .expect_err("unparseable start");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));

    input = common::draft_input("Ok title", 4);
    input.latitude = Some(120.0);
    let err = activity_service::create_draft(&ctx.pool, "creator", &input)
        .await
        .expect_err("latitude out of range");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));
}

#[tokio::test]
async fn refine_cannot_shrink_capacity_below_roster() {
    let ctx = common::setup().await;
    let activity_id = common::create_published(&ctx.pool, "creator", "Climbing", 5).await;
    roster_service::join_activity(&ctx.pool, "user-a", &activity_id)
        .await
        .expect("join a");
    roster_service::join_activity(&ctx.pool, "user-b", &activity_id)
        .await
        .expect("join b");
    // Back to draft to make refinement legal, with three people in.
    common::set_status(&ctx.pool, &activity_id, "draft").await;

    let err = activity_service::refine_draft(
        &ctx.pool,
        "creator",
        &RefineDraftInput {
            max_participants: Some(2),
            ..patch(&activity_id)
        },
    )
    .await
    .expect_err("three people are already in");
    assert!(matches!(err, ServiceError::ValidationFailed(_)));

    let view = activity_service::refine_draft(
        &ctx.pool,
        "creator",
        &RefineDraftInput {
            max_participants: Some(3),
            ..patch(&activity_id)
        },
    )
    .await
    .expect("shrinking to the roster size is fine");
    assert_eq!(view.max_participants, 3);
}
