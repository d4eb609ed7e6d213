mod common;

use serde_json::{json, Value};
use rally::tools::{self, Caller};

fn sandbox() -> Caller {
    Caller::Sandbox
}

fn user(id: &str) -> Caller {
    Caller::Authenticated(id.to_string())
}

fn envelope_to_value(envelope: tools::ToolEnvelope) -> Value {
    serde_json::to_value(envelope).expect("serialize envelope")
}

#[tokio::test]
async fn unknown_tool_fails_inside_the_envelope() {
    let ctx = common::setup().await;
    let envelope = tools::dispatch(&ctx.pool, &sandbox(), "mint_nft", Value::Null).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["errorKind"], json!("validation_failed"));
    assert!(v.get("data").is_none());
}

#[tokio::test]
async fn sandbox_create_draft_validates_and_writes_nothing() {
    let ctx = common::setup().await;
    let args = json!({
        "title": "🏸 Badminton doubles",
        "category": "sports",
        "location_name": "Gym 3",
        "start_at": common::future_time(5),
        "max_participants": 4,
    });
    let envelope = tools::dispatch(&ctx.pool, &sandbox(), "create_draft", args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    let id = v["data"]["activity_id"].as_str().expect("activity id");
    assert!(id.starts_with("sandbox-"));
    assert_eq!(v["data"]["current_participants"], json!(1));

    // No durable mutation happened.
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities")
        .fetch_one(&ctx.pool)
        .await
        .expect("count");
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn sandbox_still_rejects_malformed_input() {
    let ctx = common::setup().await;
    let args = json!({
        "title": "Solo event",
        "category": "sports",
        "location_name": "Gym 3",
        "start_at": common::future_time(5),
        "max_participants": 1,
    });
    let envelope = tools::dispatch(&ctx.pool, &sandbox(), "create_draft", args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["errorKind"], json!("validation_failed"));
}

#[tokio::test]
async fn sandbox_refine_runs_the_same_field_validators() {
    let ctx = common::setup().await;

    let args = json!({
        "activity_id": "sandbox-activity",
        "category": "quantum",
    });
    let envelope = tools::dispatch(&ctx.pool, &sandbox(), "refine_draft", args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["errorKind"], json!("validation_failed"));

    let args = json!({
        "activity_id": "sandbox-activity",
        "title": "Renamed meetup",
        "max_participants": 6,
    });
    let envelope = tools::dispatch(&ctx.pool, &sandbox(), "refine_draft", args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["data"]["updated"]["title"], json!("Renamed meetup"));
}

#[tokio::test]
async fn sandbox_reads_resolve_to_the_synthetic_candidate() {
    let ctx = common::setup().await;

    let envelope = tools::dispatch(&ctx.pool, &sandbox(), "get_draft", Value::Null).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["data"]["draft"]["activity_id"], json!("sandbox-activity"));

    let envelope =
        tools::dispatch(&ctx.pool, &sandbox(), "get_activity_detail", Value::Null).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["data"]["activity_id"], json!("sandbox-activity"));
    assert_eq!(v["data"]["can_join"], json!(true));
}

#[tokio::test]
async fn ask_preference_packages_a_prompt() {
    let ctx = common::setup().await;
    let args = json!({
        "question_type": "location",
        "question": "Which side of town works for you?",
        "options": ["North", "Center", "South"],
        "collected_info": { "category": "food" },
    });
    let envelope = tools::dispatch(&ctx.pool, &user("u1"), "ask_preference", args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["data"]["kind"], json!("preference_prompt"));
    assert_eq!(v["data"]["options"].as_array().expect("options").len(), 3);
    assert_eq!(v["data"]["options"][1]["index"], json!(1));
    assert_eq!(v["data"]["skip"]["allowed"], json!(true));
    // The collected bag round-trips untouched.
    assert_eq!(v["data"]["collected_info"]["category"], json!("food"));
}

#[tokio::test]
async fn ask_preference_rejects_thin_option_sets() {
    let ctx = common::setup().await;
    let args = json!({
        "question_type": "type",
        "question": "What kind of activity?",
        "options": ["Food", "  "],
    });
    let envelope = tools::dispatch(&ctx.pool, &user("u1"), "ask_preference", args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["errorKind"], json!("validation_failed"));
}

#[tokio::test]
async fn authenticated_flow_draft_publish_join_through_dispatch() {
    let ctx = common::setup().await;

    let create_args = json!({
        "title": "🀄️ 观音桥麻将局",
        "category": "games",
        "location_name": "观音桥",
        "start_at": common::future_time(12),
        "max_participants": 4,
        "summary": "Three rounds, beginners welcome.",
    });
    let envelope = tools::dispatch(&ctx.pool, &user("host"), "create_draft", create_args).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    let activity_id = v["data"]["activity_id"].as_str().expect("id").to_string();

    // Loose reference finds the draft we just made.
    let envelope = tools::dispatch(
        &ctx.pool,
        &user("host"),
        "get_draft",
        json!({ "title_hint": "麻将" }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["data"]["draft"]["activity_id"], json!(activity_id.clone()));

    let envelope = tools::dispatch(
        &ctx.pool,
        &user("host"),
        "publish_activity",
        json!({ "activity_id": activity_id }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["data"]["remaining_quota"], json!(2));

    let envelope = tools::dispatch(
        &ctx.pool,
        &user("guest"),
        "join_activity",
        json!({ "activity_id": activity_id }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["data"]["current_participants"], json!(2));

    let envelope = tools::dispatch(
        &ctx.pool,
        &user("guest"),
        "join_activity",
        json!({ "activity_id": activity_id }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["errorKind"], json!("already_joined"));

    let envelope = tools::dispatch(
        &ctx.pool,
        &user("host"),
        "get_my_activities",
        json!({ "filter": "created" }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["data"]["activities"].as_array().expect("list").len(), 1);
}

#[tokio::test]
async fn missing_required_args_fail_validation() {
    let ctx = common::setup().await;
    let envelope =
        tools::dispatch(&ctx.pool, &user("u1"), "publish_activity", json!({})).await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(false));
    assert_eq!(v["errorKind"], json!("validation_failed"));

    let envelope =
        tools::dispatch(&ctx.pool, &user("u1"), "get_my_activities", json!({ "filter": "starred" }))
            .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["errorKind"], json!("validation_failed"));
}

#[tokio::test]
async fn cancel_intent_round_trip_through_dispatch() {
    let ctx = common::setup().await;
    let now = chrono::Utc::now().to_rfc3339();
    rally::database::intent_repo::insert_intent(&ctx.pool, "intent-9", "u1", Some("badminton"), &now)
        .await
        .expect("seed intent");

    let envelope = tools::dispatch(
        &ctx.pool,
        &user("u1"),
        "cancel_intent",
        json!({ "intent_id": "intent-9" }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["success"], json!(true));
    assert_eq!(v["data"]["status"], json!("cancelled"));

    let envelope = tools::dispatch(
        &ctx.pool,
        &user("u1"),
        "cancel_intent",
        json!({ "intent_id": "intent-9" }),
    )
    .await;
    let v = envelope_to_value(envelope);
    assert_eq!(v["errorKind"], json!("duplicate_action"));
}
