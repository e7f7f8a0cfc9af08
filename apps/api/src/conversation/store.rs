use serde_json::Value;
use sqlx::{PgExecutor, PgPool, Result};
use tracing::info;
use uuid::Uuid;

use crate::insights::{Insight, Phase};
use crate::llm_client::ChatRole;
use crate::models::conversation::{ConversationRow, MessageRow};

/// Creates a conversation in the first phase with no insights.
pub async fn create_conversation(pool: &PgPool, user_id: Uuid) -> Result<ConversationRow> {
    let row = sqlx::query_as::<_, ConversationRow>(
        r#"
        INSERT INTO conversations (user_id, phase)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(Phase::Context.as_str())
    .fetch_one(pool)
    .await?;

    info!("Created conversation {} for user {user_id}", row.id);
    Ok(row)
}

pub async fn get_conversation(pool: &PgPool, id: Uuid) -> Result<Option<ConversationRow>> {
    sqlx::query_as::<_, ConversationRow>("SELECT * FROM conversations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Returns all messages of a conversation, oldest first.
pub async fn list_messages(pool: &PgPool, conversation_id: Uuid) -> Result<Vec<MessageRow>> {
    sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT *
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await
}

pub async fn append_message<'e, E>(
    executor: E,
    conversation_id: Uuid,
    role: ChatRole,
    content: &str,
) -> Result<MessageRow>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (conversation_id, role, content)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(conversation_id)
    .bind(role.as_str())
    .bind(content)
    .fetch_one(executor)
    .await
}

/// Persists the merged insight list and confidence produced by a turn.
pub async fn save_turn_state<'e, E>(
    executor: E,
    id: Uuid,
    insights: &[Insight],
    confidence: u8,
) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let insights: Vec<String> = insights.iter().map(Insight::to_string).collect();
    sqlx::query(
        r#"
        UPDATE conversations
        SET insights = $1, confidence = $2, updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(&insights)
    .bind(i32::from(confidence))
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Writes both messages of a turn and its resulting state atomically.
/// Any failure rolls the whole turn back.
pub async fn save_turn(
    pool: &PgPool,
    id: Uuid,
    user_message: &str,
    assistant_message: &str,
    insights: &[Insight],
    confidence: u8,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    append_message(&mut *tx, id, ChatRole::User, user_message).await?;
    append_message(&mut *tx, id, ChatRole::Assistant, assistant_message).await?;
    save_turn_state(&mut *tx, id, insights, confidence).await?;
    tx.commit().await
}

/// Moves the conversation to `phase` and stores the confidence recomputed for it.
pub async fn set_phase(pool: &PgPool, id: Uuid, phase: Phase, confidence: u8) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE conversations
        SET phase = $1, confidence = $2, updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(phase.as_str())
    .bind(i32::from(confidence))
    .bind(id)
    .execute(pool)
    .await?;

    info!("Conversation {id} moved to phase {phase}");
    Ok(())
}

pub async fn save_scenarios(pool: &PgPool, id: Uuid, scenarios: &Value) -> Result<()> {
    sqlx::query("UPDATE conversations SET scenarios = $1, updated_at = now() WHERE id = $2")
        .bind(scenarios)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn save_action_plan(pool: &PgPool, id: Uuid, plan: &Value) -> Result<()> {
    sqlx::query("UPDATE conversations SET action_plan = $1, updated_at = now() WHERE id = $2")
        .bind(plan)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    async fn test_pool() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL pointing at a disposable Postgres"]
    async fn test_failed_turn_write_leaves_no_messages() {
        let pool = test_pool().await;
        let conversation = create_conversation(&pool, Uuid::new_v4()).await.unwrap();

        // 101 violates the confidence CHECK, so the last statement fails.
        let result = save_turn(&pool, conversation.id, "Hej", "Hej! Berätta mer.", &[], 101).await;
        assert!(result.is_err());
        assert!(list_messages(&pool, conversation.id).await.unwrap().is_empty());

        let row = get_conversation(&pool, conversation.id).await.unwrap().unwrap();
        assert_eq!(row.confidence, 0);
        assert!(row.insights.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL pointing at a disposable Postgres"]
    async fn test_turn_write_stores_messages_in_order() {
        let pool = test_pool().await;
        let conversation = create_conversation(&pool, Uuid::new_v4()).await.unwrap();
        let insights = [Insight::new("Roll", "Senior Backend Developer")];

        save_turn(&pool, conversation.id, "Hej", "Hej! Berätta mer.", &insights, 20)
            .await
            .unwrap();

        let roles: Vec<String> = list_messages(&pool, conversation.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec!["user", "assistant"]);

        let row = get_conversation(&pool, conversation.id).await.unwrap().unwrap();
        assert_eq!(row.confidence, 20);
        assert_eq!(row.insights, vec!["Roll: Senior Backend Developer"]);
    }
}
