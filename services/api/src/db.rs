//! Data Access Layer
//!
//! This module contains all the functions for interacting with the PostgreSQL database.
//! Queries are checked at runtime so the crate builds without a live database.

use anyhow::{Context, Result};
use interviewer_core::agent::InterviewAgent;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Interview, InterviewStatus, Message, MessageRole};

const INTERVIEW_COLUMNS: &str =
    "id, user_id, candidate_name, topic, status, created_at, updated_at";

/// A wrapper around the `PgPool` to provide a clear data access interface.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs all pending `sqlx` migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Creates an interview, its initial agent state and the opening
    /// interviewer message in a single transaction.
    pub async fn create_interview(
        &self,
        user_id: &str,
        initial_state: &InterviewAgent,
        greeting: &str,
    ) -> Result<Interview> {
        let mut tx = self.pool.begin().await?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            "INSERT INTO interviews (user_id, candidate_name, topic) VALUES ($1, $2, $3) \
             RETURNING {INTERVIEW_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&initial_state.candidate_name)
        .bind(&initial_state.topic)
        .fetch_one(&mut *tx)
        .await?;

        let state_json = serde_json::to_value(initial_state)?;
        sqlx::query("INSERT INTO agent_states (interview_id, state_json) VALUES ($1, $2)")
            .bind(interview.id)
            .bind(state_json)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO messages (interview_id, role, content) VALUES ($1, $2, $3)")
            .bind(interview.id)
            .bind(MessageRole::Interviewer)
            .bind(greeting)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(interview)
    }

    /// Retrieves a single interview by its ID, scoped to a specific user.
    pub async fn get_interview(
        &self,
        interview_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = $1 AND user_id = $2"
        ))
        .bind(interview_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    /// Lists all interviews for a given user, most recent first.
    pub async fn list_interviews(&self, user_id: &str) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    /// Retrieves the full transcript for an interview, oldest first.
    pub async fn get_interview_messages(&self, interview_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, interview_id, role, content, created_at FROM messages \
             WHERE interview_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Retrieves the most recent agent state for an interview.
    pub async fn get_latest_agent_state(
        &self,
        interview_id: Uuid,
    ) -> Result<Option<InterviewAgent>> {
        latest_agent_state(&self.pool, interview_id).await
    }

    /// Locks the interview row with `SELECT ... FOR UPDATE` and loads its
    /// latest agent state inside the same transaction.
    ///
    /// Other writers to the same interview block until the returned guard
    /// commits or is dropped. Dropping it rolls back.
    pub async fn lock_interview(&self, interview_id: Uuid) -> Result<Option<LockedInterview>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(InterviewStatus,)> =
            sqlx::query_as("SELECT status FROM interviews WHERE id = $1 FOR UPDATE")
                .bind(interview_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((status,)) = row else {
            return Ok(None);
        };

        let agent = latest_agent_state(&mut *tx, interview_id)
            .await?
            .context("Interview has no stored agent state")?;

        Ok(Some(LockedInterview {
            tx,
            interview_id,
            status,
            agent,
        }))
    }
}

async fn latest_agent_state<'e, E>(
    executor: E,
    interview_id: Uuid,
) -> Result<Option<InterviewAgent>>
where
    E: PgExecutor<'e>,
{
    let record: Option<(serde_json::Value,)> = sqlx::query_as(
        "SELECT state_json FROM agent_states WHERE interview_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(interview_id)
    .fetch_optional(executor)
    .await?;

    record
        .map(|(state_json,)| {
            serde_json::from_value(state_json).context("Stored agent state is malformed")
        })
        .transpose()
}

/// An interview row held under a row lock, with the agent state read while
/// holding it.
pub struct LockedInterview {
    tx: Transaction<'static, Postgres>,
    pub interview_id: Uuid,
    pub status: InterviewStatus,
    pub agent: InterviewAgent,
}

impl LockedInterview {
    /// Writes one completed turn and commits: both transcript messages, the
    /// new agent state, and the `ended` status once the agent has finished.
    ///
    /// Returns the agent state that was stored.
    pub async fn record_turn(
        mut self,
        candidate_text: &str,
        interviewer_text: &str,
    ) -> Result<InterviewAgent> {
        for (role, content) in [
            (MessageRole::Candidate, candidate_text),
            (MessageRole::Interviewer, interviewer_text),
        ] {
            sqlx::query("INSERT INTO messages (interview_id, role, content) VALUES ($1, $2, $3)")
                .bind(self.interview_id)
                .bind(role)
                .bind(content)
                .execute(&mut *self.tx)
                .await?;
        }

        self.insert_agent_state().await?;
        if self.agent.finished {
            self.write_status(InterviewStatus::Ended).await?;
        }

        self.tx.commit().await?;
        Ok(self.agent)
    }

    /// Sets the interview status and commits. Ending an interview also
    /// finishes its agent so no further turns are accepted.
    pub async fn set_status(mut self, status: InterviewStatus) -> Result<Interview> {
        if status == InterviewStatus::Ended && !self.agent.finished {
            self.agent.finish();
            self.insert_agent_state().await?;
        }
        let interview = self.write_status(status).await?;
        self.tx.commit().await?;
        Ok(interview)
    }

    async fn insert_agent_state(&mut self) -> Result<()> {
        let state_json = serde_json::to_value(&self.agent)?;
        sqlx::query("INSERT INTO agent_states (interview_id, state_json) VALUES ($1, $2)")
            .bind(self.interview_id)
            .bind(state_json)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn write_status(&mut self, status: InterviewStatus) -> Result<Interview> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "UPDATE interviews SET status = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {INTERVIEW_COLUMNS}"
        ))
        .bind(status)
        .bind(self.interview_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(interview)
    }
}
