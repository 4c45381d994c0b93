use crate::dto::question_dto::NewQuestionPayload;
use crate::dto::test_dto::{CreateTestRequest, TestSummary};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::role::{authorize, Role};
use crate::models::test::Test;
use crate::services::question_service::QuestionService;
use sqlx::types::Json;
use sqlx::PgPool;

#[derive(Clone)]
pub struct TestService {
    pool: PgPool,
    questions: QuestionService,
}

impl TestService {
    pub fn new(pool: PgPool) -> Self {
        let questions = QuestionService::new(pool.clone());
        Self { pool, questions }
    }

    pub async fn create_test(&self, req: CreateTestRequest, creator_id: i64) -> Result<i64> {
        let test_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tests (title, description, creator_id, grading_system, is_open)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(creator_id)
        .bind(Json(&req.grading_system))
        .bind(req.is_open.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Test {} created by user {}", test_id, creator_id);
        Ok(test_id)
    }

    pub async fn list_open_tests(&self) -> Result<Vec<TestSummary>> {
        let tests = sqlx::query_as::<_, TestSummary>(
            r#"
            SELECT t.id, t.title, t.description, t.grading_system, t.is_open,
                   u.id AS creator_id, u.first_name AS creator_first_name,
                   u.last_name AS creator_last_name
            FROM tests t
            JOIN users u ON t.creator_id = u.id
            WHERE t.is_open = TRUE
            ORDER BY t.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tests)
    }

    pub async fn get_summary(&self, test_id: i64) -> Result<TestSummary> {
        let test = sqlx::query_as::<_, TestSummary>(
            r#"
            SELECT t.id, t.title, t.description, t.grading_system, t.is_open,
                   u.id AS creator_id, u.first_name AS creator_first_name,
                   u.last_name AS creator_last_name
            FROM tests t
            JOIN users u ON t.creator_id = u.id
            WHERE t.id = $1
            "#,
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;
        Ok(test)
    }

    pub async fn get_test(&self, test_id: i64) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>("SELECT * FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;
        Ok(test)
    }

    /// Adds a question to a test. Only the test's creator (or an admin)
    /// may modify it.
    pub async fn add_question(
        &self,
        test_id: i64,
        caller: &Claims,
        payload: NewQuestionPayload,
    ) -> Result<i64> {
        let creator_id: i64 = sqlx::query_scalar("SELECT creator_id FROM tests WHERE id = $1")
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;

        if creator_id != caller.sub && !authorize(caller.role, Role::Admin) {
            return Err(Error::Forbidden(
                "You cannot modify this test".to_string(),
            ));
        }

        let question_id = self.questions.create(&payload).await?;
        sqlx::query("INSERT INTO test_questions (test_id, question_id) VALUES ($1, $2)")
            .bind(test_id)
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Question {} added to test {}", question_id, test_id);
        Ok(question_id)
    }

    pub async fn add_favorite(&self, user_id: i64, test_id: i64) -> Result<()> {
        // Existence check first so an unknown id is a 404, not a silent no-op.
        self.get_test(test_id).await?;
        sqlx::query(
            "INSERT INTO favorites (user_id, test_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(test_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub fn questions(&self) -> &QuestionService {
        &self.questions
    }
}
