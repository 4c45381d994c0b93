use crate::dto::question_dto::NewQuestionPayload;
use crate::error::Result;
use crate::models::question::{AnswerOption, Image, Question};
use sqlx::PgPool;

/// Shared question storage: tests and olympiads draw from the same
/// `questions`/`answers` tables and differ only in their link table.
#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a question with its options and optional image, returning
    /// the generated question id. Linking to an assessment is the
    /// caller's step.
    pub async fn create(&self, payload: &NewQuestionPayload) -> Result<i64> {
        let image_id = match &payload.image {
            Some(image) => {
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO images (data, mime_type) VALUES ($1, $2) RETURNING id",
                )
                .bind(&image.data)
                .bind(&image.mime_type)
                .fetch_one(&self.pool)
                .await?;
                Some(id)
            }
            None => None,
        };

        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (content, question_type, points, image_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&payload.content)
        .bind(payload.question_type)
        .bind(payload.points)
        .bind(image_id)
        .fetch_one(&self.pool)
        .await?;

        for answer in &payload.answers {
            sqlx::query("INSERT INTO answers (question_id, content, is_correct) VALUES ($1, $2, $3)")
                .bind(question_id)
                .bind(&answer.content)
                .bind(answer.is_correct)
                .execute(&self.pool)
                .await?;
        }

        Ok(question_id)
    }

    pub async fn for_test(&self, test_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.content, q.question_type, q.points, q.image_id
            FROM questions q
            JOIN test_questions tq ON q.id = tq.question_id
            WHERE tq.test_id = $1
            ORDER BY tq.id
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn for_olympiad(&self, olympiad_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.content, q.question_type, q.points, q.image_id
            FROM questions q
            JOIN olympiad_questions oq ON q.id = oq.question_id
            WHERE oq.olympiad_id = $1
            ORDER BY oq.id
            "#,
        )
        .bind(olympiad_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn options_for_test(&self, test_id: i64) -> Result<Vec<AnswerOption>> {
        let options = sqlx::query_as::<_, AnswerOption>(
            r#"
            SELECT a.id, a.question_id, a.content, a.is_correct
            FROM answers a
            JOIN test_questions tq ON a.question_id = tq.question_id
            WHERE tq.test_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    pub async fn options_for_olympiad(&self, olympiad_id: i64) -> Result<Vec<AnswerOption>> {
        let options = sqlx::query_as::<_, AnswerOption>(
            r#"
            SELECT a.id, a.question_id, a.content, a.is_correct
            FROM answers a
            JOIN olympiad_questions oq ON a.question_id = oq.question_id
            WHERE oq.olympiad_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(olympiad_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    pub async fn total_points_for_test(&self, test_id: i64) -> Result<i32> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(q.points) FROM questions q
            JOIN test_questions tq ON q.id = tq.question_id
            WHERE tq.test_id = $1
            "#,
        )
        .bind(test_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(0) as i32)
    }

    pub async fn total_points_for_olympiad(&self, olympiad_id: i64) -> Result<i32> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(q.points) FROM questions q
            JOIN olympiad_questions oq ON q.id = oq.question_id
            WHERE oq.olympiad_id = $1
            "#,
        )
        .bind(olympiad_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or(0) as i32)
    }

    pub async fn belongs_to_test(&self, test_id: i64, question_id: i64) -> Result<bool> {
        let exists: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM test_questions WHERE test_id = $1 AND question_id = $2",
        )
        .bind(test_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    pub async fn belongs_to_olympiad(&self, olympiad_id: i64, question_id: i64) -> Result<bool> {
        let exists: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM olympiad_questions WHERE olympiad_id = $1 AND question_id = $2",
        )
        .bind(olympiad_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    pub async fn get_image(&self, image_id: i64) -> Result<Image> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, data, mime_type FROM images WHERE id = $1",
        )
        .bind(image_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }
}
