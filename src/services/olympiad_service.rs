use crate::dto::olympiad_dto::{CreateOlympiadRequest, OlympiadSummary};
use crate::dto::question_dto::NewQuestionPayload;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::olympiad::Olympiad;
use crate::models::role::{authorize, Role};
use crate::services::question_service::QuestionService;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;

#[derive(Clone)]
pub struct OlympiadService {
    pool: PgPool,
    questions: QuestionService,
}

impl OlympiadService {
    pub fn new(pool: PgPool) -> Self {
        let questions = QuestionService::new(pool.clone());
        Self { pool, questions }
    }

    pub async fn create_olympiad(
        &self,
        req: CreateOlympiadRequest,
        creator_id: i64,
    ) -> Result<i64> {
        if req.end_time <= req.start_time {
            return Err(Error::BadRequest(
                "end_time must be after start_time".to_string(),
            ));
        }

        let olympiad_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO olympiads
                (title, description, creator_id, grading_system, start_time, end_time, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(creator_id)
        .bind(Json(&req.grading_system))
        .bind(req.start_time)
        .bind(req.end_time)
        .bind(req.duration_minutes)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Olympiad {} created by user {}", olympiad_id, creator_id);
        Ok(olympiad_id)
    }

    /// Teachers and admins see every olympiad; students only those whose
    /// time window is currently open.
    pub async fn list_olympiads(&self, caller_role: Role) -> Result<Vec<OlympiadSummary>> {
        let query = if authorize(caller_role, Role::Teacher) {
            sqlx::query_as::<_, OlympiadSummary>(
                r#"
                SELECT o.id, o.title, o.description, o.grading_system,
                       o.start_time, o.end_time, o.duration_minutes,
                       u.id AS creator_id, u.first_name AS creator_first_name,
                       u.last_name AS creator_last_name
                FROM olympiads o
                JOIN users u ON o.creator_id = u.id
                ORDER BY o.start_time
                "#,
            )
        } else {
            sqlx::query_as::<_, OlympiadSummary>(
                r#"
                SELECT o.id, o.title, o.description, o.grading_system,
                       o.start_time, o.end_time, o.duration_minutes,
                       u.id AS creator_id, u.first_name AS creator_first_name,
                       u.last_name AS creator_last_name
                FROM olympiads o
                JOIN users u ON o.creator_id = u.id
                WHERE o.start_time <= NOW() AND o.end_time >= NOW()
                ORDER BY o.start_time
                "#,
            )
        };
        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn get_summary(&self, olympiad_id: i64, caller_role: Role) -> Result<OlympiadSummary> {
        let olympiad = sqlx::query_as::<_, OlympiadSummary>(
            r#"
            SELECT o.id, o.title, o.description, o.grading_system,
                   o.start_time, o.end_time, o.duration_minutes,
                   u.id AS creator_id, u.first_name AS creator_first_name,
                   u.last_name AS creator_last_name
            FROM olympiads o
            JOIN users u ON o.creator_id = u.id
            WHERE o.id = $1
            "#,
        )
        .bind(olympiad_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Olympiad not found".to_string()))?;

        // Students only see olympiads inside their window.
        if !authorize(caller_role, Role::Teacher) {
            let now = Utc::now();
            if now < olympiad.start_time || now > olympiad.end_time {
                return Err(Error::NotFound("Olympiad not found".to_string()));
            }
        }
        Ok(olympiad)
    }

    pub async fn get_olympiad(&self, olympiad_id: i64) -> Result<Olympiad> {
        let olympiad = sqlx::query_as::<_, Olympiad>("SELECT * FROM olympiads WHERE id = $1")
            .bind(olympiad_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Olympiad not found".to_string()))?;
        Ok(olympiad)
    }

    pub async fn add_question(
        &self,
        olympiad_id: i64,
        caller: &Claims,
        payload: NewQuestionPayload,
    ) -> Result<i64> {
        let creator_id: i64 =
            sqlx::query_scalar("SELECT creator_id FROM olympiads WHERE id = $1")
                .bind(olympiad_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::NotFound("Olympiad not found".to_string()))?;

        if creator_id != caller.sub && !authorize(caller.role, Role::Admin) {
            return Err(Error::Forbidden(
                "You cannot modify this olympiad".to_string(),
            ));
        }

        let question_id = self.questions.create(&payload).await?;
        sqlx::query("INSERT INTO olympiad_questions (olympiad_id, question_id) VALUES ($1, $2)")
            .bind(olympiad_id)
            .bind(question_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Question {} added to olympiad {}", question_id, olympiad_id);
        Ok(question_id)
    }

    pub async fn add_favorite(&self, user_id: i64, olympiad_id: i64) -> Result<()> {
        self.get_olympiad(olympiad_id).await?;
        sqlx::query(
            "INSERT INTO favorites (user_id, olympiad_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(olympiad_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub fn questions(&self) -> &QuestionService {
        &self.questions
    }
}
