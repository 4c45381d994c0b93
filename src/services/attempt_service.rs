use crate::config::ScorePolicy;
use crate::dto::question_dto::AnswerPayload;
use crate::dto::test_dto::{ProgressQuestion, ProgressResponse, TestResultResponse, UserTestResult};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::question::{Question, QuestionType};
use crate::models::result::{OlympiadResult, TestResult, UserAnswer};
use crate::models::role::{authorize, Role};
use crate::services::grading_service::GradingService;
use crate::services::question_service::QuestionService;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

/// Result of a start call. Starting twice is answered idempotently with
/// the attempt that already exists, for olympiads as well as tests.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    Started {
        result_id: i64,
        deadline: Option<DateTime<Utc>>,
    },
    AlreadyStarted {
        result_id: i64,
        deadline: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub score: i32,
    pub total_score: i32,
    pub percentage: f64,
    pub grade: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub score: i32,
    pub grade: Option<String>,
}

/// An olympiad attempt must end when its duration runs out or when the
/// olympiad itself closes, whichever comes first.
pub fn olympiad_deadline(
    now: DateTime<Utc>,
    duration_minutes: i32,
    end_time: DateTime<Utc>,
) -> DateTime<Utc> {
    let by_duration = now + Duration::minutes(duration_minutes as i64);
    by_duration.min(end_time)
}

/// Splits an answer payload into the stored columns for the question's
/// type. Choice questions require ids; text questions keep their text.
fn stored_answer_columns(
    question_type: QuestionType,
    payload: &AnswerPayload,
) -> Result<(Option<Json<Vec<i64>>>, Option<String>)> {
    match question_type {
        QuestionType::Text => Ok((None, payload.answer_text.clone())),
        QuestionType::Single | QuestionType::Multiple => {
            let ids = payload.answer_ids.clone().ok_or_else(|| {
                Error::BadRequest("answer_ids must be provided for choice questions".to_string())
            })?;
            Ok((Some(Json(ids)), None))
        }
    }
}

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
    questions: QuestionService,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        let questions = QuestionService::new(pool.clone());
        Self { pool, questions }
    }

    async fn active_test_attempt(&self, user_id: i64, test_id: i64) -> Result<Option<TestResult>> {
        let attempt = sqlx::query_as::<_, TestResult>(
            r#"
            SELECT * FROM test_results
            WHERE user_id = $1 AND test_id = $2 AND finished_at IS NULL
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    pub async fn start_test(&self, test_id: i64, user_id: i64) -> Result<StartOutcome> {
        let open: Option<i64> =
            sqlx::query_scalar("SELECT id FROM tests WHERE id = $1 AND is_open = TRUE")
                .bind(test_id)
                .fetch_optional(&self.pool)
                .await?;
        if open.is_none() {
            return Err(Error::NotFound("Test not found or unavailable".to_string()));
        }

        if let Some(existing) = self.active_test_attempt(user_id, test_id).await? {
            return Ok(StartOutcome::AlreadyStarted {
                result_id: existing.id,
                deadline: None,
            });
        }

        // The total is snapshotted here; later edits to the test's question
        // set do not change attempts already in flight.
        let total_score = self.questions.total_points_for_test(test_id).await?;
        let result_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO test_results (user_id, test_id, total_score)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .bind(total_score)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("User {} started test {}", user_id, test_id);
        Ok(StartOutcome::Started {
            result_id,
            deadline: None,
        })
    }

    pub async fn start_olympiad(&self, olympiad_id: i64, user_id: i64) -> Result<StartOutcome> {
        let olympiad = sqlx::query_as::<_, crate::models::olympiad::Olympiad>(
            "SELECT * FROM olympiads WHERE id = $1",
        )
        .bind(olympiad_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Olympiad not found".to_string()))?;

        let now = Utc::now();
        if now < olympiad.start_time {
            return Err(Error::Forbidden("Olympiad has not started yet".to_string()));
        }
        if now > olympiad.end_time {
            return Err(Error::Forbidden("Olympiad has already finished".to_string()));
        }

        let existing = sqlx::query_as::<_, OlympiadResult>(
            "SELECT * FROM olympiad_results WHERE user_id = $1 AND olympiad_id = $2",
        )
        .bind(user_id)
        .bind(olympiad_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(existing) = existing {
            return Ok(StartOutcome::AlreadyStarted {
                result_id: existing.id,
                deadline: Some(existing.deadline),
            });
        }

        let deadline = olympiad_deadline(now, olympiad.duration_minutes, olympiad.end_time);
        let total_score = self.questions.total_points_for_olympiad(olympiad_id).await?;
        let result_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO olympiad_results (user_id, olympiad_id, started_at, deadline, total_score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(olympiad_id)
        .bind(now)
        .bind(deadline)
        .bind(total_score)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("User {} started olympiad {}", user_id, olympiad_id);
        Ok(StartOutcome::Started {
            result_id,
            deadline: Some(deadline),
        })
    }

    /// Upserts the caller's answer to one question of their active test
    /// attempt, replacing any prior answer whole.
    pub async fn save_test_answer(
        &self,
        test_id: i64,
        user_id: i64,
        question_id: i64,
        payload: &AnswerPayload,
    ) -> Result<()> {
        let attempt = self
            .active_test_attempt(user_id, test_id)
            .await?
            .ok_or_else(|| Error::BadRequest("No active attempt for this test".to_string()))?;

        if !self.questions.belongs_to_test(test_id, question_id).await? {
            return Err(Error::NotFound(
                "Question does not belong to this test".to_string(),
            ));
        }

        self.upsert_answer(attempt.id, question_id, false, payload)
            .await
    }

    /// Same for olympiads, additionally gated on the attempt's deadline.
    pub async fn save_olympiad_answer(
        &self,
        result_id: i64,
        user_id: i64,
        question_id: i64,
        payload: &AnswerPayload,
    ) -> Result<()> {
        let result = sqlx::query_as::<_, OlympiadResult>(
            "SELECT * FROM olympiad_results WHERE id = $1 AND user_id = $2",
        )
        .bind(result_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Result not found".to_string()))?;

        if result.finished_at.is_some() {
            return Err(Error::BadRequest("Attempt is already finished".to_string()));
        }
        if Utc::now() > result.deadline {
            return Err(Error::TimeExpired(
                "Time for this olympiad has expired".to_string(),
            ));
        }
        if !self
            .questions
            .belongs_to_olympiad(result.olympiad_id, question_id)
            .await?
        {
            return Err(Error::NotFound(
                "Question does not belong to this olympiad".to_string(),
            ));
        }

        self.upsert_answer(result_id, question_id, true, payload)
            .await
    }

    async fn upsert_answer(
        &self,
        result_id: i64,
        question_id: i64,
        is_olympiad: bool,
        payload: &AnswerPayload,
    ) -> Result<()> {
        let question_type: QuestionType =
            sqlx::query_scalar("SELECT question_type FROM questions WHERE id = $1")
                .bind(question_id)
                .fetch_one(&self.pool)
                .await?;
        let (answer_ids, answer_text) = stored_answer_columns(question_type, payload)?;

        sqlx::query(
            r#"
            INSERT INTO user_answers (result_id, question_id, is_olympiad, answer_ids, answer_text)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (result_id, question_id, is_olympiad)
            DO UPDATE SET answer_ids = EXCLUDED.answer_ids, answer_text = EXCLUDED.answer_text
            "#,
        )
        .bind(result_id)
        .bind(question_id)
        .bind(is_olympiad)
        .bind(answer_ids)
        .bind(answer_text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn stored_answers(&self, result_id: i64, is_olympiad: bool) -> Result<Vec<UserAnswer>> {
        let answers = sqlx::query_as::<_, UserAnswer>(
            "SELECT * FROM user_answers WHERE result_id = $1 AND is_olympiad = $2",
        )
        .bind(result_id)
        .bind(is_olympiad)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    pub async fn test_progress(&self, test_id: i64, user_id: i64) -> Result<ProgressResponse> {
        let attempt = self
            .active_test_attempt(user_id, test_id)
            .await?
            .ok_or_else(|| Error::BadRequest("No active attempt for this test".to_string()))?;

        let questions = self.questions.for_test(test_id).await?;
        let answers = self.stored_answers(attempt.id, false).await?;

        Ok(ProgressResponse {
            test_id,
            result_id: attempt.id,
            questions: assemble_progress(questions, &answers),
        })
    }

    /// Grades and closes a test attempt. The achieved score is recomputed
    /// from stored answers; the total follows the configured policy
    /// (snapshot taken at start vs live sum at finish). One UPDATE
    /// persists score, grade and end time together.
    pub async fn finish_test(&self, result_id: i64, user_id: i64) -> Result<FinishOutcome> {
        let result = sqlx::query_as::<_, TestResult>(
            "SELECT * FROM test_results WHERE id = $1 AND user_id = $2 AND finished_at IS NULL",
        )
        .bind(result_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::NotFound("Result not found or test already finished".to_string())
        })?;

        let test = sqlx::query_as::<_, crate::models::test::Test>(
            "SELECT * FROM tests WHERE id = $1",
        )
        .bind(result.test_id)
        .fetch_one(&self.pool)
        .await?;

        let questions = self.questions.for_test(result.test_id).await?;
        let options = self.questions.options_for_test(result.test_id).await?;
        let answers = self.stored_answers(result_id, false).await?;

        let score = GradingService::score_attempt(&questions, &options, &answers);
        let total_score = match crate::config::get_config().score_policy {
            ScorePolicy::SnapshotAtStart => result.total_score,
            ScorePolicy::RecomputeAtFinish => questions.iter().map(|q| q.points).sum(),
        };
        let percentage = GradingService::percentage(score, total_score);
        let grade = GradingService::map_grade(percentage, &test.grading_system.0);

        sqlx::query(
            r#"
            UPDATE test_results
            SET finished_at = NOW(), score = $1, total_score = $2, grade = $3
            WHERE id = $4
            "#,
        )
        .bind(score)
        .bind(total_score)
        .bind(&grade)
        .bind(result_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "User {} finished test {} with {}/{}",
            user_id,
            result.test_id,
            score,
            total_score
        );
        Ok(FinishOutcome {
            score,
            total_score,
            percentage,
            grade,
        })
    }

    /// Grades and closes an olympiad attempt. Automatic scoring runs the
    /// same way as for tests; `is_checked` stays false until a teacher
    /// reviews the attempt.
    pub async fn finish_olympiad(&self, result_id: i64, user_id: i64) -> Result<FinishOutcome> {
        let result = sqlx::query_as::<_, OlympiadResult>(
            "SELECT * FROM olympiad_results WHERE id = $1 AND user_id = $2 AND finished_at IS NULL",
        )
        .bind(result_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::NotFound("Result not found or olympiad already finished".to_string())
        })?;

        if Utc::now() > result.deadline {
            return Err(Error::TimeExpired(
                "Time for this olympiad has expired".to_string(),
            ));
        }

        let olympiad = sqlx::query_as::<_, crate::models::olympiad::Olympiad>(
            "SELECT * FROM olympiads WHERE id = $1",
        )
        .bind(result.olympiad_id)
        .fetch_one(&self.pool)
        .await?;

        let questions = self.questions.for_olympiad(result.olympiad_id).await?;
        let options = self.questions.options_for_olympiad(result.olympiad_id).await?;
        let answers = self.stored_answers(result_id, true).await?;

        let score = GradingService::score_attempt(&questions, &options, &answers);
        let total_score = match crate::config::get_config().score_policy {
            ScorePolicy::SnapshotAtStart => result.total_score,
            ScorePolicy::RecomputeAtFinish => questions.iter().map(|q| q.points).sum(),
        };
        let percentage = GradingService::percentage(score, total_score);
        let grade = GradingService::map_grade(percentage, &olympiad.grading_system.0);

        sqlx::query(
            r#"
            UPDATE olympiad_results
            SET finished_at = NOW(), score = $1, total_score = $2, grade = $3
            WHERE id = $4
            "#,
        )
        .bind(score)
        .bind(total_score)
        .bind(&grade)
        .bind(result_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "User {} finished olympiad {} with {}/{}",
            user_id,
            result.olympiad_id,
            score,
            total_score
        );
        Ok(FinishOutcome {
            score,
            total_score,
            percentage,
            grade,
        })
    }

    /// Teacher override of an olympiad attempt's score. Only the
    /// olympiad's creator or an admin may review; the override may not
    /// exceed the attempt's total.
    pub async fn review_olympiad(
        &self,
        result_id: i64,
        caller: &Claims,
        override_score: i32,
    ) -> Result<ReviewOutcome> {
        let result = sqlx::query_as::<_, OlympiadResult>(
            "SELECT * FROM olympiad_results WHERE id = $1",
        )
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Result not found".to_string()))?;

        let olympiad = sqlx::query_as::<_, crate::models::olympiad::Olympiad>(
            "SELECT * FROM olympiads WHERE id = $1",
        )
        .bind(result.olympiad_id)
        .fetch_one(&self.pool)
        .await?;

        if olympiad.creator_id != caller.sub && !authorize(caller.role, Role::Admin) {
            return Err(Error::Forbidden(
                "No rights to review this olympiad".to_string(),
            ));
        }
        if override_score > result.total_score {
            return Err(Error::BadRequest(
                "Score exceeds the attempt's total score".to_string(),
            ));
        }

        let percentage = GradingService::percentage(override_score, result.total_score);
        let grade = GradingService::map_grade(percentage, &olympiad.grading_system.0);

        sqlx::query(
            "UPDATE olympiad_results SET score = $1, grade = $2, is_checked = TRUE WHERE id = $3",
        )
        .bind(override_score)
        .bind(&grade)
        .bind(result_id)
        .execute(&self.pool)
        .await?;

        tracing::info!("Olympiad result {} reviewed by user {}", result_id, caller.sub);
        Ok(ReviewOutcome {
            score: override_score,
            grade,
        })
    }

    pub async fn get_test_result(
        &self,
        result_id: i64,
        caller: &Claims,
    ) -> Result<TestResultResponse> {
        let result = sqlx::query_as::<_, TestResult>(
            "SELECT * FROM test_results WHERE id = $1",
        )
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Result not found".to_string()))?;

        // Ownership failures read the same as absence.
        if result.user_id != caller.sub && !authorize(caller.role, Role::Teacher) {
            return Err(Error::NotFound("Result not found".to_string()));
        }

        let test_title: String = sqlx::query_scalar("SELECT title FROM tests WHERE id = $1")
            .bind(result.test_id)
            .fetch_one(&self.pool)
            .await?;
        let questions = self.questions.for_test(result.test_id).await?;
        let answers = self.stored_answers(result_id, false).await?;

        Ok(TestResultResponse {
            id: result.id,
            user_id: result.user_id,
            test_id: result.test_id,
            test_title,
            started_at: result.started_at,
            finished_at: result.finished_at,
            score: result.score,
            total_score: result.total_score,
            grade: result.grade,
            questions: assemble_progress(questions, &answers),
        })
    }

    pub async fn get_olympiad_result(
        &self,
        result_id: i64,
        caller: &Claims,
    ) -> Result<(OlympiadResult, Vec<UserAnswer>)> {
        let result = sqlx::query_as::<_, OlympiadResult>(
            "SELECT * FROM olympiad_results WHERE id = $1",
        )
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Result not found".to_string()))?;

        let olympiad = sqlx::query_as::<_, crate::models::olympiad::Olympiad>(
            "SELECT * FROM olympiads WHERE id = $1",
        )
        .bind(result.olympiad_id)
        .fetch_one(&self.pool)
        .await?;

        let allowed = result.user_id == caller.sub
            || authorize(caller.role, Role::Admin)
            || (authorize(caller.role, Role::Teacher) && olympiad.creator_id == caller.sub);
        if !allowed {
            return Err(Error::NotFound("Result not found".to_string()));
        }

        let answers = self.stored_answers(result_id, true).await?;
        Ok((result, answers))
    }

    pub async fn list_user_test_results(
        &self,
        target_user_id: i64,
        caller: &Claims,
    ) -> Result<Vec<UserTestResult>> {
        if target_user_id != caller.sub && !authorize(caller.role, Role::Teacher) {
            return Err(Error::Forbidden(
                "You can only view your own results".to_string(),
            ));
        }

        let results = sqlx::query_as::<_, UserTestResult>(
            r#"
            SELECT r.id, r.test_id, t.title AS test_title, r.started_at, r.finished_at,
                   r.score, r.total_score, r.grade
            FROM test_results r
            JOIN tests t ON r.test_id = t.id
            WHERE r.user_id = $1
            ORDER BY r.started_at DESC
            "#,
        )
        .bind(target_user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(results)
    }
}

fn assemble_progress(questions: Vec<Question>, answers: &[UserAnswer]) -> Vec<ProgressQuestion> {
    questions
        .into_iter()
        .map(|q| {
            let user_answer = answers
                .iter()
                .find(|a| a.question_id == q.id)
                .map(|a| AnswerPayload {
                    answer_ids: a.answer_ids.as_ref().map(|ids| ids.0.clone()),
                    answer_text: a.answer_text.clone(),
                });
            ProgressQuestion {
                id: q.id,
                content: q.content,
                question_type: q.question_type,
                points: q.points,
                image_id: q.image_id,
                user_answer,
            }
        })
        .collect()
}
