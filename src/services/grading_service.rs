use crate::models::grading::GradingSystem;
use crate::models::question::{AnswerOption, Question, QuestionType};
use crate::models::result::UserAnswer;
use std::collections::{BTreeSet, HashMap};

/// Correct-answer data for one question, resolved from its option rows.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerKey {
    Single(i64),
    Multiple(BTreeSet<i64>),
    Text(String),
}

pub struct GradingService;

impl GradingService {
    /// Canonical form used to compare free-text answers: lower-cased with
    /// everything except Unicode letters, digits and underscores stripped.
    /// Wording, spacing and punctuation never matter.
    pub fn normalize_answer(text: Option<&str>) -> String {
        text.unwrap_or_default()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect()
    }

    /// Resolves the answer key of a question from its options. Returns
    /// `None` when no usable key is configured: no correct option at all,
    /// or more than one correct option on a `single` question.
    pub fn resolve_key(question: &Question, options: &[AnswerOption]) -> Option<AnswerKey> {
        let correct: Vec<&AnswerOption> = options
            .iter()
            .filter(|o| o.question_id == question.id && o.is_correct)
            .collect();

        match question.question_type {
            QuestionType::Single => match correct.as_slice() {
                [only] => Some(AnswerKey::Single(only.id)),
                _ => None,
            },
            QuestionType::Multiple => {
                if correct.is_empty() {
                    None
                } else {
                    Some(AnswerKey::Multiple(correct.iter().map(|o| o.id).collect()))
                }
            }
            QuestionType::Text => correct
                .first()
                .map(|o| AnswerKey::Text(o.content.clone())),
        }
    }

    /// Awards either the question's full points or zero. A missing
    /// submission scores zero; a question without a key scores zero and is
    /// only logged (known gap, kept deliberately).
    pub fn score_question(
        question: &Question,
        key: Option<&AnswerKey>,
        submitted: Option<&UserAnswer>,
    ) -> i32 {
        let Some(key) = key else {
            tracing::warn!(
                question_id = question.id,
                "question has no correct answer configured, scoring 0"
            );
            return 0;
        };
        let Some(submitted) = submitted else {
            return 0;
        };

        let correct = match (key, question.question_type) {
            (AnswerKey::Single(correct_id), QuestionType::Single) => submitted
                .answer_ids
                .as_ref()
                .and_then(|ids| ids.0.first())
                .map(|first| first == correct_id)
                .unwrap_or(false),
            (AnswerKey::Multiple(correct_ids), QuestionType::Multiple) => {
                let chosen: BTreeSet<i64> = submitted
                    .answer_ids
                    .as_ref()
                    .map(|ids| ids.0.iter().copied().collect())
                    .unwrap_or_default();
                chosen == *correct_ids
            }
            (AnswerKey::Text(expected), QuestionType::Text) => {
                Self::normalize_answer(submitted.answer_text.as_deref())
                    == Self::normalize_answer(Some(expected.as_str()))
            }
            _ => false,
        };

        if correct {
            question.points
        } else {
            0
        }
    }

    /// Total achieved score of an attempt over every linked question.
    pub fn score_attempt(
        questions: &[Question],
        options: &[AnswerOption],
        submitted: &[UserAnswer],
    ) -> i32 {
        let mut by_question: HashMap<i64, &UserAnswer> = HashMap::new();
        for answer in submitted {
            by_question.insert(answer.question_id, answer);
        }

        questions
            .iter()
            .map(|question| {
                let key = Self::resolve_key(question, options);
                let answer = by_question.get(&question.id).copied();
                Self::score_question(question, key.as_ref(), answer)
            })
            .sum()
    }

    /// Percentage of the total achieved; an empty assessment is 0%, never
    /// a division fault.
    pub fn percentage(score: i32, total_score: i32) -> f64 {
        if total_score <= 0 {
            return 0.0;
        }
        (score as f64 / total_score as f64) * 100.0
    }

    pub fn map_grade(percentage: f64, grading_system: &GradingSystem) -> Option<String> {
        grading_system.grade_for(percentage).map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn question(id: i64, question_type: QuestionType, points: i32) -> Question {
        Question {
            id,
            content: format!("question {}", id),
            question_type,
            points,
            image_id: None,
        }
    }

    fn option(id: i64, question_id: i64, content: &str, is_correct: bool) -> AnswerOption {
        AnswerOption {
            id,
            question_id,
            content: content.into(),
            is_correct,
        }
    }

    fn choice_answer(question_id: i64, ids: Vec<i64>) -> UserAnswer {
        UserAnswer {
            result_id: 1,
            question_id,
            is_olympiad: false,
            answer_ids: Some(Json(ids)),
            answer_text: None,
        }
    }

    fn text_answer(question_id: i64, text: &str) -> UserAnswer {
        UserAnswer {
            result_id: 1,
            question_id,
            is_olympiad: false,
            answer_ids: None,
            answer_text: Some(text.into()),
        }
    }

    #[test]
    fn normalize_is_idempotent_and_strips_punctuation() {
        assert_eq!(
            GradingService::normalize_answer(Some("Paris!")),
            GradingService::normalize_answer(Some("paris"))
        );
        let once = GradingService::normalize_answer(Some("  Mont Blanc, 4810m.  "));
        let twice = GradingService::normalize_answer(Some(once.as_str()));
        assert_eq!(once, twice);
        assert_eq!(once, "montblanc4810m");
        assert_eq!(GradingService::normalize_answer(None), "");
    }

    #[test]
    fn normalize_keeps_unicode_letters() {
        assert_eq!(GradingService::normalize_answer(Some("Ёлка!")), "ёлка");
        assert_eq!(GradingService::normalize_answer(Some("snake_case")), "snake_case");
    }

    #[test]
    fn single_question_scores_on_exact_option() {
        let q = question(1, QuestionType::Single, 10);
        let opts = vec![option(5, 1, "right", true), option(6, 1, "wrong", false)];
        let key = GradingService::resolve_key(&q, &opts);
        assert_eq!(key, Some(AnswerKey::Single(5)));

        let hit = choice_answer(1, vec![5]);
        let miss = choice_answer(1, vec![6]);
        assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&hit)), 10);
        assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&miss)), 0);
        assert_eq!(GradingService::score_question(&q, key.as_ref(), None), 0);
    }

    #[test]
    fn single_question_with_two_correct_options_is_unscoreable() {
        let q = question(1, QuestionType::Single, 10);
        let opts = vec![option(5, 1, "a", true), option(6, 1, "b", true)];
        assert_eq!(GradingService::resolve_key(&q, &opts), None);
        let submitted = choice_answer(1, vec![5]);
        assert_eq!(GradingService::score_question(&q, None, Some(&submitted)), 0);
    }

    #[test]
    fn multiple_question_is_set_compared() {
        let q = question(2, QuestionType::Multiple, 4);
        let opts = vec![
            option(1, 2, "a", true),
            option(3, 2, "b", true),
            option(4, 2, "c", false),
        ];
        let key = GradingService::resolve_key(&q, &opts);

        // Order and duplicates do not matter.
        for ids in [vec![3, 1], vec![1, 3, 3]] {
            let ans = choice_answer(2, ids);
            assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&ans)), 4);
        }
        // Subsets and supersets score zero.
        for ids in [vec![1], vec![1, 3, 4], vec![]] {
            let ans = choice_answer(2, ids);
            assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&ans)), 0);
        }
    }

    #[test]
    fn text_question_compares_normalized_forms() {
        let q = question(3, QuestionType::Text, 2);
        let opts = vec![option(9, 3, "Saint-Petersburg", true)];
        let key = GradingService::resolve_key(&q, &opts);

        let hit = text_answer(3, "saint petersburg!");
        let miss = text_answer(3, "Moscow");
        assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&hit)), 2);
        assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&miss)), 0);
    }

    #[test]
    fn question_without_correct_option_scores_zero_silently() {
        let q = question(4, QuestionType::Multiple, 5);
        let key = GradingService::resolve_key(&q, &[]);
        assert_eq!(key, None);
        let ans = choice_answer(4, vec![1, 2]);
        assert_eq!(GradingService::score_question(&q, key.as_ref(), Some(&ans)), 0);
    }

    #[test]
    fn attempt_score_sums_per_question_credit() {
        let questions = vec![
            question(1, QuestionType::Single, 10),
            question(2, QuestionType::Multiple, 4),
            question(3, QuestionType::Text, 2),
        ];
        let options = vec![
            option(5, 1, "right", true),
            option(6, 1, "wrong", false),
            option(7, 2, "a", true),
            option(8, 2, "b", true),
            option(9, 3, "Paris", true),
        ];
        let submitted = vec![
            choice_answer(1, vec![5]),
            choice_answer(2, vec![8, 7]),
            text_answer(3, "paris"),
        ];
        assert_eq!(
            GradingService::score_attempt(&questions, &options, &submitted),
            16
        );

        // Unanswered questions contribute zero, not an error.
        let partial = vec![choice_answer(1, vec![5])];
        assert_eq!(
            GradingService::score_attempt(&questions, &options, &partial),
            10
        );
    }

    #[test]
    fn percentage_handles_zero_total() {
        assert_eq!(GradingService::percentage(0, 0), 0.0);
        assert_eq!(GradingService::percentage(5, 10), 50.0);
        assert_eq!(GradingService::percentage(10, 10), 100.0);
    }

    #[test]
    fn grade_maps_through_threshold_table() {
        let system: GradingSystem =
            serde_json::from_str(r#"{"A": 90, "B": 75, "C": 60}"#).unwrap();
        assert_eq!(GradingService::map_grade(80.0, &system), Some("B".into()));
        assert_eq!(GradingService::map_grade(50.0, &system), None);
        assert_eq!(GradingService::map_grade(90.0, &system), Some("A".into()));
    }
}
