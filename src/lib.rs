pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    attempt_service::AttemptService, mail_service::MailService,
    olympiad_service::OlympiadService, question_service::QuestionService,
    test_service::TestService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub test_service: TestService,
    pub olympiad_service: OlympiadService,
    pub attempt_service: AttemptService,
    pub question_service: QuestionService,
    pub mail_service: MailService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let user_service = UserService::new(pool.clone());
        let test_service = TestService::new(pool.clone());
        let olympiad_service = OlympiadService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let question_service = QuestionService::new(pool.clone());
        let mail_service = MailService::new(config.mail_gateway_url.clone());

        Self {
            pool,
            user_service,
            test_service,
            olympiad_service,
            attempt_service,
            question_service,
            mail_service,
        }
    }
}
