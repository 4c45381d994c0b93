pub mod attempt_service;
pub mod grading_service;
pub mod mail_service;
pub mod olympiad_service;
pub mod question_service;
pub mod test_service;
pub mod user_service;
