pub mod grading;
pub mod olympiad;
pub mod question;
pub mod result;
pub mod role;
pub mod test;
pub mod user;
