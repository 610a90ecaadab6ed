pub mod attempt;
pub mod grading_scheme;
pub mod question;
pub mod student_answer;
pub mod user;
