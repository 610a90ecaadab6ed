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
    attempt_service::AttemptService, grading_scheme_service::GradingSchemeService,
    test_service::TestService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub test_service: TestService,
    pub attempt_service: AttemptService,
    pub grading_scheme_service: GradingSchemeService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let user_service = UserService::new(pool.clone());
        let test_service = TestService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let grading_scheme_service = GradingSchemeService::new(pool.clone());

        Self {
            pool,
            user_service,
            test_service,
            attempt_service,
            grading_scheme_service,
        }
    }
}
