use axum::Router;

pub async fn create_test_app() -> Router {
    std::env::set_var("DATABASE_URL", "");
    std::env::set_var("LLM_API_KEY", "");

    tutorwise_analytics::create_app().await
}
