pub mod fetch_gate;
pub mod learning_flow;
pub mod profile_service;
pub mod question_service;
pub mod quick_learn;
pub mod quiz_service;
pub mod swipe_service;
