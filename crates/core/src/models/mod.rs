pub mod content;
pub mod difficulty;
pub mod learner;
pub mod profile;
pub mod question;
pub mod quiz;
pub mod reward;
pub mod settings;
pub mod stock;
