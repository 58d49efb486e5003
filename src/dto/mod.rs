pub mod health;
pub mod player;
pub mod validation;
