pub mod face;
pub mod health;
