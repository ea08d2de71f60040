pub mod health;
pub mod keyvalue;
