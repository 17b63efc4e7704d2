pub mod admin;
pub mod collections;
pub mod comments;
pub mod favorites;
pub mod health;
pub mod quota;
pub mod ratings;
pub mod sets;
