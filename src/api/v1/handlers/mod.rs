pub mod accounting;
pub mod admin;
pub mod health;
pub mod sica;
pub mod tracking;
pub mod warehouse;
