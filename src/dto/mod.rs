pub mod auth;
pub mod bags;
pub mod cart;
pub mod reservations;
