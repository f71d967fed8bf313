pub mod auth_service;
pub mod bag_service;
pub mod cart_service;
pub mod reservation_service;
