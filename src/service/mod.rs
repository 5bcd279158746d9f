pub mod assistant;
pub mod booking_service;
pub mod calendar_gateway;
pub mod normalizer;
pub mod openai_service;
pub mod routing;
pub mod slot_finder;
