pub mod booking_api;
pub mod google_calendar;
pub mod openai_client;
