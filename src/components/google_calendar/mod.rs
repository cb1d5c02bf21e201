mod client;
pub mod credential;
pub mod flow;
pub mod models;
mod session;
pub mod template;
pub mod time;
pub mod token;

pub use client::{CalendarClient, DEFAULT_EVENT_COUNT, PRIMARY_CALENDAR};
pub use credential::{ClientSecret, Credential};
pub use flow::{Authorizer, LocalServerFlow};
pub use models::Event;
pub use session::SessionManager;
pub use template::EventTemplate;
pub use token::TokenManager;
