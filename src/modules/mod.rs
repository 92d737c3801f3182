pub mod donations;
pub mod forum;
pub mod health;
pub mod logs;
pub mod policies;
pub mod polls;
pub mod rules;
pub mod suggestions;
pub mod tickets;
pub mod translation;
pub mod two_factor;
pub mod users;
pub mod webhooks;
pub mod wiki;
