pub mod history;
pub mod prescription;
pub mod reminder;
pub mod user;
