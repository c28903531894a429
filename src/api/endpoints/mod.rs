pub mod health;
pub mod prescriptions;
pub mod reminders;
pub mod sweep;
