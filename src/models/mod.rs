pub mod enums;
pub mod interaction;
pub mod medicine;
pub mod prescription;
pub mod reminder;
pub mod user;

pub use enums::*;
pub use interaction::*;
pub use medicine::*;
pub use prescription::*;
pub use reminder::*;
pub use user::*;
