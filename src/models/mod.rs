pub mod interview;
pub mod question;
