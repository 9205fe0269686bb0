pub mod mail;
pub mod seed;
