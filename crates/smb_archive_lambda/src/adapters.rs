pub mod object_store;
pub mod secrets;
pub mod share;
