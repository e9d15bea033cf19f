pub mod access;
pub mod password;
pub mod registry;
pub mod serve;
