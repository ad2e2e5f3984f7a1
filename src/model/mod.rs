pub mod attendance;
pub mod branch;
pub mod notification;
pub mod role;
pub mod student;
