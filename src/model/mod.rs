pub mod group;
pub mod outcome;
pub mod user;
pub mod work_package;
