pub mod db_utils;
pub mod roster_io;
