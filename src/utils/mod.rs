pub mod db_utils;
pub mod multipart;
pub mod pagination;
