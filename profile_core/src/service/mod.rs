pub mod db;

// Re-export all from each module namespace
pub use db::*;
