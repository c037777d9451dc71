pub mod clock;
pub mod db;
pub mod editor;
pub mod effects;
pub mod error;
pub mod list;
pub mod notification;
pub mod preferences;
pub mod state;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;
