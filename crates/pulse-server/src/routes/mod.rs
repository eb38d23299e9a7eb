pub mod events;
pub mod health;
pub mod stats;
pub mod track;
pub mod websites;
