pub mod focus;
pub mod reminder;
pub mod run;
pub mod stats;
