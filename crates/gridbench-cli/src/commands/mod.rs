pub mod common;
pub mod completions;
pub mod conservation;
pub mod evaluate;
pub mod generate;
pub mod inspect;
