pub mod models;
pub mod parsing;
pub mod validation;
