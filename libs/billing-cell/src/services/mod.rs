pub mod fees;
pub mod rating;
pub mod settlement;
