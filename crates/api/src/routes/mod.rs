pub mod meeting;
pub mod membership;
