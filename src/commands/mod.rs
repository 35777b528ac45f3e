pub mod criteria;
pub mod evaluate;
pub mod extract;
pub mod history;
pub mod report;
pub mod review;
pub mod status;
pub mod user;
