pub mod ask;
pub mod doctor;
pub mod history;
pub mod reindex;
pub mod serve;
pub mod status;
