pub mod options;
pub mod record;
pub mod submission;
pub mod template;
