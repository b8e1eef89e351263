pub mod status_bar;
pub mod topic_form;
pub mod transcript;

pub use status_bar::StatusBar;
pub use topic_form::TopicForm;
pub use transcript::TranscriptView;
