pub mod chat;
pub mod estimates;
pub mod response;
pub mod shared;

pub use chat::ChatView;
pub use estimates::EstimatesView;
