pub mod note;
pub mod project;
pub mod task;
pub mod token;
pub mod user;

pub use note::*;
pub use project::*;
pub use task::*;
pub use token::*;
pub use user::*;
