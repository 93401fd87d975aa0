pub mod markdown;
pub mod mentions;
pub mod references;
pub mod render;

pub use markdown::to_markdown;
pub use references::{Resolver, SlackReferences};
pub use render::TranscriptFormatter;
