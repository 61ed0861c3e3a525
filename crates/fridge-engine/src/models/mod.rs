pub mod block;
pub mod document;
pub mod node;
pub mod serialized;
pub mod session;

pub use block::{Block, Heading, HeadingLevel, Image, ImageDisplay, InvalidHeadingLevel, Paragraph};
pub use document::{Document, NodeRef, WriteMode};
pub use node::{NodeId, NodeType, UnknownNodeType};
pub use serialized::SerializedDocument;
pub use session::Session;
