use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{NodeId, NodeType};

/// Heading level, 1 through 4
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: HeadingLevel = HeadingLevel(1);
    pub const H2: HeadingLevel = HeadingLevel(2);
    pub const H3: HeadingLevel = HeadingLevel(3);
    pub const H4: HeadingLevel = HeadingLevel(4);

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for HeadingLevel {
    fn default() -> Self {
        Self::H1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("heading level must be 1..=4, got {0}")]
pub struct InvalidHeadingLevel(pub u8);

impl TryFrom<u8> for HeadingLevel {
    type Error = InvalidHeadingLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=4 => Ok(HeadingLevel(value)),
            other => Err(InvalidHeadingLevel(other)),
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

/// How an image sits in the flow of text
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageDisplay {
    Block,
    Inline,
    FloatLeft,
    FloatRight,
}

impl ImageDisplay {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDisplay::Block => "block",
            ImageDisplay::Inline => "inline",
            ImageDisplay::FloatLeft => "float-left",
            ImageDisplay::FloatRight => "float-right",
        }
    }
}

impl fmt::Display for ImageDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageDisplay {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(ImageDisplay::Block),
            "inline" => Ok(ImageDisplay::Inline),
            "float-left" => Ok(ImageDisplay::FloatLeft),
            "float-right" => Ok(ImageDisplay::FloatRight),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    pub id: NodeId,
    pub text: String,
    pub level: HeadingLevel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paragraph {
    pub id: NodeId,
    /// May be empty; an empty paragraph still renders as an addressable line
    pub text: String,
}

/// Image block. Inert for text editing: its payload is carried verbatim
/// through render and reconstruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub id: NodeId,
    pub src: String,
    pub alt: Option<String>,
    pub display: Option<ImageDisplay>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A single addressable unit of document content
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    Image(Image),
}

impl Block {
    pub fn heading(text: impl Into<String>, level: HeadingLevel) -> Self {
        Block::Heading(Heading {
            id: NodeId::new(),
            text: text.into(),
            level,
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(Paragraph {
            id: NodeId::new(),
            text: text.into(),
        })
    }

    pub fn image(src: impl Into<String>) -> Self {
        Block::Image(Image {
            id: NodeId::new(),
            src: src.into(),
            alt: None,
            display: None,
            width: None,
            height: None,
        })
    }

    pub fn id(&self) -> &NodeId {
        match self {
            Block::Heading(h) => &h.id,
            Block::Paragraph(p) => &p.id,
            Block::Image(i) => &i.id,
        }
    }

    pub fn set_id(&mut self, id: NodeId) {
        match self {
            Block::Heading(h) => h.id = id,
            Block::Paragraph(p) => p.id = id,
            Block::Image(i) => i.id = id,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Block::Heading(_) => NodeType::Heading,
            Block::Paragraph(_) => NodeType::Paragraph,
            Block::Image(_) => NodeType::Image,
        }
    }

    /// Canonical plain-text rendering: the literal text, or `src` for images
    pub fn to_plain(&self) -> &str {
        match self {
            Block::Heading(h) => &h.text,
            Block::Paragraph(p) => &p.text,
            Block::Image(i) => &i.src,
        }
    }

    /// Editable text, `None` for blocks that do not take part in text editing
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Heading(h) => Some(&h.text),
            Block::Paragraph(p) => Some(&p.text),
            Block::Image(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.text().is_some()
    }

    /// A block of the same type (and heading level) holding `text`, with a fresh id
    pub fn with_text(&self, text: impl Into<String>) -> Option<Block> {
        match self {
            Block::Heading(h) => Some(Block::heading(text, h.level)),
            Block::Paragraph(_) => Some(Block::paragraph(text)),
            Block::Image(_) => None,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_plain())
    }
}
