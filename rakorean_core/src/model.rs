use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rakorean_util::{truncate_chars, SUMMARY_LENGTH};

use crate::error::Error;

/// Remote-issued post identifier.
pub type PostId = String;

/// Label shown when a post author cannot be resolved.
pub const ANONYMOUS: &str = "Anonymous";
/// Label shown when a comment author cannot be resolved and the session has no name either.
pub const DEFAULT_USER: &str = "User";

/// Tag attached to every post, derived from the stored category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Grammar,
    Culture,
    Tips,
    #[serde(rename = "K-pop")]
    KPop,
    #[serde(rename = "K-drama")]
    KDrama,
    Sentences,
    Speaking,
    General,
}

impl Tag {
    /// Map a stored category string onto a tag. Unknown values become `General`.
    pub fn from_remote(category: &str) -> Tag {
        match category.trim().to_ascii_lowercase().as_str() {
            "grammar" => Tag::Grammar,
            "culture" => Tag::Culture,
            "tips" => Tag::Tips,
            "kcontent" | "k-pop" | "kpop" => Tag::KPop,
            "k-drama" | "kdrama" => Tag::KDrama,
            "sentences" => Tag::Sentences,
            "speaking" => Tag::Speaking,
            _ => Tag::General,
        }
    }

    /// The UI category this tag is listed under, if any.
    pub fn category(&self) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.tags().contains(self))
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tag::Grammar => "Grammar",
            Tag::Culture => "Culture",
            Tag::Tips => "Tips",
            Tag::KPop => "K-pop",
            Tag::KDrama => "K-drama",
            Tag::Sentences => "Sentences",
            Tag::Speaking => "Speaking",
            Tag::General => "General",
        };
        write!(f, "{}", s)
    }
}

/// Forum sections shown in the navigation. Each one lists the posts of a fixed set of tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Grammar,
    Culture,
    Tips,
    #[serde(rename = "kcontent")]
    KContent,
    Sentences,
    Speaking,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Grammar,
        Category::Culture,
        Category::Tips,
        Category::KContent,
        Category::Sentences,
        Category::Speaking,
    ];

    pub fn tags(&self) -> &'static [Tag] {
        match self {
            Category::Grammar => &[Tag::Grammar],
            Category::Culture => &[Tag::Culture],
            Category::Tips => &[Tag::Tips],
            Category::KContent => &[Tag::KPop, Tag::KDrama],
            Category::Sentences => &[Tag::Sentences],
            Category::Speaking => &[Tag::Speaking],
        }
    }

    /// The value written to the `category` column.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Culture => "culture",
            Category::Tips => "tips",
            Category::KContent => "kcontent",
            Category::Sentences => "sentences",
            Category::Speaking => "speaking",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Grammar => "Grammar",
            Category::Culture => "Culture",
            Category::Tips => "Tips",
            Category::KContent => "K-content",
            Category::Sentences => "Sentences",
            Category::Speaking => "Speaking",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| Error::InvalidCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub tag: Tag,
    pub title: String,
    /// Short form shown on cards.
    pub summary: String,
    pub content: String,
    pub author: String,
    pub likes: u32,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Build a post with its summary derived from `content`.
    pub fn new(
        id: impl Into<PostId>,
        tag: Tag,
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
        likes: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            tag,
            title: title.into(),
            summary: truncate_chars(&content, SUMMARY_LENGTH),
            content,
            author: author.into(),
            likes,
            comments: vec![],
            created_at,
        }
    }

    /// Ranking score of the home view.
    pub fn engagement(&self) -> usize {
        self.likes as usize + self.comments.len()
    }
}
