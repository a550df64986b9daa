use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use dnd_tree::{DropPosition, DropRect, Node};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node id as it appears in JSON: an integer or a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(id) => write!(f, "{id}"),
            Key::Str(id) => f.write_str(id),
        }
    }
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(Key::Int)
            .unwrap_or_else(|_| Key::Str(s.to_string())))
    }
}

/// Every column of a row other than `id`, `pid` and `children`.
pub type Payload = Map<String, Value>;

pub fn label(node: &Node<Key, Payload>) -> String {
    let name = ["name", "label", "title"]
        .iter()
        .find_map(|field| node.data().get(*field).and_then(Value::as_str));
    match name {
        Some(name) => format!("{} {name}", node.id()),
        None => node.id().to_string(),
    }
}

/// One scripted drop.
///
/// With `position` the move is applied as is; without it the drop is replayed
/// through a drag session from `rect` and `pointer_y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub dragged: Key,
    pub target: Key,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<DropPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<DropRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer_y: Option<f32>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = match self.position {
            Some(position) => format!("{position:?}").to_lowercase(),
            None => "pointer".to_string(),
        };
        write!(f, "{} {position} {}", self.dragged, self.target)
    }
}

/// Parse `<dragged>:<before|after|child>:<target>`.
pub fn parse_step(s: &str) -> Result<Step> {
    let mut parts = s.splitn(3, ':');
    let (Some(dragged), Some(position), Some(target)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(anyhow!(
            "expected <dragged>:<before|after|child>:<target>, got {s:?}"
        ));
    };

    let position = match position.to_ascii_lowercase().as_str() {
        "before" => DropPosition::Before,
        "after" => DropPosition::After,
        "child" | "inside" => DropPosition::Child,
        other => return Err(anyhow!("unknown drop position {other:?}")),
    };

    let Ok(dragged) = dragged.parse::<Key>();
    let Ok(target) = target.parse::<Key>();
    Ok(Step {
        dragged,
        target,
        position: Some(position),
        rect: None,
        pointer_y: None,
    })
}
