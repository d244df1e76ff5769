//! The three accepted input shapes, recognized once at the boundary.

use crate::error::{Error, Result};
use crate::wire::{RawBundle, RawFlatGraph, RawNode};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    Flat,
    Bundle,
    Tree,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphInput {
    /// `{nodes: [...], edges: [...], anchor_root_id?, metadata?}`
    Flat(RawFlatGraph),
    /// `{root, nodes_by_id: {id: node}, anchor_root_id}`
    Bundle(RawBundle),
    /// A node object with inline `children` node objects.
    Tree(RawNode),
}

impl GraphInput {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(Error::UnknownInputShape);
        };

        let is_flat = matches!(map.get("nodes"), Some(Value::Array(_)))
            && matches!(map.get("edges"), Some(Value::Array(_)));
        if is_flat {
            return Ok(GraphInput::Flat(serde_json::from_value(value)?));
        }

        let is_bundle = map.get("root").is_some_and(|r| !r.is_null())
            && matches!(map.get("nodes_by_id"), Some(Value::Object(_)));
        if is_bundle {
            return Ok(GraphInput::Bundle(serde_json::from_value(value)?));
        }

        Ok(GraphInput::Tree(serde_json::from_value(value)?))
    }

    pub fn shape(&self) -> InputShape {
        match self {
            GraphInput::Flat(_) => InputShape::Flat,
            GraphInput::Bundle(_) => InputShape::Bundle,
            GraphInput::Tree(_) => InputShape::Tree,
        }
    }
}
