//! Scenario files: an initial selection followed by user actions.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use widgets::PickerConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    /// Initially selected date.
    pub date: NaiveDate,

    /// Initially selected projection (default: the configured default).
    #[serde(default)]
    pub projection: Option<String>,

    /// Layers added before the map starts, bottom-most first.
    #[serde(default)]
    pub layers: Vec<String>,

    #[serde(default)]
    pub window: Window,

    /// Menu pickers keyed by container id.
    #[serde(default)]
    pub pickers: BTreeMap<String, PickerConfig>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Size of the map container.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Window {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub small: bool,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            small: false,
        }
    }
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    AddLayer { layer: String },
    RemoveLayer { layer: String },
    SetVisibility { layer: String, visible: bool },
    SetOpacity { layer: String, opacity: f64 },
    MoveUp { layer: String },
    MoveDown { layer: String },
    SelectDate { date: NaiveDate },
    SelectProjection { projection: String },
    SetCustomPalette { layer: String, palette: String },
    ClearCustomPalette { layer: String },
    SetRange {
        layer: String,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    Preload { date: NaiveDate },
    Pan { center: [f64; 2] },
    Zoom { delta: i32 },
    Resize {
        width: u32,
        height: u32,
        #[serde(default)]
        small: bool,
    },
    /// Let time pass so throttled extent updates are delivered.
    Wait { ms: u64 },
    SelectItem { picker: String, value: String },
    UpdatePicker {
        picker: String,
        #[serde(default)]
        query: Option<String>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::AddLayer { .. } => "add_layer",
            Step::RemoveLayer { .. } => "remove_layer",
            Step::SetVisibility { .. } => "set_visibility",
            Step::SetOpacity { .. } => "set_opacity",
            Step::MoveUp { .. } => "move_up",
            Step::MoveDown { .. } => "move_down",
            Step::SelectDate { .. } => "select_date",
            Step::SelectProjection { .. } => "select_projection",
            Step::SetCustomPalette { .. } => "set_custom_palette",
            Step::ClearCustomPalette { .. } => "clear_custom_palette",
            Step::SetRange { .. } => "set_range",
            Step::Preload { .. } => "preload",
            Step::Pan { .. } => "pan",
            Step::Zoom { .. } => "zoom",
            Step::Resize { .. } => "resize",
            Step::Wait { .. } => "wait",
            Step::SelectItem { .. } => "select_item",
            Step::UpdatePicker { .. } => "update_picker",
        }
    }
}

impl Scenario {
    /// Load a scenario from YAML (`.yaml`/`.yml`) or JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        let scenario = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        };
        scenario.with_context(|| format!("Failed to parse scenario: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
