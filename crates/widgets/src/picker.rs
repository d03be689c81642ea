//! Menu picker: a flat list of options with at most one selected.

use map_common::{MapError, MapResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::source::ItemSource;
use crate::Widget;

/// One option of a picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub disabled: bool,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Styling class of a rendered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemClass {
    Selected,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedItem {
    /// Element id, `{picker}_item{index}`.
    pub id: String,
    pub label: String,
    pub class: Option<ItemClass>,
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedMenu {
    pub class: String,
    pub items: Vec<RenderedItem>,
}

/// Options for constructing a [`MenuPicker`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerConfig {
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub is_collapsible: bool,
    #[serde(default)]
    pub data_source_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MenuPicker {
    id: String,
    items: Vec<MenuItem>,
    value: Option<String>,
    collapsible: bool,
    data_source_url: Option<String>,
    status: String,
}

impl MenuPicker {
    pub fn new(id: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            id: id.into(),
            items,
            value: None,
            collapsible: false,
            data_source_url: None,
            status: String::new(),
        }
    }

    /// Build from a configuration block. An initial selection that does not
    /// validate is dropped and reported through [`Widget::status`].
    pub fn from_config(id: impl Into<String>, config: PickerConfig) -> Self {
        let mut picker = Self::new(id, config.items);
        picker.collapsible = config.is_collapsible;
        picker.data_source_url = config.data_source_url;
        if let Some(selected) = config.selected {
            if let Err(err) = picker.set_value(Some(&selected)) {
                debug!(picker = %picker.id, error = %err, "Dropped configured selection");
            }
        }
        picker
    }

    pub fn collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = collapsible;
        self
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn data_source_url(&self) -> Option<&str> {
        self.data_source_url.as_deref()
    }

    pub fn set_data_source_url(&mut self, url: Option<String>) {
        self.data_source_url = url;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Handle a click on the item at `index`. Disabled items ignore clicks.
    pub fn click(&mut self, index: usize) -> MapResult<bool> {
        let Some(item) = self.items.get(index) else {
            return Ok(false);
        };
        if item.disabled {
            return Ok(false);
        }
        let value = item.value.clone();
        self.set_value(Some(&value))?;
        Ok(true)
    }

    /// Replace the items with those returned by `source` for `query`.
    ///
    /// On success the previous value is re-validated against the new list and
    /// cleared if it is no longer selectable. On failure the items and value
    /// are left untouched and the retrieval error is returned.
    #[instrument(skip_all, fields(picker = %self.id))]
    pub async fn update_component(
        &mut self,
        source: &dyn ItemSource,
        query: Option<&str>,
    ) -> MapResult<()> {
        let query = query.unwrap_or_default();
        match source.fetch_items(query).await {
            Ok(items) => {
                debug!(count = items.len(), "Replacing picker items");
                self.items = items;
                if self.validate().is_err() {
                    debug!(value = ?self.value, "Selection no longer available");
                    self.value = None;
                }
                Ok(())
            }
            Err(err) => {
                let err = match err {
                    MapError::Retrieval(_) => err,
                    other => MapError::Retrieval(other.to_string()),
                };
                warn!(error = %err, "Picker update failed");
                self.status = err.to_string();
                Err(err)
            }
        }
    }

    fn check(&self, value: Option<&str>) -> MapResult<()> {
        let Some(value) = value else {
            return Err(MapError::InvalidValue("null".to_string()));
        };
        match self.items.iter().find(|item| item.value == value) {
            Some(item) if item.disabled => Err(MapError::DisabledValue(value.to_string())),
            Some(_) => Ok(()),
            None => Err(MapError::InvalidValue(value.to_string())),
        }
    }
}

impl Widget for MenuPicker {
    fn id(&self) -> &str {
        &self.id
    }

    fn render(&self) -> RenderedMenu {
        let class = if self.collapsible {
            "menuPicker collapsible".to_string()
        } else {
            "menuPicker".to_string()
        };

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let selected = self.value.as_deref() == Some(item.value.as_str());
                let class = if item.disabled {
                    Some(ItemClass::Disabled)
                } else if selected {
                    Some(ItemClass::Selected)
                } else {
                    None
                };
                RenderedItem {
                    id: format!("{}_item{}", self.id, i),
                    label: item.label.clone(),
                    class,
                    clickable: !item.disabled,
                }
            })
            .collect();

        RenderedMenu { class, items }
    }

    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn set_value(&mut self, value: Option<&str>) -> MapResult<()> {
        if let Err(err) = self.check(value) {
            self.status = err.to_string();
            return Err(err);
        }
        self.value = value.map(str::to_string);
        Ok(())
    }

    fn validate(&mut self) -> MapResult<()> {
        let result = self.check(self.value.as_deref());
        if let Err(err) = &result {
            self.status = err.to_string();
        }
        result
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker() -> MenuPicker {
        MenuPicker::new(
            "product",
            vec![
                MenuItem::new("Terra", "terra"),
                MenuItem::new("Aqua", "aqua").disabled(),
                MenuItem::new("Combined", "combined"),
            ],
        )
    }

    #[test]
    fn test_set_value_valid() {
        let mut p = picker();
        p.set_value(Some("terra")).unwrap();
        assert_eq!(p.value(), Some("terra"));
    }

    #[test]
    fn test_disabled_value_keeps_previous() {
        let mut p = picker();
        p.set_value(Some("terra")).unwrap();

        let err = p.set_value(Some("aqua")).unwrap_err();
        assert!(matches!(err, MapError::DisabledValue(_)));
        assert_eq!(p.value(), Some("terra"));
        assert_eq!(p.status(), "List item with value = aqua is disabled");
    }

    #[test]
    fn test_unknown_value_keeps_previous() {
        let mut p = picker();
        p.set_value(Some("combined")).unwrap();

        let err = p.set_value(Some("viirs")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(p.value(), Some("combined"));
        assert_eq!(p.status(), "List item value = viirs is not valid");
    }

    #[test]
    fn test_nothing_selected_is_invalid() {
        let mut p = picker();
        assert!(p.validate().is_err());
        assert_eq!(p.status(), "List item value = null is not valid");
    }

    #[test]
    fn test_render() {
        let mut p = picker().collapsible(true);
        p.set_value(Some("combined")).unwrap();
        let menu = p.render();

        assert_eq!(menu.class, "menuPicker collapsible");
        let ids: Vec<_> = menu.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["product_item0", "product_item1", "product_item2"]);
        assert_eq!(menu.items[0].class, None);
        assert_eq!(menu.items[1].class, Some(ItemClass::Disabled));
        assert!(!menu.items[1].clickable);
        assert_eq!(menu.items[2].class, Some(ItemClass::Selected));
    }

    #[test]
    fn test_click() {
        let mut p = picker();
        assert!(p.click(0).unwrap());
        assert_eq!(p.value(), Some("terra"));
        assert!(!p.click(1).unwrap());
        assert!(!p.click(9).unwrap());
        assert_eq!(p.value(), Some("terra"));
    }

    #[test]
    fn test_load_from_query() {
        let mut p = picker();
        p.load_from_query("time=2014-01-01&product=combined").unwrap();
        assert_eq!(p.value(), Some("combined"));

        assert!(p.load_from_query("time=2014-01-01").is_err());
        assert_eq!(p.value(), Some("combined"));
    }

    #[test]
    fn test_from_config_drops_invalid_selection() {
        let config = PickerConfig {
            items: vec![MenuItem::new("Aqua", "aqua").disabled()],
            selected: Some("aqua".to_string()),
            ..PickerConfig::default()
        };
        let p = MenuPicker::from_config("product", config);
        assert_eq!(p.value(), None);
        assert_eq!(p.status(), "List item with value = aqua is disabled");
    }

    #[test]
    fn test_from_config() {
        let config: PickerConfig = serde_json::from_str(
            r#"{
                "items": [{"label": "Terra", "value": "terra"}],
                "selected": "terra",
                "isCollapsible": true,
                "dataSourceUrl": "/accessor?"
            }"#,
        )
        .unwrap();
        let p = MenuPicker::from_config("product", config);
        assert_eq!(p.value(), Some("terra"));
        assert_eq!(p.data_source_url(), Some("/accessor?"));
        assert!(p.render().class.ends_with("collapsible"));
    }
}
