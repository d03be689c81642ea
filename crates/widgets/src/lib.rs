//! Selection widgets.
//!
//! A widget owns a current value that is always one of its enabled items (or
//! nothing). Item lists can be refreshed from an [`ItemSource`]; the current
//! value is re-validated against the new list when the refresh completes.

pub mod picker;
pub mod query;
pub mod source;

use map_common::MapResult;

pub use picker::{ItemClass, MenuItem, MenuPicker, PickerConfig, RenderedItem, RenderedMenu};
pub use query::extract_from_query;
pub use source::{HttpItemSource, ItemSource, ItemsResponse, StaticItemSource};

/// Common behavior of selection widgets.
pub trait Widget {
    /// Container id, also the query string key of the widget.
    fn id(&self) -> &str;

    /// Build the view model for the current items and selection.
    fn render(&self) -> RenderedMenu;

    fn value(&self) -> Option<&str>;

    /// Select `value`. The previous value is kept when validation fails.
    fn set_value(&mut self, value: Option<&str>) -> MapResult<()>;

    /// Check the current value against the available items.
    fn validate(&mut self) -> MapResult<()>;

    /// Last user prompt or error message.
    fn status(&self) -> &str;

    /// Select the value stored under this widget's id in `query`.
    fn load_from_query(&mut self, query: &str) -> MapResult<()> {
        let value = extract_from_query(self.id(), query);
        self.set_value(value.as_deref())
    }
}
