//! Drives the selection model and map surfaces through a scenario.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use map_common::{AppConfig, BoundingBox, LayerId, MapError, MapResult};
use map_ui::{
    HeadlessSurface, ManualClock, MapModel, MapSurface, MapUi, Reconciled, SelectionState,
    Subscription,
};
use tracing::{debug, info, instrument, warn};
use widgets::{HttpItemSource, MenuPicker, Widget};

use crate::scenario::{Scenario, Step};
use crate::snapshot::{FailureView, Snapshot, StepErrorView};

/// A running scenario.
pub struct Replay {
    state: SelectionState,
    ui: MapUi<HeadlessSurface>,
    clock: ManualClock,
    pickers: BTreeMap<String, MenuPicker>,
    failures: Vec<FailureView>,
    step_errors: Vec<StepErrorView>,
    published: Rc<RefCell<Vec<BoundingBox>>>,
    _extent_subscription: Subscription,
}

impl Replay {
    /// Apply the scenario's initial selection and start the map.
    pub fn new(config: AppConfig, scenario: &Scenario) -> Result<Self> {
        config.validate().context("Invalid map configuration")?;
        let config = Rc::new(config);
        let clock = ManualClock::new();
        let window = scenario.window;

        let ui = MapUi::with_clock(
            Rc::clone(&config),
            |proj| HeadlessSurface::new(proj.clone(), (window.width, window.height)),
            Box::new(clock.clone()),
        )?;

        let published = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&published);
        let subscription = ui
            .extent_events()
            .subscribe(move |extent: &BoundingBox| sink.borrow_mut().push(*extent));

        let mut state = SelectionState::new(Rc::clone(&config), scenario.date);
        if let Some(projection) = &scenario.projection {
            state.select_projection(projection)?;
        }
        for layer in &scenario.layers {
            state.add_layer(layer)?;
        }
        // The start below renders the whole initial selection.
        state.drain_events();

        let pickers = scenario
            .pickers
            .iter()
            .map(|(id, picker)| (id.clone(), MenuPicker::from_config(id.clone(), picker.clone())))
            .collect();

        let mut replay = Self {
            state,
            ui,
            clock,
            pickers,
            failures: Vec::new(),
            step_errors: Vec::new(),
            published,
            _extent_subscription: subscription,
        };

        replay.ui.on_resize(window.small);
        let report = replay.ui.start(&mut replay.state)?;
        replay.record(report);
        info!(
            projection = %replay.state.selected_projection(),
            layers = scenario.layers.len(),
            "Started map"
        );
        Ok(replay)
    }

    /// Run every step of `scenario`. A rejected step is recorded and the
    /// run continues with the next one.
    pub async fn run(&mut self, scenario: &Scenario) -> Result<()> {
        for (index, step) in scenario.steps.iter().enumerate() {
            if let Err(err) = self.step(step).await {
                warn!(step = index, action = step.name(), error = %err, "Step rejected");
                self.step_errors.push(StepErrorView {
                    step: index,
                    action: step.name(),
                    error: err.to_string(),
                });
            }
        }
        Ok(())
    }

    #[instrument(skip_all, fields(action = step.name()))]
    pub async fn step(&mut self, step: &Step) -> Result<()> {
        debug!(?step, "Applying step");
        match step {
            Step::AddLayer { layer } => self.state.add_layer(layer)?,
            Step::RemoveLayer { layer } => self.state.remove_layer(&LayerId::from(layer.as_str()))?,
            Step::SetVisibility { layer, visible } => self
                .state
                .set_visibility(&LayerId::from(layer.as_str()), *visible)?,
            Step::SetOpacity { layer, opacity } => self
                .state
                .set_opacity(&LayerId::from(layer.as_str()), *opacity)?,
            Step::MoveUp { layer } => self.state.move_up(&LayerId::from(layer.as_str()))?,
            Step::MoveDown { layer } => self.state.move_down(&LayerId::from(layer.as_str()))?,
            Step::SelectDate { date } => self.state.select_date(*date),
            Step::SelectProjection { projection } => self.state.select_projection(projection)?,
            Step::SetCustomPalette { layer, palette } => self
                .state
                .set_custom_palette(&LayerId::from(layer.as_str()), palette)?,
            Step::ClearCustomPalette { layer } => self
                .state
                .clear_custom_palette(&LayerId::from(layer.as_str()))?,
            Step::SetRange { layer, min, max } => {
                self.state
                    .set_range(&LayerId::from(layer.as_str()), *min, *max)?
            }
            Step::Preload { date } => {
                let report = self.ui.preload(&self.state, *date);
                self.record(report);
            }
            Step::Pan { center } => {
                let surface = self
                    .ui
                    .active_mut()
                    .ok_or_else(|| anyhow!("No active map surface"))?;
                surface.set_center((center[0], center[1]));
                self.ui.on_viewport_changed(&mut self.state);
            }
            Step::Zoom { delta } => self.ui.zoom_by(&mut self.state, *delta),
            Step::Resize {
                width,
                height,
                small,
            } => {
                for (_, surface) in self.ui.surfaces_mut() {
                    surface.resize_container((*width, *height));
                }
                self.ui.on_resize(*small);
                self.ui.on_viewport_changed(&mut self.state);
            }
            Step::Wait { ms } => {
                self.clock.advance(Duration::from_millis(*ms));
                self.ui.tick(&mut self.state);
            }
            Step::SelectItem { picker, value } => {
                self.picker_mut(picker)?.set_value(Some(value.as_str()))?;
            }
            Step::UpdatePicker { picker, query } => {
                let picker = self.picker_mut(picker)?;
                let url = picker
                    .data_source_url()
                    .ok_or_else(|| anyhow!("Picker '{}' has no data source", picker.id()))?
                    .to_string();
                let source = HttpItemSource::new(url)?;
                picker.update_component(&source, query.as_deref()).await?;
            }
        }
        self.sync()?;
        Ok(())
    }

    /// Forward queued model changes to the map.
    fn sync(&mut self) -> MapResult<()> {
        for event in self.state.drain_events() {
            let report = self.ui.handle(&mut self.state, &event)?;
            self.record(report);
        }
        Ok(())
    }

    fn record(&mut self, report: Reconciled) {
        self.failures
            .extend(report.failures.into_iter().map(|f| FailureView {
                layer: f.layer.to_string(),
                error: f.error.to_string(),
            }));
    }

    fn picker_mut(&mut self, id: &str) -> MapResult<&mut MenuPicker> {
        self.pickers
            .get_mut(id)
            .ok_or_else(|| MapError::InvalidField {
                field: "picker".to_string(),
                message: format!("unknown picker '{}'", id),
            })
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn ui(&self) -> &MapUi<HeadlessSurface> {
        &self.ui
    }

    pub fn pickers(&self) -> &BTreeMap<String, MenuPicker> {
        &self.pickers
    }

    pub fn failures(&self) -> &[FailureView] {
        &self.failures
    }

    pub fn step_errors(&self) -> &[StepErrorView] {
        &self.step_errors
    }

    pub fn published_extents(&self) -> usize {
        self.published.borrow().len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}
