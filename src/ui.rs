// Contract with the page hosting the lens (DOM on the web)

use crate::camera::ScreenPoint;
use crate::lens::{ClipCircle, Mode};
use crate::tooltip::{TractDetails, Tooltip};

/// Panels and control groups whose visibility the controller toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Overview,
    Probe,
    /// Legend and other controls only meaningful in overview mode
    OverviewControls,
}

pub trait ProbeUi {
    /// Mark the toggle for `mode` active and the other inactive
    fn set_active_toggle(&mut self, mode: Mode);

    fn set_panel_visible(&mut self, panel: Panel, visible: bool);

    /// Center the lens overlay on `center` and size it to `radius`
    fn place_lens_overlay(&mut self, center: ScreenPoint, radius: f64);

    fn set_lens_overlay_visible(&mut self, visible: bool);

    /// Restrict the primary viewport's surface to `clip`, or clear it
    fn set_primary_clip(&mut self, clip: Option<ClipCircle>);

    fn show_tooltip(&mut self, tooltip: &Tooltip);

    fn hide_tooltip(&mut self);

    /// Fill the tract detail panel, or empty it on `None`
    fn show_tract_details(&mut self, details: Option<&TractDetails>);
}
