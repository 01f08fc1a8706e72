//! Scripted session events for the desktop replay tool
//!
//! Each event is a short token such as `probe`, `move:50,50` or `zoom:12`.
//! Events drive a `LensController` over the headless engine exactly the way
//! the web host's DOM and engine callbacks would.

use std::str::FromStr;

use thiserror::Error;

use crate::camera::{ContainerRect, LngLat, ScreenPoint};
use crate::controller::LensController;
use crate::engine::{MapEngine, ViewportRole};
use crate::headless::{HeadlessEngine, RecordingUi};
use crate::lens::Mode;

pub type HeadlessSession = LensController<HeadlessEngine, RecordingUi>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("event '{event}' expects {expected}")]
    BadArguments { event: String, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Style-loaded signal; `None` for both viewports
    Load(Option<ViewportRole>),
    Probe,
    Overview,
    /// Pointer at container-local coordinates
    Move(f64, f64),
    Enter,
    Leave,
    Zoom(f64),
    Pan(f64, f64),
    Rotate(f64),
    Tilt(f64),
    Radius(f64),
    Resize(f64, f64),
    Hover(f64, f64),
    Click(f64, f64),
}

impl FromStr for Event {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name, Some(args)),
            None => (s, None),
        };

        let bad = |expected: &'static str| ScriptError::BadArguments {
            event: name.to_string(),
            expected,
        };
        let one = || -> Result<f64, ScriptError> {
            args.and_then(|a| a.trim().parse().ok())
                .ok_or_else(|| bad("one number"))
        };
        let pair = || -> Result<(f64, f64), ScriptError> {
            let (a, b) = args
                .and_then(|a| a.split_once(','))
                .ok_or_else(|| bad("two numbers, e.g. 50,50"))?;
            match (a.trim().parse(), b.trim().parse()) {
                (Ok(a), Ok(b)) => Ok((a, b)),
                _ => Err(bad("two numbers, e.g. 50,50")),
            }
        };

        let event = match name {
            "load" => match args {
                None => Event::Load(None),
                Some("primary") => Event::Load(Some(ViewportRole::Primary)),
                Some("secondary") => Event::Load(Some(ViewportRole::Secondary)),
                Some(_) => return Err(bad("'primary' or 'secondary'")),
            },
            "probe" => Event::Probe,
            "overview" => Event::Overview,
            "enter" => Event::Enter,
            "leave" => Event::Leave,
            "move" => pair().map(|(x, y)| Event::Move(x, y))?,
            "zoom" => Event::Zoom(one()?),
            "pan" => pair().map(|(lng, lat)| Event::Pan(lng, lat))?,
            "rotate" => Event::Rotate(one()?),
            "tilt" => Event::Tilt(one()?),
            "radius" => Event::Radius(one()?),
            "resize" => pair().map(|(w, h)| Event::Resize(w, h))?,
            "hover" => pair().map(|(x, y)| Event::Hover(x, y))?,
            "click" => pair().map(|(x, y)| Event::Click(x, y))?,
            _ => return Err(ScriptError::UnknownEvent(s.to_string())),
        };
        Ok(event)
    }
}

/// Deliver one event to the session, the way the web host would
pub fn apply(session: &mut HeadlessSession, event: &Event) {
    let rect = session.container();
    match *event {
        Event::Load(role) => {
            let roles = match role {
                Some(role) => vec![role],
                None => vec![ViewportRole::Primary, ViewportRole::Secondary],
            };
            for role in roles {
                match role {
                    ViewportRole::Primary => session.primary_mut().load_style(),
                    ViewportRole::Secondary => session.secondary_mut().load_style(),
                }
                session.on_style_loaded(role);
            }
        }
        Event::Probe => session.set_probe_mode(true),
        Event::Overview => session.set_probe_mode(false),
        Event::Move(x, y) => {
            session.on_pointer_move(ScreenPoint::new(rect.left + x, rect.top + y), rect)
        }
        Event::Enter => session.on_pointer_enter_container(),
        Event::Leave => session.on_pointer_leave_container(),
        Event::Zoom(z) => camera_gesture(session, |e| e.zoom_gesture(z)),
        Event::Pan(lng, lat) => camera_gesture(session, |e| e.pan_gesture(LngLat::new(lng, lat))),
        Event::Rotate(b) => camera_gesture(session, |e| e.rotate_gesture(b)),
        Event::Tilt(p) => camera_gesture(session, |e| e.pitch_gesture(p)),
        Event::Radius(r) => {
            session.set_lens_radius(r);
        }
        Event::Resize(w, h) => {
            session.on_container_resize(ContainerRect::new(rect.left, rect.top, w, h))
        }
        Event::Hover(x, y) => session.on_hover(ScreenPoint::new(x, y)),
        Event::Click(x, y) => session.on_click(ScreenPoint::new(x, y)),
    }
}

fn camera_gesture(session: &mut HeadlessSession, gesture: impl FnOnce(&mut HeadlessEngine) -> bool) {
    if gesture(session.primary_mut()) {
        session.on_primary_camera_changed();
    }
}

/// One-line summary of the session state
pub fn describe(session: &HeadlessSession) -> String {
    let camera = session.secondary().camera();
    let lens = session.lens();
    let ui = session.ui();

    let lens_text = match (session.mode(), lens.center) {
        (Mode::Probe, Some(c)) => format!(
            "lens ({:.0},{:.0}) r{:.0} {}",
            c.x,
            c.y,
            lens.radius,
            if ui.lens_visible { "shown" } else { "hidden" }
        ),
        (Mode::Probe, None) => format!("lens waiting r{:.0}", lens.radius),
        (Mode::Overview, _) => "lens off".to_string(),
    };

    let mut line = format!(
        "{:<8} | {} | mirror ({:.4}, {:.4}) z{:.2} b{:.0} p{:.0}",
        session.mode(),
        lens_text,
        camera.center.lng,
        camera.center.lat,
        camera.zoom,
        camera.bearing,
        camera.pitch
    );
    if !session.is_ready() {
        line.push_str(" | loading");
    }
    if let Some(tooltip) = &ui.tooltip {
        line.push_str(&format!(" | tip: {}", tooltip.lines.join(" / ")));
    }
    if let Some(details) = &ui.tract_details {
        line.push_str(&format!(" | selected {}", details.geoid));
    }
    line
}

/// Picture of the container: `#` where the primary shows, `.` where the
/// muted secondary shows through, `+` at the lens center
pub fn ascii_lens(session: &HeadlessSession, cols: usize, rows: usize) -> String {
    let rect = session.container();
    let clip = session.ui().clip;
    let center_cell = session.lens().center.filter(|_| clip.is_some()).map(|c| {
        (
            ((c.x / rect.width) * cols as f64).floor() as usize,
            ((c.y / rect.height) * rows as f64).floor() as usize,
        )
    });

    let mut out = String::with_capacity((cols + 1) * rows);
    for row in 0..rows {
        for col in 0..cols {
            let point = ScreenPoint::new(
                (col as f64 + 0.5) * rect.width / cols as f64,
                (row as f64 + 0.5) * rect.height / rows as f64,
            );
            let c = if center_cell == Some((col, row)) {
                '+'
            } else {
                match clip {
                    Some(clip) if !clip.contains(point) => '.',
                    _ => '#',
                }
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}
