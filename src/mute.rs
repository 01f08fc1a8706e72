// Muting of the secondary viewport's layers

use serde_json::json;

use crate::constants::{MUTED_FILL_OPACITY, MUTED_LINE_OPACITY};
use crate::engine::MapEngine;
use crate::style::LayerKind;

/// Opacity applied to each layer family of the muted viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuteOpacities {
    pub fill: f64,
    pub line: f64,
    /// Point-like layers (circle, heatmap)
    pub point: f64,
}

impl MuteOpacities {
    pub fn for_kind(&self, kind: &LayerKind) -> Option<f64> {
        match kind {
            LayerKind::Fill | LayerKind::FillExtrusion => Some(self.fill),
            LayerKind::Line => Some(self.line),
            LayerKind::Circle | LayerKind::Heatmap => Some(self.point),
            _ => None,
        }
    }
}

impl Default for MuteOpacities {
    fn default() -> Self {
        Self {
            fill: MUTED_FILL_OPACITY,
            line: MUTED_LINE_OPACITY,
            point: MUTED_LINE_OPACITY,
        }
    }
}

/// Outcome of one muting pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MuteReport {
    pub muted: Vec<String>,
    /// Layers without an opacity paint property
    pub skipped: Vec<String>,
    /// Layers the engine refused to update
    pub failed: Vec<String>,
}

/// Set every layer of `engine` to its muted opacity.
///
/// Best effort: unsupported layer kinds are skipped and engine errors are
/// logged per layer, never returned. Values are absolute, so repeated calls
/// leave the same result.
pub fn mute_layers<E: MapEngine>(engine: &mut E, opacities: &MuteOpacities) -> MuteReport {
    let mut report = MuteReport::default();

    for layer in engine.layers() {
        let target = layer
            .kind
            .opacity_property()
            .zip(opacities.for_kind(&layer.kind));

        let Some((property, opacity)) = target else {
            log::debug!("Mute: skipping '{}' ({} has no opacity)", layer.id, layer.kind.as_str());
            report.skipped.push(layer.id);
            continue;
        };

        match engine.set_paint_property(&layer.id, property, json!(opacity)) {
            Ok(()) => report.muted.push(layer.id),
            Err(e) => {
                log::debug!("Mute: ignoring '{}': {}", layer.id, e);
                report.failed.push(layer.id);
            }
        }
    }

    log::info!(
        "Muted {} layers ({} skipped, {} failed)",
        report.muted.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessEngine;
    use crate::style::{ids, LayerSpec, StyleTable};
    use crate::Camera;
    use proptest::prelude::*;

    fn populated() -> HeadlessEngine {
        let mut engine = HeadlessEngine::new(Camera::default(), 800.0, 600.0);
        engine.load_style();
        StyleTable::nyc().apply_to(&mut engine);
        engine
    }

    #[test]
    fn test_mutes_by_layer_family() {
        let mut engine = populated();
        let report = mute_layers(&mut engine, &MuteOpacities::default());

        assert_eq!(report.muted.len(), 5);
        assert_eq!(engine.paint_value(ids::FRESH_ZONING, "fill-opacity"), Some(&json!(0.15)));
        assert_eq!(engine.paint_value(ids::TRUCK_ROUTES, "line-opacity"), Some(&json!(0.2)));
        assert_eq!(
            engine.paint_value(ids::WHOLESALE_MARKETS, "circle-opacity"),
            Some(&json!(0.2))
        );
    }

    #[test]
    fn test_skips_layers_without_opacity() {
        let mut engine = HeadlessEngine::new(Camera::default(), 800.0, 600.0);
        engine.load_style();
        engine.insert_base_layer("background", LayerKind::Background);
        engine.insert_base_layer("satellite", LayerKind::Raster);
        StyleTable::nyc().apply_to(&mut engine);

        let report = mute_layers(&mut engine, &MuteOpacities::default());

        assert_eq!(report.skipped, vec!["background".to_string(), "satellite".to_string()]);
        assert_eq!(report.muted.len(), 5);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_engine_failure_does_not_stop_the_pass() {
        let mut engine = populated();
        engine.fail_paint_on(ids::STORMWATER);

        let report = mute_layers(&mut engine, &MuteOpacities::default());

        assert_eq!(report.failed, vec![ids::STORMWATER.to_string()]);
        assert_eq!(report.muted.len(), 4);
        assert_eq!(engine.paint_value(ids::STORMWATER, "fill-opacity"), Some(&json!(0.35)));
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let mut engine = populated();
        let mut sky = LayerSpec::new("sky", LayerKind::Other("sky".into()), ids::CENSUS_TRACTS);
        sky.source = None;
        assert!(engine.add_layer(&sky).is_ok());

        let report = mute_layers(&mut engine, &MuteOpacities::default());
        assert_eq!(report.skipped, vec!["sky".to_string()]);
    }

    proptest! {
        #[test]
        fn muting_is_idempotent(passes in 1usize..5, fill in 0.0f64..1.0, line in 0.0f64..1.0) {
            let opacities = MuteOpacities { fill, line, point: line };

            let mut once = populated();
            mute_layers(&mut once, &opacities);

            let mut many = populated();
            for _ in 0..passes {
                mute_layers(&mut many, &opacities);
            }

            for layer in StyleTable::nyc().layers {
                let property = layer.kind.opacity_property().unwrap_or_default();
                prop_assert_eq!(once.paint_value(&layer.id, property), many.paint_value(&layer.id, property));
            }
        }
    }
}
