//! Layer style table shared by both viewports
//!
//! The table is static configuration: it is applied identically to the primary
//! and secondary viewport once their styles have loaded, and only the
//! per-layer opacity differs between the two afterwards (see `mute`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::engine::MapEngine;

/// Layer ids of the NYC table
pub mod ids {
    pub const CENSUS_TRACTS: &str = "census-tracts";
    pub const STORMWATER: &str = "stormwater-flood";
    pub const FRESH_ZONING: &str = "nyc-fresh-zoning";
    pub const TRUCK_ROUTES: &str = "nyc-truck-routes";
    pub const WHOLESALE_MARKETS: &str = "wholesale-markets";
}

/// Grocery-zoning incentive colors, keyed by lower-cased zone name
pub const ZONING_COLORS: &[(&str, &str)] = &[
    ("discretionary tax incentives", "#4caf50"),
    ("zoning incentives", "#8e44ad"),
    ("zoning and discretionary tax incentives", "#e74c3c"),
];
pub const ZONING_DEFAULT_COLOR: &str = "#ffe066";

/// Truck route colors keyed by `routetype`
pub const ROUTE_TYPE_COLORS: &[(&str, &str)] = &[("Local", "#1a73e8"), ("Through", "#e67e22")];
pub const ROUTE_TYPE_DEFAULT_COLOR: &str = "#888888";

/// Fragility ramp stops (score, color)
pub const FRAGILITY_RAMP: &[(f64, &str)] = &[(0.0, "#fff5eb"), (0.5, "#fd8d3c"), (1.0, "#7f2704")];

/// Rendering kind of a style layer, mirroring the engine's `type` strings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Fill,
    Line,
    Circle,
    Symbol,
    Heatmap,
    FillExtrusion,
    Background,
    Raster,
    Hillshade,
    Other(String),
}

impl LayerKind {
    pub fn from_type(name: &str) -> Self {
        match name {
            "fill" => LayerKind::Fill,
            "line" => LayerKind::Line,
            "circle" => LayerKind::Circle,
            "symbol" => LayerKind::Symbol,
            "heatmap" => LayerKind::Heatmap,
            "fill-extrusion" => LayerKind::FillExtrusion,
            "background" => LayerKind::Background,
            "raster" => LayerKind::Raster,
            "hillshade" => LayerKind::Hillshade,
            other => LayerKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Circle => "circle",
            LayerKind::Symbol => "symbol",
            LayerKind::Heatmap => "heatmap",
            LayerKind::FillExtrusion => "fill-extrusion",
            LayerKind::Background => "background",
            LayerKind::Raster => "raster",
            LayerKind::Hillshade => "hillshade",
            LayerKind::Other(name) => name,
        }
    }

    /// Single paint property that controls the whole layer's opacity, if any.
    /// Symbol layers split opacity across text and icon and are left alone.
    pub fn opacity_property(&self) -> Option<&'static str> {
        match self {
            LayerKind::Fill => Some("fill-opacity"),
            LayerKind::Line => Some("line-opacity"),
            LayerKind::Circle => Some("circle-opacity"),
            LayerKind::Heatmap => Some("heatmap-opacity"),
            LayerKind::FillExtrusion => Some("fill-extrusion-opacity"),
            _ => None,
        }
    }
}

impl Serialize for LayerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LayerKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(LayerKind::from_type(&name))
    }
}

/// GeoJSON source definition; `id` is passed separately to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
    /// Feature property promoted to the feature id, needed for feature-state
    #[serde(rename = "promoteId", skip_serializing_if = "Option::is_none", default)]
    pub promote_id: Option<String>,
}

impl SourceSpec {
    pub fn geojson(id: &str, data: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: "geojson".to_string(),
            data: data.to_string(),
            promote_id: None,
        }
    }

    pub fn with_promote_id(mut self, property: &str) -> Self {
        self.promote_id = Some(property.to_string());
        self
    }
}

/// Layer definition in the engine's JSON layer format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub layout: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub paint: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(id: &str, kind: LayerKind, source: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            source: Some(source.to_string()),
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    pub fn paint(mut self, property: &str, value: Value) -> Self {
        self.paint.insert(property.to_string(), value);
        self
    }

    pub fn layout(mut self, property: &str, value: Value) -> Self {
        self.layout.insert(property.to_string(), value);
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Ordered sources and layers applied to each viewport
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleTable {
    pub sources: Vec<SourceSpec>,
    pub layers: Vec<LayerSpec>,
}

impl StyleTable {
    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Add every source and layer to `engine`. Must only be called once the
    /// engine's style has loaded. Failures are logged and skipped; returns the
    /// number of layers added.
    pub fn apply_to<E: MapEngine>(&self, engine: &mut E) -> usize {
        for source in &self.sources {
            if let Err(e) = engine.add_source(source) {
                log::warn!("Could not add source '{}': {}", source.id, e);
            }
        }

        let mut added = 0;
        for layer in &self.layers {
            match engine.add_layer(layer) {
                Ok(()) => added += 1,
                Err(e) => log::warn!("Could not add layer '{}': {}", layer.id, e),
            }
        }
        added
    }

    /// Grocery-zoning, truck-route, stormwater, wholesale-market and
    /// census-tract layers, bottom to top
    pub fn nyc() -> Self {
        let sources = vec![
            SourceSpec::geojson(ids::CENSUS_TRACTS, "data/census-tracts-fragility.geojson")
                .with_promote_id("geoid"),
            SourceSpec::geojson(ids::STORMWATER, "data/stormewater-flood-wgs84.geojson"),
            SourceSpec::geojson(ids::FRESH_ZONING, "data/nyc-fresh-zoining.geojson"),
            SourceSpec::geojson(ids::TRUCK_ROUTES, "data/nyc-truck-routes-2026.geojson"),
            SourceSpec::geojson(ids::WHOLESALE_MARKETS, "data/nyc-wholesale-markets-clean.geojson"),
        ];

        let zoning_names: Vec<&str> = ZONING_COLORS.iter().map(|(name, _)| *name).collect();

        let layers = vec![
            LayerSpec::new(ids::CENSUS_TRACTS, LayerKind::Fill, ids::CENSUS_TRACTS)
                .paint("fill-color", fragility_color_expression())
                .paint(
                    "fill-opacity",
                    json!(["case", ["boolean", ["feature-state", "hover"], false], 0.85, 0.6]),
                ),
            LayerSpec::new(ids::STORMWATER, LayerKind::Fill, ids::STORMWATER)
                .paint("fill-color", json!("#3b82f6"))
                .paint("fill-opacity", json!(0.35)),
            LayerSpec::new(ids::FRESH_ZONING, LayerKind::Fill, ids::FRESH_ZONING)
                .paint("fill-color", zoning_color_expression(&zoning_names))
                .paint("fill-opacity", json!(0.45)),
            LayerSpec::new(ids::TRUCK_ROUTES, LayerKind::Line, ids::TRUCK_ROUTES)
                .layout("line-join", json!("round"))
                .layout("line-cap", json!("round"))
                .paint("line-color", route_color_expression())
                .paint("line-width", json!(2.5))
                .paint("line-opacity", json!(0.85))
                .paint(
                    "line-dasharray",
                    json!([
                        "case",
                        ["==", ["get", "truckroute"], "Y"],
                        ["literal", [2, 2]],
                        ["literal", [1, 0]]
                    ]),
                ),
            LayerSpec::new(ids::WHOLESALE_MARKETS, LayerKind::Circle, ids::WHOLESALE_MARKETS)
                .paint("circle-color", json!("#111827"))
                .paint("circle-radius", json!(5))
                .paint("circle-opacity", json!(0.9)),
        ];

        Self { sources, layers }
    }
}

/// Case-insensitive `match` on the zone `name`; unknown names get the default color
pub fn zoning_color_expression(names: &[&str]) -> Value {
    let mut expr = vec![json!("match"), json!(["downcase", ["get", "name"]])];
    let mut seen = Vec::new();
    for name in names {
        let key = name.trim().to_lowercase();
        // match labels must be unique
        if seen.contains(&key) {
            continue;
        }
        let color = ZONING_COLORS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, c)| *c)
            .unwrap_or(ZONING_DEFAULT_COLOR);
        expr.push(json!(key));
        expr.push(json!(color));
        seen.push(key);
    }
    expr.push(json!(ZONING_DEFAULT_COLOR));
    Value::Array(expr)
}

fn route_color_expression() -> Value {
    let mut expr = vec![json!("match"), json!(["get", "routetype"])];
    for (route_type, color) in ROUTE_TYPE_COLORS {
        expr.push(json!(route_type));
        expr.push(json!(color));
    }
    expr.push(json!(ROUTE_TYPE_DEFAULT_COLOR));
    Value::Array(expr)
}

fn fragility_color_expression() -> Value {
    let mut expr = vec![
        json!("interpolate"),
        json!(["linear"]),
        json!(["coalesce", ["get", "logistics_fragility"], 0]),
    ];
    for (stop, color) in FRAGILITY_RAMP {
        expr.push(json!(stop));
        expr.push(json!(color));
    }
    Value::Array(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_kind_type_strings() {
        for name in ["fill", "line", "circle", "symbol", "fill-extrusion", "raster"] {
            assert_eq!(LayerKind::from_type(name).as_str(), name);
        }
        assert_eq!(
            LayerKind::from_type("sky"),
            LayerKind::Other("sky".to_string())
        );
    }

    #[test]
    fn test_opacity_property_only_for_single_opacity_kinds() {
        assert_eq!(LayerKind::Fill.opacity_property(), Some("fill-opacity"));
        assert_eq!(LayerKind::Circle.opacity_property(), Some("circle-opacity"));
        assert_eq!(LayerKind::Background.opacity_property(), None);
        assert_eq!(LayerKind::Raster.opacity_property(), None);
        assert_eq!(LayerKind::Symbol.opacity_property(), None);
    }

    #[test]
    fn test_layer_spec_serializes_to_engine_format() {
        let table = StyleTable::nyc();
        let routes = table.layer(ids::TRUCK_ROUTES).map(LayerSpec::to_json);
        let routes = routes.unwrap_or(Value::Null);
        assert_eq!(routes["type"], "line");
        assert_eq!(routes["source"], ids::TRUCK_ROUTES);
        assert_eq!(routes["layout"]["line-cap"], "round");
        assert_eq!(routes["paint"]["line-width"], 2.5);
    }

    #[test]
    fn test_source_spec_omits_id() {
        let source = SourceSpec::geojson("tracts", "data/t.geojson").with_promote_id("geoid");
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value, json!({ "type": "geojson", "data": "data/t.geojson", "promoteId": "geoid" }));
    }

    #[test]
    fn test_zoning_expression_lowercases_and_dedups() {
        let expr = zoning_color_expression(&["Zoning incentives", " zoning incentives ", "Other"]);
        assert_eq!(
            expr,
            json!([
                "match",
                ["downcase", ["get", "name"]],
                "zoning incentives",
                "#8e44ad",
                "other",
                ZONING_DEFAULT_COLOR,
                ZONING_DEFAULT_COLOR
            ])
        );
    }

    #[test]
    fn test_nyc_table_layers_have_sources() {
        let table = StyleTable::nyc();
        assert_eq!(table.layers.len(), 5);
        for layer in &table.layers {
            let source = layer.source.as_deref().unwrap_or_default();
            assert!(table.sources.iter().any(|s| s.id == source), "{}", layer.id);
        }
    }
}
