//! Hover tooltips and the census-tract detail panel

use crate::camera::ScreenPoint;
use crate::constants::TOOLTIP_OFFSET;
use crate::engine::RenderedFeature;
use crate::style::ids;

/// Layers that produce a tooltip, highest priority first
pub const HOVER_LAYERS: &[&str] = &[
    ids::TRUCK_ROUTES,
    ids::WHOLESALE_MARKETS,
    ids::FRESH_ZONING,
    ids::CENSUS_TRACTS,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    /// Top-left corner, container-local pixels
    pub position: ScreenPoint,
    /// First line is the heading
    pub lines: Vec<String>,
}

impl Tooltip {
    /// Build the tooltip for the highest-priority feature among `features`
    pub fn for_features(features: &[RenderedFeature], point: ScreenPoint) -> Option<Tooltip> {
        let feature = HOVER_LAYERS
            .iter()
            .find_map(|layer| features.iter().find(|f| f.layer == *layer))?;

        let lines = match feature.layer.as_str() {
            ids::TRUCK_ROUTES => truck_route_lines(feature),
            ids::WHOLESALE_MARKETS => vec![
                feature
                    .prop_str("MARKET")
                    .or_else(|| feature.prop_str("market"))
                    .unwrap_or_else(|| "Wholesale Market".to_string()),
            ],
            ids::FRESH_ZONING => zoning_lines(feature),
            ids::CENSUS_TRACTS => {
                let details = TractDetails::from_feature(feature)?;
                vec![
                    format!("Tract {}", details.geoid),
                    format!("Logistics fragility: {}", format_score(details.fragility)),
                ]
            }
            _ => return None,
        };

        Some(Tooltip {
            position: ScreenPoint::new(point.x + TOOLTIP_OFFSET, point.y + TOOLTIP_OFFSET),
            lines,
        })
    }

    /// Heading in bold, remaining lines separated by `<br>`, all text escaped
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i == 0 {
                html.push_str(&format!("<strong>{}</strong>", escape_html(line)));
            } else {
                html.push_str("<br>");
                html.push_str(&escape_html(line));
            }
        }
        html
    }
}

fn truck_route_lines(feature: &RenderedFeature) -> Vec<String> {
    let na = || "N/A".to_string();
    let truck_route = if feature.prop_str("truckroute").as_deref() == Some("Y") {
        "Yes (dashed)"
    } else {
        "No (solid)"
    };
    vec![
        feature
            .prop_str("street")
            .unwrap_or_else(|| "Unknown Street".to_string()),
        format!("Borough: {}", feature.prop_str("boroname").unwrap_or_else(na)),
        format!("Route Type: {}", feature.prop_str("routetype").unwrap_or_else(na)),
        format!("Truck Route: {}", truck_route),
    ]
}

fn zoning_lines(feature: &RenderedFeature) -> Vec<String> {
    let name = feature.prop_str("name").unwrap_or_default();
    let key = name.trim().to_lowercase();
    let (label, detail) = match key.as_str() {
        "zoning and discretionary tax incentives" => {
            ("Strong City Support", "Zoning changes + tax incentives")
        }
        "zoning incentives" => ("Planning Support", "Zoning flexibility only"),
        "discretionary tax incentives" => ("Financial Support", "Tax incentives only"),
        _ => return vec![if name.is_empty() { "Fresh zone".to_string() } else { name }],
    };
    vec![label.to_string(), detail.to_string()]
}

/// Contents of the selected-tract panel
#[derive(Debug, Clone, PartialEq)]
pub struct TractDetails {
    pub geoid: String,
    pub fragility: Option<f64>,
    pub flood_exposure: Option<f64>,
    pub truck_dependency: Option<f64>,
    pub hub_proximity: Option<f64>,
}

impl TractDetails {
    /// `None` when the feature carries no tract id
    pub fn from_feature(feature: &RenderedFeature) -> Option<Self> {
        let geoid = feature.prop_str("geoid")?;
        Some(Self {
            geoid,
            fragility: feature.prop_f64("logistics_fragility"),
            flood_exposure: feature.prop_f64("flood_exposure_norm"),
            truck_dependency: feature.prop_f64("truck_dependency_norm"),
            hub_proximity: feature.prop_f64("hub_proximity_norm"),
        })
    }

    /// (label, formatted score) rows for the panel
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Logistics fragility", format_score(self.fragility)),
            ("Flood exposure", format_score(self.flood_exposure)),
            ("Truck dependency", format_score(self.truck_dependency)),
            ("Hub proximity", format_score(self.hub_proximity)),
        ]
    }
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.2}", s),
        None => "N/A".to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
