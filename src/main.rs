#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
use lenslib::{
    constants,
    engine::RenderedFeature,
    headless::{HeadlessEngine, RecordingUi},
    script::{self, Event},
    style::{ids, StyleTable},
    Camera, Config, LensController, LngLat, ScreenPoint,
};

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(name = "probe-lens")]
#[command(about = "Replay pointer and camera events through the NYC probe lens", long_about = None)]
struct Args {
    /// Initial map center as LNG,LAT
    #[arg(long, value_parser = parse_lng_lat, default_value = "-73.935242,40.730610")]
    center: LngLat,

    /// Initial zoom level
    #[arg(short, long, default_value_t = constants::DEFAULT_ZOOM)]
    zoom: f64,

    /// Lens radius in pixels
    #[arg(short, long, default_value_t = constants::DEFAULT_LENS_RADIUS)]
    radius: f64,

    /// Container width in pixels
    #[arg(long, default_value_t = constants::DEFAULT_WIDTH)]
    width: u32,

    /// Container height in pixels
    #[arg(long, default_value_t = constants::DEFAULT_HEIGHT)]
    height: u32,

    /// Fit the primary viewport to the five boroughs at startup
    #[arg(long)]
    fit_nyc: bool,

    /// Wait for explicit `load` events instead of loading both styles first
    #[arg(long)]
    defer_load: bool,

    /// Place a sample truck route and census tract at the container center
    #[arg(long)]
    demo_features: bool,

    /// Print an ASCII picture of the lens after every event
    #[arg(long)]
    ascii: bool,

    /// Events: probe, overview, move:X,Y, enter, leave, zoom:Z, pan:LNG,LAT,
    /// rotate:DEG, tilt:DEG, radius:PX, resize:W,H, hover:X,Y, click:X,Y,
    /// load[:primary|:secondary]
    #[arg(value_parser = parse_event)]
    events: Vec<Event>,
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_lng_lat(s: &str) -> Result<LngLat, String> {
    let (lng, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LNG,LAT (got '{}')", s))?;
    let lng = lng.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
    let lat = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
    Ok(LngLat::new(lng, lat))
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_event(s: &str) -> Result<Event, String> {
    s.parse().map_err(|e: script::ScriptError| e.to_string())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = Config {
        initial_camera: Camera::new(args.center, args.zoom),
        fit_bounds: args.fit_nyc.then_some(constants::NYC_BOUNDS),
        lens_radius: args.radius,
        width: args.width,
        height: args.height,
        ..Config::default()
    };

    if let Err(errors) = config.validate() {
        eprintln!("Invalid configuration:\n  {}", errors.join("\n  "));
        std::process::exit(2);
    }

    println!("NYC probe lens replay");
    println!("Container: {}x{}, lens radius {}px", args.width, args.height, args.radius);

    let (w, h) = (f64::from(args.width), f64::from(args.height));
    let primary = HeadlessEngine::new(config.initial_camera, w, h);
    let secondary = HeadlessEngine::new(config.initial_camera, w, h).non_interactive();
    let mut session = LensController::new(primary, secondary, RecordingUi::new(), config, StyleTable::nyc());

    if args.demo_features {
        place_demo_features(session.primary_mut(), w, h);
    }
    if !args.defer_load {
        script::apply(&mut session, &Event::Load(None));
    }

    println!("{:>16}  {}", "start", script::describe(&session));
    for event in &args.events {
        script::apply(&mut session, event);
        println!("{:>16}  {}", format!("{:?}", event), script::describe(&session));
        if args.ascii {
            print!("{}", script::ascii_lens(&session, 64, 24));
        }
    }

    if let Some(report) = session.mute_report() {
        println!(
            "Muted layers: {} (skipped {}, failed {})",
            report.muted.len(),
            report.skipped.len(),
            report.failed.len()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn place_demo_features(engine: &mut HeadlessEngine, width: f64, height: f64) {
    let center = ScreenPoint::new(width / 2.0, height / 2.0);
    let props = |value: serde_json::Value| value.as_object().cloned().unwrap_or_default();

    engine.place_feature(
        center,
        8.0,
        RenderedFeature {
            layer: ids::TRUCK_ROUTES.to_string(),
            source: ids::TRUCK_ROUTES.to_string(),
            id: None,
            properties: props(serde_json::json!({
                "street": "ATLANTIC AVENUE",
                "boroname": "Brooklyn",
                "routetype": "Through",
                "truckroute": "Y"
            })),
        },
    );
    engine.place_feature(
        center,
        60.0,
        RenderedFeature {
            layer: ids::CENSUS_TRACTS.to_string(),
            source: ids::CENSUS_TRACTS.to_string(),
            id: Some(serde_json::json!("36047016100")),
            properties: props(serde_json::json!({
                "geoid": "36047016100",
                "logistics_fragility": 0.62,
                "flood_exposure_norm": 0.41,
                "truck_dependency_norm": 0.88,
                "hub_proximity_norm": 0.35
            })),
        },
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {}
