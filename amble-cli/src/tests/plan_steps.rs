//! Behaviour-driven step definitions driving the plan CLI scenarios.

use super::helpers::{
    decode_walk_extract, workspace, write_street_request, write_street_snapshot, write_utf8,
};
use super::*;
use crate::plan::run_plan_with;
use amble_core::RequestValidationError;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct PlanWorld {
    _tmp: TempDir,
    root: Utf8PathBuf,
    request_path: Utf8PathBuf,
    network: RefCell<Option<Utf8PathBuf>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl PlanWorld {
    fn new() -> Self {
        let (tmp, root) = workspace();
        let request_path = root.join("request.json");
        Self {
            _tmp: tmp,
            root,
            request_path,
            network: RefCell::new(None),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec![
            "amble".to_owned(),
            "plan".to_owned(),
            self.request_path.as_str().to_owned(),
            format!("--{ARG_PLAN_TIME_BUDGET_MS}"),
            "2000".to_owned(),
        ];
        if let Some(network) = self.network.borrow().as_ref() {
            argv.extend([format!("--{ARG_NETWORK}"), network.as_str().to_owned()]);
        }
        argv
    }

    fn output(&self) -> Value {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be JSON")
    }

    fn error(&self) -> CliError {
        match self.result.borrow_mut().take().expect("result recorded") {
            Ok(()) => panic!("expected the command to fail"),
            Err(err) => err,
        }
    }
}

#[fixture]
fn world() -> PlanWorld {
    PlanWorld::new()
}

#[given("a street network snapshot exists on disk")]
fn street_snapshot_exists(#[from(world)] world: &PlanWorld) {
    let path = world.root.join("street.json");
    write_street_snapshot(&path);
    world.network.replace(Some(path));
}

#[given("the walk extract exists on disk")]
fn walk_extract_exists(#[from(world)] world: &PlanWorld) {
    world
        .network
        .replace(Some(decode_walk_extract(&world.root)));
}

#[given("a request visiting the street out of order")]
fn street_request(#[from(world)] world: &PlanWorld) {
    write_street_request(&world.request_path, &[1, 6, 3, 5]);
}

#[given("a request crossing the walk extract")]
fn walk_request(#[from(world)] world: &PlanWorld) {
    write_utf8(
        &world.request_path,
        br#"{
            "waypoints": [
                {"name": "south-west corner", "lat": 51.5, "lng": -0.1},
                {"name": "Crumbs", "lat": 51.502, "lng": -0.099},
                {"name": "east crossing", "lat": 51.5, "lng": -0.098}
            ]
        }"#,
    );
}

#[given("the plan request contains invalid JSON")]
fn invalid_json_request(#[from(world)] world: &PlanWorld) {
    write_utf8(&world.request_path, b"{ not valid json");
}

#[given("a request with a single waypoint")]
fn single_waypoint_request(#[from(world)] world: &PlanWorld) {
    write_street_request(&world.request_path, &[2]);
}

#[when("I run the plan command")]
fn run_plan_command(#[from(world)] world: &PlanWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Plan(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_plan_with(args, &mut *buffer)
        }
        other => panic!("expected plan command, found {other:?}"),
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints the route in street order")]
fn prints_street_order(#[from(world)] world: &PlanWorld) {
    let output = world.output();
    assert_eq!(output["order"], serde_json::json!([0, 2, 3, 1]));
    let distance = output["distance"].as_f64().expect("distance is a number");
    assert!(distance <= 251.0, "route should not double back, got {distance}");
    assert!(output.get("exceeds_max_distance").is_none());
}

#[then("the output lists the corner cafe")]
fn lists_corner_cafe(#[from(world)] world: &PlanWorld) {
    let output = world.output();
    let pois = output["pois"].as_array().expect("pois array");
    let cafe = pois.first().expect("one POI near the street");
    assert_eq!(cafe["name"], "Corner Cafe");
    assert_eq!(cafe["type"], "food");
}

#[then("the command succeeds and visits the east crossing before the bakery")]
fn visits_east_first(#[from(world)] world: &PlanWorld) {
    let output = world.output();
    assert_eq!(output["order"], serde_json::json!([0, 2, 1]));
    let path = output["path"].as_array().expect("path array");
    let start = path.first().expect("path has points");
    let lat = start[0].as_f64().expect("latitude");
    let lng = start[1].as_f64().expect("longitude");
    assert!((lat - 51.5).abs() < 1e-7 && (lng + 0.1).abs() < 1e-7);
}

#[then("the command fails because the request JSON is invalid")]
fn fails_invalid_json(#[from(world)] world: &PlanWorld) {
    match world.error() {
        CliError::ParseRequest { .. } => {}
        other => panic!("expected ParseRequest, found {other:?}"),
    }
}

#[then("the command fails because the request is invalid")]
fn fails_invalid_request(#[from(world)] world: &PlanWorld) {
    match world.error() {
        CliError::InvalidRequest { source, .. } => {
            assert_eq!(source, RequestValidationError::TooFewWaypoints { count: 1 });
        }
        other => panic!("expected InvalidRequest, found {other:?}"),
    }
    assert!(world.stdout.borrow().is_empty());
}

#[then("the command fails because the network path is missing")]
fn fails_missing_network(#[from(world)] world: &PlanWorld) {
    match world.error() {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_NETWORK);
            assert_eq!(env, ENV_PLAN_NETWORK);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_plan_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/plan_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: PlanWorld) {
            let _ = world;
        }
    };
}

register_plan_scenario!(plan_over_snapshot, "planning a route over a network snapshot");
register_plan_scenario!(plan_over_extract, "planning a route over an OSM extract");
register_plan_scenario!(plan_invalid_json, "rejecting invalid JSON input");
register_plan_scenario!(plan_too_few_waypoints, "rejecting requests with too few waypoints");
register_plan_scenario!(plan_missing_network, "rejecting missing network paths");
