use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use wise_builder::{
    AttachmentContents, GlobalStatistic, Identified, Job, JobError, LatLon, ServerConfig,
    Session, SessionError, SessionState, Shape, Timezone, Validate, ValidationContext, config,
    leaf_errors,
};

const OUTPUT_KEYWORDS: &[&str] = &[
    "summaryfile",
    "vectorfile",
    "gridfile",
    "fuel_grid_export",
    "statsfile",
    "asset_stats_export",
    "mng_statistic",
    "output_stream",
    "export_units",
];

fn start() -> chrono::DateTime<FixedOffset> {
    FixedOffset::west_opt(6 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 7, 1, 13, 0, 0)
        .unwrap()
}

fn simple_job() -> Job {
    let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let mut job = Job::new();
    job.inputs.projection = job
        .add_attachment("fuel.prj", AttachmentContents::Text("PROJCS[\"NAD83\"]".to_string()))
        .unwrap();
    job.inputs.lut = "fuel.lut".to_string();
    job.inputs.fuelmap = "fuel.asc".to_string();
    let station = job.add_weather_station(LatLon::new(51.0, -115.0)).id().to_string();
    let stream = job
        .add_weather_stream(&station, "weather.txt", day, day)
        .unwrap()
        .id()
        .to_string();
    let ignition = job
        .add_ignition(start(), Shape::point(LatLon::new(51.25, -115.5)))
        .id()
        .to_string();
    let scenario = job.add_scenario();
    scenario.start_time = Some(start());
    scenario.end_time = Some(start() + chrono::Duration::hours(8));
    scenario.add_stream_ref(&station, &stream);
    scenario.add_ignition_ref(&ignition);
    job.timezone = Timezone::from_offset_hours(-6, true);
    job
}

fn dry() -> ValidationContext {
    ValidationContext::without_file_checks()
}

#[test]
fn simple_job_encodes_in_order() {
    let job = simple_job();
    assert!(job.check_valid(&dry()).is_empty());

    let message = job.begin_job(&dry()).unwrap();
    let keywords = message.keywords();
    let position = |k: &str| {
        keywords
            .iter()
            .position(|x| *x == k)
            .unwrap_or_else(|| panic!("missing {}", k))
    };

    let station = position("weatherstation");
    assert_eq!(keywords[station + 1], "weatherstream");
    assert_eq!(keywords[station + 2], "ignition");
    assert_eq!(keywords[station + 3], "scenariostart");
    assert_eq!(keywords[station + 4], "scenario");
    assert!(position("scenarioend") > station + 4);
    assert!(position("scenarioend") < position("timezone"));
    for keyword in OUTPUT_KEYWORDS {
        assert!(!message.contains_keyword(keyword), "unexpected {}", keyword);
    }

    assert_eq!(message.data_for("scenariostart"), vec!["scen0"]);
    assert_eq!(message.data_for("scenarioend"), vec!["scen0"]);
    assert_eq!(message.data_for("streamref"), vec!["wthrstn0|wthrstrm0|1"]);
    assert!(message.data_for("weatherstream")[0].starts_with("wthrstn0|wthrstrm0|weather.txt|"));
}

#[test]
fn outputs_follow_timezone() {
    let mut job = simple_job();
    job.add_vector_file("scen0", "perimeter.kml");
    job.add_grid_output("scen0", "intensity.tif", GlobalStatistic::MaxFi);
    let message = job.begin_job(&dry()).unwrap();
    let keywords = message.keywords();
    let timezone = keywords.iter().position(|k| *k == "timezone").unwrap();
    assert_eq!(keywords[timezone + 1], "vectorfile");
    assert_eq!(keywords[timezone + 2], "gridfile");
    assert_eq!(keywords.last(), Some(&"job_options"));
}

#[test]
fn renamed_references_are_checked() {
    let mut job = simple_job();
    job.ignitions[0].set_name("Main|Fire");
    let errors = job.check_valid(&dry());
    let paths: Vec<String> = leaf_errors(&errors).into_iter().map(|l| l.path).collect();
    assert_eq!(paths, vec!["scenarios[0].ignitionRefs[0].id"]);

    job.scenarios[0].ignition_refs[0].id = "MainFire".to_string();
    assert!(job.is_valid(&dry()));
    assert_eq!(job.ignitions[0].id(), "MainFire");
}

#[test]
fn job_description_survives_a_file() {
    let job = simple_job();
    let dir = tempfile::tempdir().unwrap();

    let json = dir.path().join("job.json");
    std::fs::write(&json, serde_json::to_string_pretty(&job).unwrap()).unwrap();
    let loaded: Job = config::load_file(&json).unwrap();
    assert_eq!(loaded.encode(), job.encode());

    let yaml = dir.path().join("job.yaml");
    std::fs::write(&yaml, serde_yml::to_string(&job).unwrap()).unwrap();
    let loaded: Job = config::load_file(&yaml).unwrap();
    assert_eq!(loaded.encode(), job.encode());
}

#[test]
fn file_references_checked_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let lut = dir.path().join("fuel.lut");
    std::fs::write(&lut, "fuel table").unwrap();

    let mut job = simple_job();
    job.inputs.lut = lut.to_string_lossy().into_owned();
    job.inputs.fuelmap = dir.path().join("missing.asc").to_string_lossy().into_owned();
    job.weather_stations[0].streams[0].filename = lut.to_string_lossy().into_owned();

    let errors = job.check_valid(&ValidationContext::default());
    let paths: Vec<String> = leaf_errors(&errors).into_iter().map(|l| l.path).collect();
    assert_eq!(paths, vec!["inputs.fuelmapFile"]);
    assert!(job.is_valid(&dry()));
}

/// A backend that records the job body and answers with `name` once released.
async fn backend(
    listener: TcpListener,
    name: &'static str,
    release: oneshot::Receiver<()>,
) -> Vec<u8> {
    let (socket, _) = listener.accept().await.unwrap();
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "STARTUP\n");
    line.clear();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "BEGINDATA\n");

    let mut body = Vec::new();
    loop {
        let mut raw = Vec::new();
        reader.read_until(b'\n', &mut raw).await.unwrap();
        if raw == b"ENDDATA\n" {
            break;
        }
        body.extend_from_slice(&raw);
    }
    line.clear();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "STARTJOB\n");

    release.await.unwrap();
    writer.write_all(format!("{}\n", name).as_bytes()).await.unwrap();

    let mut rest = String::new();
    reader.read_to_string(&mut rest).await.unwrap();
    assert_eq!(rest, "SHUTDOWN\n");
    body
}

async fn bind() -> (TcpListener, ServerConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, ServerConfig::new("127.0.0.1", port))
}

#[tokio::test]
async fn submit_streams_the_encoded_job() {
    let (listener, config) = bind().await;
    let (release, released) = oneshot::channel();
    let server = tokio::spawn(backend(listener, "job_20240701_0001", released));
    release.send(()).unwrap();

    let job = simple_job();
    let session = Session::new(config);
    let handle = session.submit_job(&job, &dry()).await.unwrap();
    assert_eq!(handle.as_str(), "job_20240701_0001");
    assert_eq!(session.state(), SessionState::Succeeded);

    let body = server.await.unwrap();
    assert_eq!(body, job.encode().to_bytes());
}

#[tokio::test]
async fn invalid_job_never_connects() {
    let (listener, config) = bind().await;
    let session = Session::new(config);

    let err = session.submit_job(&Job::new(), &dry()).await.unwrap_err();
    assert!(matches!(err, SessionError::Job(JobError::Invalid(_))));
    assert_eq!(session.state(), SessionState::Idle);

    let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err());
}

#[tokio::test]
async fn second_request_is_rejected_while_in_flight() {
    let (listener, config) = bind().await;
    let (release, released) = oneshot::channel();
    let server = tokio::spawn(backend(listener, "job_1", released));

    let session = Arc::new(Session::new(config));
    let message = simple_job().begin_job(&dry()).unwrap();
    let first = {
        let session = Arc::clone(&session);
        let message = message.clone();
        tokio::spawn(async move { session.submit(&message).await })
    };
    while session.state() != SessionState::InFlight {
        tokio::task::yield_now().await;
    }

    let err = session.submit(&message).await.unwrap_err();
    assert!(matches!(err, SessionError::InFlight));
    assert_eq!(session.state(), SessionState::InFlight);

    release.send(()).unwrap();
    let handle = first.await.unwrap().unwrap();
    assert_eq!(handle.as_str(), "job_1");
    assert_eq!(session.state(), SessionState::Succeeded);
    server.await.unwrap();
}
