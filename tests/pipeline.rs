use simba_plot::chart::Style;
use simba_plot::plot::{default_outfile, plot_columns};
use simba_plot::statistics::{plot_statistics, StatsArgs};
use simba_plot::Error;
use std::fs;
use std::path::PathBuf;

fn stats_args(csvin: PathBuf, outfile: PathBuf) -> StatsArgs {
    StatsArgs {
        csvin,
        prefix: None,
        filter: None,
        style: Style {
            font_size: 4.0,
            linewidth: 0.5,
        },
        outfile,
    }
}

#[test]
fn two_point_chart_with_default_name() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("two.csv");
    fs::write(&csvin, "time,x,y\n0,1,2\n1000,3,4\n").unwrap();
    let fout = default_outfile(&csvin);
    assert_eq!(fout, dir.path().join("two.pdf"));
    plot_columns(&csvin, "x", "y", &fout).unwrap();
    let bytes = fs::read(&fout).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn png_output() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("two.csv");
    fs::write(&csvin, "time,x,y\n0,1,2\n1000,3,4\n2000,,5\n").unwrap();
    let fout = dir.path().join("two.png");
    plot_columns(&csvin, "time", "y", &fout).unwrap();
    let bytes = fs::read(&fout).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("absent.csv");
    let err = plot_columns(&csvin, "x", "y", &dir.path().join("absent.svg")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn dashboard_with_unlabelled_and_log_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("stats.csv");
    fs::write(
        &csvin,
        "time,nodes.1.latency,nodes.2.latency,nodes.1.job-runtime,nodes.2.job-runtime\n\
         0,1,2,0,1\n\
         1000,3,4,10,100\n\
         2000,2,2,1000,10000\n",
    )
    .unwrap();
    let fout = dir.path().join("statistics.svg");
    plot_statistics(&stats_args(csvin, fout.clone())).unwrap();
    let svg = fs::read_to_string(&fout).unwrap();
    assert!(svg.contains("latency"));
    assert!(svg.contains("#1") && svg.contains("#2"));
}

#[test]
fn dashboard_needs_the_time_column() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("stats.csv");
    fs::write(&csvin, "t,network.x\n0,1\n").unwrap();
    let fout = dir.path().join("statistics.svg");
    match plot_statistics(&stats_args(csvin, fout.clone())) {
        Err(Error::MissingColumn { column, .. }) => assert_eq!(column, "time"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!fout.exists());
}

#[test]
fn dashboard_rejects_metrics_of_no_kind() {
    let dir = tempfile::tempdir().unwrap();
    let csvin = dir.path().join("stats.csv");
    fs::write(&csvin, "time,cpu\n0,1\n").unwrap();
    let err = plot_statistics(&stats_args(csvin, dir.path().join("s.svg"))).unwrap_err();
    assert!(matches!(err, Error::UnknownMetric(ref m) if m == "cpu"));
}
