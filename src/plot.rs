use super::chart::{self, line_points, Panel, PanelStack, Series, Style, YScale};
use super::{Result, Table, VERSION};
use clap::{App, Arg};
use log::{info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Takes the CLI arguments that control the plotting of one column against another.
/// Returns the csv path, the x and y column names and the output path.
pub fn parse_cli() -> (PathBuf, String, String, PathBuf) {
    parse_cli_from(std::env::args_os())
}

pub fn parse_cli_from<I, T>(args: I) -> (PathBuf, String, String, PathBuf)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_csvin = Arg::with_name("filename")
        .help("name of the csv file")
        .takes_value(true)
        .required(true)
        .index(1);
    let arg_x = Arg::with_name("x_axis")
        .help("column to use for the x axis")
        .long("x-axis")
        .takes_value(true)
        .required(true);
    let arg_y = Arg::with_name("y_axis")
        .help("column to use for the y axis")
        .long("y-axis")
        .takes_value(true)
        .required(true);
    let arg_out = Arg::with_name("outfile")
        .help("name of the output chart, the format follows the extension (pdf, svg, png, ...)")
        .short("o")
        .long("outfile")
        .takes_value(true);
    let cli_args = App::new("simba_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot one csv column against another")
        .arg(arg_csvin)
        .arg(arg_x)
        .arg(arg_y)
        .arg(arg_out)
        .get_matches_from(args);
    let csvin = PathBuf::from(cli_args.value_of("filename").unwrap_or_default());
    let x_axis = String::from(cli_args.value_of("x_axis").unwrap_or_default());
    let y_axis = String::from(cli_args.value_of("y_axis").unwrap_or_default());
    let outfile = match cli_args.value_of("outfile") {
        Some(p) => PathBuf::from(p),
        None => default_outfile(&csvin),
    };
    (csvin, x_axis, y_axis, outfile)
}

/// the input path with the extension of the default chart format
pub fn default_outfile(csvin: &Path) -> PathBuf {
    let mut fout = csvin.to_path_buf();
    fout.set_extension(chart::DEFAULT_EXTENSION);
    fout
}

/// Builds the panel for `y_axis` against `x_axis`, checking that both columns exist.
pub fn column_panel(table: &Table, x_axis: &str, y_axis: &str) -> Result<Panel> {
    let xs = table.require(x_axis)?;
    let ys = table.require(y_axis)?;
    let points = line_points(xs, ys);
    info!("{} points for {} against {}", points.len(), y_axis, x_axis);
    Ok(Panel {
        y_desc: y_axis.to_string(),
        x_desc: Some(x_axis.to_string()),
        scale: YScale::Linear,
        y_from_zero: false,
        legend_title: None,
        series: vec![Series {
            label: None,
            color: chart::series_color(0),
            points,
        }],
    })
}

/// Loads the csv, plots `y_axis` against `x_axis` and saves the chart to `fout`.
pub fn plot_columns(csvin: &Path, x_axis: &str, y_axis: &str, fout: &Path) -> Result<()> {
    let table = Table::from_csv(csvin)?;
    if table.is_empty() {
        warn!("{} has no rows, the chart will be empty", csvin.display());
    }
    let panel = column_panel(&table, x_axis, y_axis)?;
    println!("Storing plot as '{}'", fout.display());
    let figure = PanelStack {
        panels: vec![panel],
        style: Style::default(),
    };
    chart::save(&figure, fout)
}
