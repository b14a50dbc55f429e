use super::chart::{self, line_points, Panel, PanelStack, Series, Style, YScale};
use super::{Error, Result, Table, TIME_COLUMN, VERSION};
use clap::{App, Arg};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::ops::Range;
use std::path::PathBuf;

/// Columns holding metrics of the whole network contain this marker, e.g. `network.network_traffic`.
pub const NETWORK_MARKER: &str = "network.";

/// Columns holding per-node metrics contain this marker, e.g. `nodes.3.incoming_data`.
pub const NODES_MARKER: &str = "nodes.";

/// Metrics spanning several orders of magnitude, drawn on a log scale.
pub const LOG_SCALE_METRICS: [&str; 3] = ["job-runtime", "total-job-runtime", "num-objects"];

pub const DEFAULT_OUTFILE: &str = "statistics.pdf";

/// CLI arguments of the statistics dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsArgs {
    pub csvin: PathBuf,
    /// accepted for compatibility, not used to select metrics
    pub prefix: Option<String>,
    /// accepted for compatibility, not used to select metrics
    pub filter: Option<String>,
    pub style: Style,
    pub outfile: PathBuf,
}

/// Takes the CLI arguments that control the statistics dashboard.
pub fn parse_cli() -> Result<StatsArgs> {
    parse_cli_from(std::env::args_os())
}

pub fn parse_cli_from<I, T>(args: I) -> Result<StatsArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arg_csvin = Arg::with_name("path")
        .help("statistics csv file of a run")
        .takes_value(true)
        .required(true)
        .index(1);
    let arg_prefix = Arg::with_name("prefix")
        .help("only consider metrics with specific prefixes, e.g. \"nodes\" (accepted, currently ignored)")
        .long("prefix")
        .takes_value(true);
    let arg_filter = Arg::with_name("filter")
        .help("select which metrics to use (accepted, currently ignored)")
        .long("filter")
        .takes_value(true);
    let arg_font_size = Arg::with_name("font_size")
        .help("font size in points")
        .long("font-size")
        .takes_value(true)
        .default_value("4");
    let arg_linewidth = Arg::with_name("linewidth")
        .help("line width in points")
        .long("linewidth")
        .takes_value(true)
        .default_value("0.5");
    let arg_out = Arg::with_name("outfile")
        .help("name of the output chart, the format follows the extension (pdf, svg, png, ...)")
        .short("o")
        .long("outfile")
        .takes_value(true)
        .default_value(DEFAULT_OUTFILE);
    let cli_args = App::new("simba_stats")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to plot the statistics of a run, one chart per metric")
        .arg(arg_csvin)
        .arg(arg_prefix)
        .arg(arg_filter)
        .arg(arg_font_size)
        .arg(arg_linewidth)
        .arg(arg_out)
        .get_matches_from(args);

    let font_size_str = cli_args.value_of("font_size").unwrap_or_default();
    let font_size = font_size_str
        .parse::<u32>()
        .map_err(|_| Error::InvalidArgument {
            name: "font-size",
            value: font_size_str.to_string(),
        })?;
    let linewidth_str = cli_args.value_of("linewidth").unwrap_or_default();
    let linewidth = match linewidth_str.parse::<f64>() {
        Ok(w) if w.is_finite() && w >= 0.0 => w,
        _ => {
            return Err(Error::InvalidArgument {
                name: "linewidth",
                value: linewidth_str.to_string(),
            })
        }
    };
    Ok(StatsArgs {
        csvin: PathBuf::from(cli_args.value_of("path").unwrap_or_default()),
        prefix: cli_args.value_of("prefix").map(String::from),
        filter: cli_args.value_of("filter").map(String::from),
        style: Style {
            font_size: f64::from(font_size),
            linewidth,
        },
        outfile: PathBuf::from(cli_args.value_of("outfile").unwrap_or(DEFAULT_OUTFILE)),
    })
}

/// the part after the last dot, `nodes.3.job-runtime` -> `job-runtime`
pub fn metric_name(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

/// the second dot-separated segment, `nodes.3.job-runtime` -> `3`
pub fn node_id(column: &str) -> Option<&str> {
    column.split('.').nth(1)
}

/// Label of the y axis for a metric; metrics without a nicer name keep their own.
pub fn display_name(metric: &str) -> &str {
    match metric {
        "incoming_data" => "Incoming Data",
        "network_traffic" => "Network Traffic",
        other => other,
    }
}

pub fn y_scale(metric: &str) -> YScale {
    if LOG_SCALE_METRICS.contains(&metric) {
        YScale::Log
    } else {
        YScale::Linear
    }
}

fn push_unique(v: &mut Vec<String>, s: &str) {
    if !v.iter().any(|e| e == s) {
        v.push(s.to_string());
    }
}

/// Where each metric of a statistics csv comes from.
/// All lists keep the order of first appearance in the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricLayout {
    pub metrics: Vec<String>,
    pub network_metrics: Vec<String>,
    pub node_metrics: Vec<String>,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricKind {
    Network,
    Node,
}

impl MetricLayout {
    pub fn from_columns(columns: &[String]) -> MetricLayout {
        let mut layout = MetricLayout::default();
        for column in columns {
            let metric = metric_name(column);
            if metric != TIME_COLUMN {
                push_unique(&mut layout.metrics, metric);
            }
            if column.contains(NETWORK_MARKER) {
                push_unique(&mut layout.network_metrics, metric);
            }
            if column.contains(NODES_MARKER) {
                push_unique(&mut layout.node_metrics, metric);
                if let Some(id) = node_id(column) {
                    push_unique(&mut layout.nodes, id);
                }
            }
        }
        layout
    }

    /// Network metrics take precedence over node metrics with the same name.
    pub fn kind(&self, metric: &str) -> Result<MetricKind> {
        if self.network_metrics.iter().any(|m| m == metric) {
            Ok(MetricKind::Network)
        } else if self.node_metrics.iter().any(|m| m == metric) {
            Ok(MetricKind::Node)
        } else {
            Err(Error::UnknownMetric(metric.to_string()))
        }
    }
}

/// Long-format view of the per-node columns: the slices of all nodes stacked,
/// with the `nodes.<id>.` prefix stripped and the node label of every row.
#[derive(Debug, Clone)]
pub struct NodeTable {
    pub rows: Table,
    pub node: Vec<String>,
    /// label and row range of each node slice, in stacking order
    spans: Vec<(String, Range<usize>)>,
}

impl NodeTable {
    /// None when there are no nodes.
    pub fn from_table(data: &Table, nodes: &[String]) -> Option<NodeTable> {
        if nodes.is_empty() {
            return None;
        }
        let mut slices = Vec::with_capacity(nodes.len());
        let mut spans = Vec::with_capacity(nodes.len());
        let mut start = 0;
        for id in nodes {
            let prefix = format!("{}{}.", NODES_MARKER, id);
            let mut this_node = data.select(|c| c.starts_with(&prefix) || c == TIME_COLUMN);
            this_node.rename_columns(|c| c.replace(&prefix, ""));
            let label = format!("#{}", id);
            debug!("node {}: {} rows, columns {:?}", label, this_node.len(), this_node.columns());
            let end = start + this_node.len();
            spans.push((label, start..end));
            slices.push(this_node);
            start = end;
        }
        let mut node = Vec::with_capacity(start);
        for (label, rows) in spans.iter() {
            node.extend(std::iter::repeat(label.clone()).take(rows.len()));
        }
        Some(NodeTable {
            rows: Table::concat(&slices),
            node,
            spans,
        })
    }

    /// node labels, in stacking order
    pub fn labels(&self) -> Vec<String> {
        self.spans.iter().map(|(label, _)| label.clone()).collect()
    }

    /// One line per node of `metric` against time.
    pub fn lines(&self, metric: &str) -> Result<Vec<(String, Vec<(f64, f64)>)>> {
        let time = self.rows.require(TIME_COLUMN)?;
        let values = self.rows.require(metric)?;
        let lines = self
            .spans
            .iter()
            .map(|(label, rows)| {
                let points = line_points(&time[rows.clone()], &values[rows.clone()]);
                (label.clone(), points)
            })
            .collect();
        Ok(lines)
    }
}

/// One panel per metric, stacked in the order of `layout.metrics`;
/// only the last panel shows the time axis.
pub fn dashboard_panels(data: &Table, layout: &MetricLayout) -> Result<Vec<Panel>> {
    let time = data.require(TIME_COLUMN)?;
    let node_table = NodeTable::from_table(data, &layout.nodes);
    let last = layout.metrics.len().saturating_sub(1);
    let mut panels = Vec::with_capacity(layout.metrics.len());
    for (metric_idx, metric) in layout.metrics.iter().enumerate() {
        let (series, legend_title) = match layout.kind(metric)? {
            MetricKind::Network => {
                let key = format!("{}{}", NETWORK_MARKER, metric);
                let values = data.require(&key)?;
                let series = Series {
                    label: None,
                    color: chart::series_color(0),
                    points: line_points(time, values),
                };
                (vec![series], None)
            }
            MetricKind::Node => {
                let node_table = match &node_table {
                    Some(t) => t,
                    None => return Err(Error::UnknownMetric(metric.clone())),
                };
                let series = node_table
                    .lines(metric)?
                    .into_iter()
                    .enumerate()
                    .map(|(i, (label, points))| Series {
                        label: Some(label),
                        color: chart::series_color(i),
                        points,
                    })
                    .collect();
                (series, Some(String::from("Node")))
            }
        };
        let x_desc = if metric_idx == last {
            Some(String::from("Time (s)"))
        } else {
            None
        };
        panels.push(Panel {
            y_desc: display_name(metric).to_string(),
            x_desc,
            scale: y_scale(metric),
            y_from_zero: true,
            legend_title,
            series,
        });
    }
    Ok(panels)
}

/// Loads the statistics csv of a run and saves one chart per metric to `args.outfile`.
pub fn plot_statistics(args: &StatsArgs) -> Result<()> {
    if args.prefix.is_some() || args.filter.is_some() {
        warn!("--prefix and --filter are accepted but do not change the selected metrics");
    }
    let mut data = Table::from_csv(&args.csvin)?;
    if data.is_empty() {
        warn!("{} has no rows, the charts will be empty", args.csvin.display());
    }
    // milliseconds to seconds
    data.divide_column(TIME_COLUMN, 1000.0)?;

    let layout = MetricLayout::from_columns(data.columns());
    info!("Found network metrics: {:?}", layout.network_metrics);
    info!("Found node metrics: {:?}", layout.node_metrics);
    if layout.metrics.is_empty() {
        return Err(Error::NoMetrics);
    }

    let panels = dashboard_panels(&data, &layout)?;
    println!("Writing output to {}", args.outfile.display());
    let figure = PanelStack {
        panels,
        style: args.style,
    };
    chart::save(&figure, &args.outfile)
}
