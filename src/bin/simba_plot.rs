use simba_plot::plot::{parse_cli, plot_columns};
use simba_plot::Error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let (csvin, x_axis, y_axis, outfile) = parse_cli();
    log::info!(
        "read data from {} and plot to {}",
        csvin.display(),
        outfile.display()
    );
    match plot_columns(&csvin, &x_axis, &y_axis, &outfile) {
        Ok(()) => {}
        Err(e @ Error::MissingColumn { .. }) => {
            println!("{}", e);
            std::process::exit(-1);
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}
