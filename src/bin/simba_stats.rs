use simba_plot::statistics::{parse_cli, plot_statistics};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let result = parse_cli().and_then(|args| {
        log::info!(
            "read statistics from {} and plot to {}",
            args.csvin.display(),
            args.outfile.display()
        );
        plot_statistics(&args)
    });
    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
