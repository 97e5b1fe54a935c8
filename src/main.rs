use tour_engine::cli::CliOverrides;
use tour_engine::config::TourConfig;

fn main() {
    let overrides = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    let config = match overrides.manifest_path() {
        Some(path) => TourConfig::load_or_default(path),
        None => TourConfig::default(),
    };
    if let Err(err) = tour_engine::run(config, overrides.into_config_overrides()) {
        eprintln!("Tour error: {err:?}");
        std::process::exit(1);
    }
}
