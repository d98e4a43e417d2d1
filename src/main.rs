use fra_atlas_geo::output::Output;
use fra_atlas_geo::{
    features_bounds, load_features, Bounds, Config, Error as GeoError, LayerOrchestrator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs::File;
use std::io::{stdout, BufReader, BufWriter, Write};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "fra_atlas_geo")]
struct Opt {
    /// GeoJSON file with the layer's source features
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    #[structopt(short, long)]
    layer: String,

    #[structopt(short, long)]
    zoom: f64,

    /// Viewport as south,west,north,east
    #[structopt(short, long)]
    bounds: Option<Bounds>,

    /// Thin out dense viewports (the viewport defaults to the data extent)
    #[structopt(long)]
    adaptive: bool,

    #[structopt(long)]
    max_density: Option<f64>,

    /// Seed for the adaptive sampler
    #[structopt(long)]
    seed: Option<u64>,

    /// Zoom levels to process ahead of the request
    #[structopt(long, use_delimiter = true)]
    preload: Vec<f64>,

    /// Write a FeatureCollection instead of JSON lines
    #[structopt(long)]
    geojson: bool,

    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Print cache stats and metrics to stderr
    #[structopt(long)]
    stats: bool,

    #[structopt(short, long)]
    verbose: bool,
}

fn load_config(opt: &Opt) -> Result<Config, Box<dyn Error>> {
    let mut config = match &opt.config {
        Some(path) => Config::from_reader(BufReader::new(File::open(path)?))?,
        None => Config::default(),
    };
    if let Some(max_density) = opt.max_density {
        config.max_density = max_density;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::from_args();
    let level = if opt.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(&opt)?;
    let mut orchestrator = LayerOrchestrator::new(&config);
    if orchestrator.layers().get(&opt.layer).is_none() {
        return Err(GeoError::UnknownLayer(opt.layer).into());
    }

    let file = File::open(&opt.input)?;
    let source = load_features(BufReader::new(file))?;

    if !opt.preload.is_empty() {
        orchestrator.preload_layer_data(&opt.layer, &opt.preload, &source);
    }

    let features = if opt.adaptive {
        let extent = features_bounds(&source);
        match opt.bounds.as_ref().or_else(|| extent.as_ref()) {
            Some(bounds) => {
                let mut rng = match opt.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                orchestrator.get_adaptive_features(&opt.layer, opt.zoom, &source, bounds, &mut rng)
            }
            None => {
                log::warn!("no usable positions in {:?}, returning unsampled data", opt.input);
                orchestrator.get_optimized_layer_data(&opt.layer, opt.zoom, &source, None)
            }
        }
    } else {
        orchestrator.get_optimized_layer_data(&opt.layer, opt.zoom, &source, opt.bounds.as_ref())
    };

    let stdout = stdout();
    let mut writer = BufWriter::new(stdout.lock());
    if opt.geojson {
        features.write_geojson(&mut writer)?;
    } else {
        features.write_json_lines(&mut writer)?;
    }
    writer.flush()?;

    if opt.stats {
        eprintln!("{}", serde_json::to_string(&orchestrator.cache_stats())?);
        eprintln!("{}", serde_json::to_string(&orchestrator.metrics())?);
    }
    Ok(())
}
