use std::fs;
use std::path::{Path, PathBuf};

use catalog::{JsonFilePropertyStore, PropertyBag, PropertyStore};
use clap::{Parser, Subcommand};
use tools::{RenderOptions, field_rows, parse_cube, render};
use tracing::info;
use tracing_subscriber::EnvFilter;
use widget::WidgetConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lay out globe info cards for a JSON cube")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, normalize and place cards, printing the result as JSON
    Render {
        /// Cube document (dimensions, measures, rows)
        cube: PathBuf,

        /// Widget configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Property bag JSON; updated in place when positions change
        #[arg(long)]
        props: Option<PathBuf>,

        /// Simulate a host that serves at most N columns per request
        #[arg(long)]
        column_limit: Option<usize>,

        #[arg(long, default_value_t = 800.0)]
        width: f64,

        #[arg(long, default_value_t = 600.0)]
        height: f64,

        /// Extra frames to simulate before reporting
        #[arg(long, default_value_t = 0)]
        frames: u64,

        /// Zero-based page to fetch
        #[arg(long)]
        page: Option<usize>,
    },

    /// List fields and the template paths that reach them
    Fields {
        /// Cube document (dimensions, measures, rows)
        cube: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Args::parse().command {
        Command::Render {
            cube,
            config,
            props,
            column_limit,
            width,
            height,
            frames,
            page,
        } => {
            let document = parse_cube(&read(&cube)?)?;
            let config = match config {
                Some(path) => WidgetConfig::from_json(&read(&path)?)?,
                None => WidgetConfig::default(),
            };
            let mut store = props.map(JsonFilePropertyStore::new);
            let bag = match &store {
                Some(store) => store.load()?,
                None => PropertyBag::default(),
            };

            let options = RenderOptions {
                width,
                height,
                frames,
                page,
                column_limit,
                ..RenderOptions::default()
            };
            let report = render(document, config, bag.clone(), &options)?;

            if let Some(store) = store.as_mut()
                && report.properties != bag
            {
                store.save(&report.properties)?;
                info!(path = %store.path().display(), "properties updated");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Fields { cube } => {
            let document = parse_cube(&read(&cube)?)?;
            println!("{}", serde_json::to_string_pretty(&field_rows(&document))?);
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()).into())
}
