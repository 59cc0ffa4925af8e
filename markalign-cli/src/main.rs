use clap::{Args, Parser, Subcommand};
use markalign::camera::ImageFolderCamera;
use markalign::image::io::{load_frame, save_frame, save_plane};
use markalign::inspect::InspectionReport;
use markalign::runtime::ServerConfig;
use markalign::{
    teach_origins, CameraHandle, InspectOptions, InspectionConfig, InspectionResult, Inspector,
    MarkerPose, ModelStore, Session, SharedState,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/model.example.json"));

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "MarkAlign fiducial inspection CLI")]
struct Cli {
    /// Directory holding named models.
    #[arg(long, value_name = "DIR", default_value = "models", global = true)]
    models_root: PathBuf,
    /// Print an example model configuration and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long, global = true)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct Source {
    /// Named model under the models root.
    #[arg(long, conflicts_with = "config")]
    model: Option<String>,
    /// Path to a configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline on one image and print the JSON report.
    Inspect {
        #[command(flatten)]
        source: Source,
        #[arg(long, value_name = "FILE")]
        image: PathBuf,
        /// Write the annotated frame here.
        #[arg(long, value_name = "FILE")]
        annotated: Option<PathBuf>,
        /// Write the binary mask here.
        #[arg(long, value_name = "FILE")]
        mask: Option<PathBuf>,
        /// Write the report here instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(long)]
        parallel: bool,
    },
    /// Capture origin poses from a reference image and store them.
    Teach {
        #[command(flatten)]
        source: Source,
        #[arg(long, value_name = "FILE")]
        image: PathBuf,
        /// Print the poses without storing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Answer trigger requests with images replayed from a directory.
    Serve {
        #[command(flatten)]
        source: Source,
        #[arg(long, value_name = "DIR")]
        images: PathBuf,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long)]
        parallel: bool,
    },
    /// Manage stored models.
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
}

#[derive(Subcommand, Debug)]
enum ModelsAction {
    List,
    Delete {
        name: String,
    },
    /// Create a model from the example configuration.
    Init {
        name: String,
        #[arg(long)]
        force: bool,
    },
}

enum Target {
    Model(String),
    File(PathBuf),
}

impl Source {
    fn target(&self) -> CliResult<Target> {
        match (&self.model, &self.config) {
            (Some(name), _) => Ok(Target::Model(name.clone())),
            (None, Some(path)) => Ok(Target::File(path.clone())),
            (None, None) => Err("either --model or --config is required".into()),
        }
    }
}

fn load_config(store: &ModelStore, target: &Target) -> CliResult<InspectionConfig> {
    match target {
        Target::Model(name) => Ok(store.load(name)?),
        Target::File(path) => Ok(InspectionConfig::from_json_str(&fs::read_to_string(path)?)?),
    }
}

fn store_config(store: &ModelStore, target: &Target, config: &InspectionConfig) -> CliResult<PathBuf> {
    match target {
        Target::Model(name) => Ok(store.save(name, config)?),
        Target::File(path) => {
            fs::write(path, config.to_json_pretty()?)?;
            Ok(path.clone())
        }
    }
}

#[derive(Debug, Serialize)]
struct TeachOutput {
    stored: Option<PathBuf>,
    origins: BTreeMap<usize, MarkerPose>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("markalign=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let store = ModelStore::new(&cli.models_root);
    match cli.command {
        Some(Command::Inspect {
            source,
            image,
            annotated,
            mask,
            output,
            parallel,
        }) => {
            let config = Arc::new(load_config(&store, &source.target()?)?);
            let frame = Arc::new(load_frame(&image)?);
            let inspector = Inspector::new(Arc::clone(&config)).with_options(InspectOptions {
                parallel,
                render: annotated.is_some(),
            });
            let result = inspector.inspect(frame)?;
            if let (Some(path), Some(frame)) = (&annotated, &result.annotated) {
                save_frame(frame, path)?;
            }
            if let (Some(path), Some(plane)) = (&mask, &result.mask) {
                save_plane(plane, path)?;
            }
            let json = InspectionReport::new(&config, &result).to_json_pretty()?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        Some(Command::Teach {
            source,
            image,
            dry_run,
        }) => {
            let target = source.target()?;
            let mut config = load_config(&store, &target)?;
            let frame = Arc::new(load_frame(&image)?);
            let origins = teach_origins(frame, Arc::new(config.clone()))?;
            if origins.is_empty() {
                return Err("no circle pair found; origins left unchanged".into());
            }
            info!(regions = origins.len(), "origins captured");
            let stored = if dry_run {
                None
            } else {
                config.origins = origins.clone();
                Some(store_config(&store, &target, &config)?)
            };
            let output = TeachOutput { stored, origins };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Command::Serve {
            source,
            images,
            host,
            port,
            parallel,
        }) => {
            let config = load_config(&store, &source.target()?)?;
            let shared = Arc::new(SharedState::new(config));
            let sink = Arc::new(|result: Arc<InspectionResult>| println!("{}", result.message));
            let mut session = Session::new(shared, sink)
                .with_server_config(ServerConfig {
                    host,
                    port,
                    ..ServerConfig::default()
                })
                .with_options(InspectOptions {
                    parallel,
                    render: false,
                });
            let camera = CameraHandle::new(Box::new(ImageFolderCamera::new(&images)));
            let addr = session.start_auto(camera)?;
            eprintln!("listening on {addr}; press Enter to stop");
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            session.stop();
        }
        Some(Command::Models { action }) => match action {
            ModelsAction::List => {
                for name in store.list_models()? {
                    println!("{name}");
                }
            }
            ModelsAction::Delete { name } => {
                if !store.delete(&name)? {
                    return Err(format!("model `{name}` not found").into());
                }
                println!("deleted {name}");
            }
            ModelsAction::Init { name, force } => {
                if store.exists(&name) && !force {
                    return Err(format!("model `{name}` already exists; pass --force").into());
                }
                let config = InspectionConfig::from_json_str(EXAMPLE_JSON)?;
                let path = store.save(&name, &config)?;
                println!("{}", path.display());
            }
        },
        None => {
            return Err("no command given; see --help".into());
        }
    }

    Ok(())
}
