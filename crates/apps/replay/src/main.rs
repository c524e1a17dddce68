mod script;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use scene::{PostalDirectory, RegionHierarchy};
use session::{Collaborators, MapSession, SessionConfig, StaticSurface};
use streaming::{BoundaryCache, HttpBoundarySource, HttpLeadSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::script::{Script, Step};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a scripted map session against live sources")]
struct Args {
    /// Top-level region topology (GeoJSON FeatureCollection)
    #[arg(long)]
    topology: PathBuf,

    /// Postal code directory (JSON list)
    #[arg(long)]
    postal: PathBuf,

    /// Interaction script (JSON)
    #[arg(long)]
    script: PathBuf,

    /// Session tunables (JSON); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lead metrics API base URL (default: $LEADMAP_LEAD_API)
    #[arg(long)]
    lead_api: Option<String>,

    /// Geocoder base URL (default: $LEADMAP_GEOCODER or public Nominatim)
    #[arg(long)]
    geocoder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let lead_api = args
        .lead_api
        .or_else(|| env::var("LEADMAP_LEAD_API").ok())
        .ok_or("no lead API given (--lead-api or LEADMAP_LEAD_API)")?;
    let geocoder = args.geocoder.unwrap_or_else(|| {
        env::var("LEADMAP_GEOCODER")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string())
    });

    let config: SessionConfig = match &args.config {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => SessionConfig::default(),
    };
    let topology = tokio::fs::read_to_string(&args.topology).await?;
    let hierarchy = RegionHierarchy::from_geojson(&topology)?;
    let directory = PostalDirectory::from_json(&tokio::fs::read_to_string(&args.postal).await?)?;
    let script: Script = serde_json::from_str(&tokio::fs::read_to_string(&args.script).await?)?;
    info!(
        "{} regions, {} postal codes, {} steps",
        hierarchy.len(),
        directory.len(),
        script.steps.len()
    );

    let client = reqwest::Client::builder()
        .user_agent(concat!("leadmap-replay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let collaborators = Collaborators {
        boundaries: Arc::new(HttpBoundarySource::new(geocoder, client.clone())),
        leads: Arc::new(HttpLeadSource::new(lead_api, client)),
        surface: Arc::new(StaticSurface),
        cache: Arc::new(BoundaryCache::new()),
    };
    let mut session = MapSession::new(config, Arc::new(hierarchy), directory, collaborators);

    let mut progress = session.subscribe_progress();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = *progress.borrow_and_update();
            info!(
                "boundaries {}/{} loading={} class={:?}",
                p.loaded_count, p.total_count, p.is_loading, p.current_class
            );
        }
    });

    if let Err(err) = session.load_leads(script.query()).await {
        warn!("initial load failed: {err}");
    }
    log_events(&mut session);

    for (idx, step) in script.steps.iter().enumerate() {
        info!("step {idx}: {step:?}");
        match step {
            Step::Viewport { .. } => {
                if let Some(viewport) = step.viewport() {
                    session.handle_viewport_change(&viewport);
                }
            }
            Step::Select { region } => {
                if let Err(err) = session.select_region(region).await {
                    warn!("{err}");
                }
            }
            Step::Reset => session.reset().await,
            Step::Toggle { name } => {
                session.toggle_selection(name);
            }
            Step::Hover { name } => session.set_hovered(name.as_deref()),
            Step::Marker { postal_code } => {
                session.activate_marker(postal_code);
            }
            Step::Reload => {
                if let Err(err) = session.reload().await {
                    warn!("reload failed: {err}");
                }
            }
            Step::WaitIdle => session.wait_idle().await,
            Step::Sleep { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        }
        log_events(&mut session);
    }

    session.wait_idle().await;
    let render = session.render_state();
    info!(
        "final: {:?}, {} visible sub-regions, {} boundaries",
        render.navigation,
        render.sub_regions.len(),
        render.boundaries.len()
    );
    if let Some(stats) = session.aggregate_stats() {
        info!("selection: {}", serde_json::to_string(&stats)?);
    }
    Ok(())
}

fn log_events(session: &mut MapSession) {
    for event in session.drain_events() {
        match serde_json::to_string(&event) {
            Ok(line) => info!("event {line}"),
            Err(err) => warn!("unserializable event: {err}"),
        }
    }
}
