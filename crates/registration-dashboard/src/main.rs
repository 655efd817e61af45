mod bootstrap;
mod report;

use anyhow::{Context, Result};
use dashboard_core::settings::{Settings, DEFAULT_SELECTED_MANUFACTURERS};
use dashboard_data::export::export_to_path;
use dashboard_runtime::data_manager::DataManager;
use dashboard_runtime::snapshot::DashboardQuery;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Registration dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let root = bootstrap::resolve_data_root(&settings.data_dir);
    let mut manager = DataManager::new(root);
    let load = manager.get_data(false).clone();

    if settings.show_files {
        print!("{}", report::render_file_log(&load.discovery));
    }

    if load.status.is_no_data() {
        let reason = manager.last_error().unwrap_or("no data");
        eprintln!(
            "No registration data available under {}: {}",
            manager.root().display(),
            reason
        );
        return Ok(());
    }
    eprintln!("{}", report::render_load_summary(&load));

    let dataset = &load.dataset;
    let spec = settings
        .to_filter_spec(
            &dataset.years(),
            &dataset.default_manufacturers(DEFAULT_SELECTED_MANUFACTURERS),
        )
        .context("invalid filter options")?;
    tracing::debug!(?spec, "resolved filter");

    let query = DashboardQuery {
        top_n: settings.top,
        leader_category: settings.leader_category(&spec),
        ranking_mode: settings.ranking_mode(&spec),
        spec,
    };
    let snapshot = manager.snapshot(&query)?;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", report::render_report(&snapshot));
    }

    if let Some(path) = &settings.export {
        let subset = dataset.filter(&query.spec);
        export_to_path(subset.records(), path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        eprintln!("Exported {} rows to {}", subset.len(), path.display());
    }

    Ok(())
}
