//! Renders the dashboard from a recorded JSON document instead of the live
//! endpoint. Usage: `render_fixture [fixture.json] [out_dir]`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use xpboard::client::fixture::FixtureSource;
use xpboard::config::Config;
use xpboard::dashboard::{Dashboard, LoadOutcome};
use xpboard::render::svg::SvgSurface;
use xpboard::session::{MemoryCredentialStore, SessionContext};
use xpboard::summary::FieldMap;

#[tokio::main]
async fn main() -> Result<()> {
    let fixture = std::env::args().nth(1).unwrap_or_else(|| "fixtures/sample.json".to_string());
    let mut cfg = Config::from_env();
    if let Some(out) = std::env::args().nth(2) {
        cfg.output_dir = PathBuf::from(out);
    }

    let source = FixtureSource::from_file(Path::new(&fixture)).with_context(|| format!("loading {}", fixture))?;
    let session = SessionContext::new(Box::new(MemoryCredentialStore::with_credential("fixture")));
    session.restore()?;
    let dashboard = Dashboard::new(source, session, cfg);

    let mut fields = FieldMap::new();
    let mut experience = SvgSurface::new();
    let mut skills = SvgSurface::new();
    let report = match dashboard.load_and_render(&mut fields, &mut experience, &mut skills).await? {
        LoadOutcome::Completed(report) => report,
        LoadOutcome::Skipped | LoadOutcome::Stale => return Ok(()),
    };

    for (field, text) in fields.iter() {
        println!("{:>14}: {}", field.caption(), text);
    }
    for (kind, err) in &report.failures {
        eprintln!("{} fell back to defaults: {}", kind.as_str(), err);
    }
    let cfg = dashboard.config();
    for (surface, path) in [(&experience, cfg.experience_chart_path()), (&skills, cfg.skills_chart_path())] {
        if surface.save(&path)? {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
