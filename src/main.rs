use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use xpboard::client::http::HttpClient;
use xpboard::config::Config;
use xpboard::dashboard::{Dashboard, LoadOutcome};
use xpboard::error::DashboardError;
use xpboard::logging::{log, obj, v_num, v_str, Domain, Level};
use xpboard::render::svg::SvgSurface;
use xpboard::session::{FileCredentialStore, SessionContext};
use xpboard::summary::FieldMap;

const USAGE: &str = "usage: xpboard [show | login <username> | logout]";

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    cfg.validate()?;

    let client = HttpClient::new(&cfg)?;
    let session = SessionContext::new(Box::new(FileCredentialStore::new(cfg.credential_path.clone())));
    let dashboard = Dashboard::new(client, session, cfg);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str).unwrap_or("show") {
        "login" => {
            let username = args.get(1).ok_or_else(|| anyhow!(USAGE))?;
            let password = read_password()?;
            dashboard.sign_in(dashboard.source(), username, &password).await?;
            println!("signed in as {}", username);
            show(&dashboard).await
        }
        "logout" => {
            dashboard.logout()?;
            println!("signed out");
            Ok(())
        }
        "show" => {
            if !dashboard.session().restore()? {
                println!("not signed in; run `xpboard login <username>`");
                return Ok(());
            }
            show(&dashboard).await
        }
        other => Err(anyhow!("unknown command {:?}\n{}", other, USAGE)),
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var("DASHBOARD_PASSWORD") {
        return Ok(password);
    }
    eprint!("password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn show(dashboard: &Dashboard<HttpClient>) -> Result<()> {
    let mut fields = FieldMap::new();
    let mut experience = SvgSurface::new();
    let mut skills = SvgSurface::new();

    let report = match dashboard.load_and_render(&mut fields, &mut experience, &mut skills).await {
        Ok(LoadOutcome::Completed(report)) => report,
        Ok(LoadOutcome::Skipped | LoadOutcome::Stale) => return Ok(()),
        Err(DashboardError::SessionInvalid(reason)) => {
            println!("session expired ({}); run `xpboard login <username>`", reason);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for (field, text) in fields.iter() {
        println!("{:>14}: {}", field.caption(), text);
    }
    for (kind, err) in &report.failures {
        println!("{:>14}: unavailable ({})", kind.as_str(), err);
    }

    let cfg = dashboard.config();
    for (surface, path) in [(&experience, cfg.experience_chart_path()), (&skills, cfg.skills_chart_path())] {
        let written = surface.save(&path).with_context(|| format!("writing {}", path.display()))?;
        match surface.placeholder_text() {
            Some(message) if !written => println!("{:>14}: {}", "chart", message),
            _ => println!("{:>14}: {}", "chart", path.display()),
        }
    }

    log(
        Level::Info,
        Domain::System,
        "dashboard_written",
        obj(&[
            ("output_dir", v_str(&cfg.output_dir.display().to_string())),
            ("failed_queries", v_num(report.failures.len() as f64)),
        ]),
    );
    Ok(())
}
