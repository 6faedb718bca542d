use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use evscout::config::Config;
use evscout::extract::Extractor;
use evscout::fetcher;
use evscout::scoring::Weights;
use evscout::service::{Reply, Request, Service, SettingsPatch};
use evscout::store::{JsonStore, Mode, SavedCar, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let config = Config::from_env()?;
    let store: Arc<JsonStore> = Arc::new(JsonStore::open(config.data_file()).await?);
    let service = Service::from_config(store.clone(), &config);

    match command.as_str() {
        "grab" => grab(&service, &config, args.get(1)).await,
        "rank" => rank(&service).await,
        "star" => star(store.as_ref(), args.get(1)).await,
        "rm" => remove(&service, args.get(1)).await,
        "export" => export(&service, args.get(1)).await,
        "import" => import(&service, args.get(1)).await,
        "mode" => mode(&service, args.get(1)).await,
        "weights" => weights(&service, &args[1..]).await,
        "msg" => msg(&service, args.get(1)).await,
        other => {
            print_usage();
            bail!("unknown command: {other}");
        }
    }
}

async fn grab(service: &Service, config: &Config, url: Option<&String>) -> Result<()> {
    let url = url.context("usage: evscout grab <url>")?;

    if let Reply::UrlKnown { saved: true } =
        service.handle(Request::CheckUrl { url: url.clone() }).await
    {
        println!("Already saved: {url}");
        return Ok(());
    }

    let page = fetcher::fetch(url, config.http_timeout()).await?;
    let settings = match service.handle(Request::GetSettings).await {
        Reply::Settings { settings } => settings,
        _ => bail!("could not read settings"),
    };

    let extractor = Extractor::from_config(config, settings.mode);
    let Some(listing) = extractor.run(&page).await else {
        println!("Nothing to save: not a supported listing page, or skipped by EV-only mode.");
        return Ok(());
    };

    match service.handle(Request::SaveCar { car: listing }).await {
        Reply::Saved { car, .. } => {
            println!(
                "Saved {} {} {} (id {})",
                car.listing.year, car.listing.make, car.listing.model, car.id
            );
            let ranked = service.ranked_cars().await?;
            if let Some(position) = ranked.iter().position(|entry| entry.car.id == car.id) {
                println!(
                    "Score {} under current weights, rank {} of {}",
                    ranked[position].score,
                    position + 1,
                    ranked.len()
                );
            }
            Ok(())
        }
        Reply::Failed { error, .. } => bail!("save failed: {error}"),
        _ => bail!("unexpected reply"),
    }
}

async fn rank(service: &Service) -> Result<()> {
    let ranked = service.ranked_cars().await?;
    if ranked.is_empty() {
        println!("No saved cars yet. Try: evscout grab <listing url>");
        return Ok(());
    }

    for (index, entry) in ranked.iter().enumerate() {
        println!("{:>3}. {}", index + 1, describe(&entry.car, entry.score));
    }

    let stats = service.stats().await?;
    match stats.average_score {
        Some(average) => println!(
            "\n{} cars, {} starred, average score {}",
            stats.total, stats.starred, average
        ),
        None => println!("\n{} cars, {} starred", stats.total, stats.starred),
    }
    Ok(())
}

fn describe(car: &SavedCar, score: u8) -> String {
    let star = if car.starred { "*" } else { " " };
    let listing = &car.listing;
    format!(
        "[{score:>3}]{star} {} {} {} | ${} | {} km | {} | id {}",
        listing.year, listing.make, listing.model, listing.price, listing.odo, listing.source, car.id
    )
}

async fn star(store: &JsonStore, id: Option<&String>) -> Result<()> {
    let id: i64 = id
        .context("usage: evscout star <id>")?
        .parse()
        .context("id must be a number")?;
    let car = store.toggle_star(id).await?;
    if car.starred {
        println!(
            "Starred {} {} {}",
            car.listing.year, car.listing.make, car.listing.model
        );
    } else {
        println!(
            "Unstarred {} {} {}",
            car.listing.year, car.listing.make, car.listing.model
        );
    }
    Ok(())
}

async fn remove(service: &Service, id: Option<&String>) -> Result<()> {
    let car_id: i64 = id
        .context("usage: evscout rm <id>")?
        .parse()
        .context("id must be a number")?;
    match service.handle(Request::DeleteCar { car_id }).await {
        Reply::Done { .. } => {
            println!("Deleted {car_id}");
            Ok(())
        }
        Reply::Failed { error, .. } => bail!("delete failed: {error}"),
        _ => bail!("unexpected reply"),
    }
}

async fn export(service: &Service, path: Option<&String>) -> Result<()> {
    let document = match service.handle(Request::ExportData).await {
        Reply::Export(document) => document,
        Reply::Failed { error, .. } => bail!("export failed: {error}"),
        _ => bail!("unexpected reply"),
    };

    let default_path = format!("evscout-backup-{}.json", Utc::now().date_naive());
    let path = path.map(String::as_str).unwrap_or(&default_path);
    let bytes = serde_json::to_vec_pretty(&document)?;
    tokio::fs::write(path, bytes).await?;
    println!("Exported {} cars to {path}", document.cars.len());
    Ok(())
}

async fn import(service: &Service, path: Option<&String>) -> Result<()> {
    let path = path.context("usage: evscout import <path>")?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("could not read {path}"))?;
    let data: serde_json::Value = serde_json::from_slice(&bytes)?;
    // Count before handing the document over, for reporting
    let incoming = data["cars"].as_array().map_or(0, Vec::len);

    match service.handle(Request::ImportData { data }).await {
        Reply::Done { .. } => {
            println!("Imported {incoming} cars from {path}");
            Ok(())
        }
        Reply::Failed { error, .. } => bail!("import failed: {error}"),
        _ => bail!("unexpected reply"),
    }
}

async fn mode(service: &Service, value: Option<&String>) -> Result<()> {
    let Some(value) = value else {
        let settings = match service.handle(Request::GetSettings).await {
            Reply::Settings { settings } => settings,
            _ => bail!("could not read settings"),
        };
        println!("mode: {}", mode_name(settings.mode));
        return Ok(());
    };

    let mode = match value.as_str() {
        "ev" => Mode::Ev,
        "all" => Mode::All,
        other => bail!("mode must be 'ev' or 'all', got '{other}'"),
    };
    let patch = SettingsPatch { mode: Some(mode) };
    match service.handle(Request::SaveSettings { settings: patch }).await {
        Reply::SettingsSaved { settings, .. } => {
            println!("mode: {}", mode_name(settings.mode));
            Ok(())
        }
        Reply::Failed { error, .. } => bail!("could not save settings: {error}"),
        _ => bail!("unexpected reply"),
    }
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Ev => "ev",
        Mode::All => "all",
    }
}

async fn weights(service: &Service, args: &[String]) -> Result<()> {
    let mut weights = match service.handle(Request::GetWeights).await {
        Reply::Weights { weights } => weights,
        _ => bail!("could not read weights"),
    };

    if args.is_empty() {
        print_weights(&weights);
        return Ok(());
    }

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{arg}'"))?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("'{value}' is not a number"))?;
        set_weight(&mut weights, key, value)?;
    }

    match service.handle(Request::SaveWeights { weights }).await {
        Reply::Done { .. } => {
            print_weights(&weights);
            Ok(())
        }
        Reply::Failed { error, .. } => bail!("could not save weights: {error}"),
        _ => bail!("unexpected reply"),
    }
}

fn set_weight(weights: &mut Weights, key: &str, value: f64) -> Result<()> {
    match key {
        "price" => weights.price = value,
        "odo" => weights.odo = value,
        "range" => weights.range = value,
        "year" => weights.year = value,
        "trimLevel" => weights.trim_level = value,
        "distance" => weights.distance = value,
        "remoteStart" => weights.remote_start = value,
        "length" => weights.length = value,
        "damage" => weights.damage = value,
        "heatPump" => weights.heat_pump = value,
        other => bail!("unknown weight '{other}'"),
    }
    Ok(())
}

fn print_weights(weights: &Weights) {
    println!("price       {:>5}", weights.price);
    println!("odo         {:>5}", weights.odo);
    println!("range       {:>5}", weights.range);
    println!("year        {:>5}", weights.year);
    println!("trimLevel   {:>5}", weights.trim_level);
    println!("distance    {:>5}", weights.distance);
    println!("remoteStart {:>5}", weights.remote_start);
    println!("length      {:>5}", weights.length);
    println!("damage      {:>5}", weights.damage);
    println!("heatPump    {:>5}", weights.heat_pump);
    println!("total       {:>5}", weights.total());
}

async fn msg(service: &Service, raw: Option<&String>) -> Result<()> {
    let raw = raw.context("usage: evscout msg '<json>'")?;
    let value: serde_json::Value = serde_json::from_str(raw).context("message must be JSON")?;
    let reply = service.dispatch(value).await;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn print_usage() {
    println!("evscout: save and rank used-vehicle listings");
    println!();
    println!("Usage:");
    println!("  evscout grab <url>          Fetch a listing page, extract it, and save the car");
    println!("  evscout rank                Show the collection, best score first");
    println!("  evscout star <id>           Toggle the star on a saved car");
    println!("  evscout rm <id>             Delete a saved car");
    println!("  evscout export [path]       Write a backup document");
    println!("  evscout import <path>       Replace the collection from a backup");
    println!("  evscout mode [ev|all]       Show or set the extraction mode");
    println!("  evscout weights [k=v ...]   Show or adjust scoring weights");
    println!("  evscout msg '<json>'        Send a raw protocol message");
}
