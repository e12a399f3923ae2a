use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use jyotish::{
    BirthInput, ChartCache, ChartEngine, EngineSettings, NatalChart, TimeConverter, TransitAnalyzer, TransitAspect,
    TransitCache,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute a sidereal natal chart")]
struct Args {
    /// Local civil birth time, `YYYY-MM-DDTHH:MM[:SS]`.
    #[arg(long)]
    date: String,

    /// Geographic latitude, degrees north.
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Geographic longitude, degrees east.
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// IANA zone name or fixed offset such as `+05:30`.
    #[arg(long, default_value = "UTC")]
    tz: String,

    /// Caller identity used in the chart cache key.
    #[arg(long, default_value = "cli")]
    identity: String,

    /// Skip the Swiss Ephemeris and use the closed-form series only.
    #[arg(long)]
    analytical_only: bool,

    /// Also list current transits against the natal chart.
    #[arg(long)]
    transits: bool,

    /// Print JSON instead of a text summary.
    #[arg(long)]
    json: bool,

    /// Explicit config file (otherwise `configs/jyotish.toml` if present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    chart: &'a NatalChart,
    #[serde(skip_serializing_if = "Option::is_none")]
    transits: Option<&'a [TransitAspect]>,
}

fn parse_date(text: &str) -> anyhow::Result<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .with_context(|| format!("Unrecognised --date {text:?} (expected YYYY-MM-DDTHH:MM[:SS])"))
}

fn load_settings(args: &Args) -> anyhow::Result<EngineSettings> {
    let mut settings = match &args.config {
        Some(path) => jyotish_config::load_engine_settings_from(path)?,
        None => jyotish_config::load_engine_settings()?,
    };
    if args.analytical_only {
        settings.use_primary = false;
    }
    Ok(settings)
}

fn print_summary(chart: &NatalChart, transits: Option<&[TransitAspect]>) {
    let utc = TimeConverter::new()
        .from_julian_day(chart.julian_day)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|e| e.to_string());
    println!(
        "JD {:.6} ({utc})  ayanamsa {:.4} ({:?})",
        chart.julian_day, chart.ayanamsa.degrees, chart.ayanamsa.source
    );
    for p in chart.positions.values() {
        println!(
            "  {:<8} {:>9.4}  {:>8.4}/d{}  {:?}",
            p.body.name(),
            p.longitude,
            p.speed,
            if p.retrograde { " R" } else { "  " },
            p.source
        );
    }
    match &chart.houses {
        Some(h) => {
            println!("Houses: {:?} via {:?}", h.method, h.source);
            for n in 1..=12 {
                println!("  {:>2} {:>9.4}", n, h.cusp(n));
            }
        }
        None => println!("Houses: unavailable"),
    }
    let q = &chart.quality;
    println!("Quality {} / 100 (retries {})", q.score, q.retries);
    for w in &q.warnings {
        println!("  warning: {w}");
    }
    for f in &q.critical_failures {
        println!("  critical: {}: {}", f.quantity, f.reason);
    }
    if let Some(aspects) = transits {
        println!("Transits:");
        for a in aspects {
            println!(
                "  {:<8} {:<12} {:<8} orb {:.2}{}{}",
                a.transiting.name(),
                a.kind.name(),
                a.natal.name(),
                a.orb,
                if a.is_exact { " exact" } else if a.is_applying { " applying" } else { " separating" },
                if a.is_return { " return" } else { "" }
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let settings = load_settings(&args)?;
    let ttl = Duration::from_secs(settings.transit_cache_ttl_secs);
    let engine = ChartEngine::new(settings);
    if !engine.has_primary() {
        log::warn!("Swiss Ephemeris unavailable; positions come from analytical series");
    }

    let input = BirthInput::new(parse_date(&args.date)?, args.lat, args.lon, args.tz.clone());
    let charts = ChartCache::new();
    let chart = charts
        .get_or_compute(&args.identity, &input, |input| engine.compute(input))
        .context("Chart computation failed")?;
    log::info!("Chart computed with quality score {}", chart.quality.score);

    let transits = if args.transits {
        let sky = TransitCache::new(ttl).get_or_refresh(|| engine.sky_now());
        Some(TransitAnalyzer::new().analyze(&chart, &sky))
    } else {
        None
    };

    if args.json {
        let report = Report { chart: &chart, transits: transits.as_deref() };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&chart, transits.as_deref());
    }
    Ok(())
}
