use crate::infra::{dispatch_settings, load_seed, DryRunNotifier, InMemorySubscriptionStore};
use aurora_watch::alerts::{AlertRunService, AlertRunSummary, ResendEmailSink};
use aurora_watch::config::AppConfig;
use aurora_watch::domain::{
    Accessibility, AirQualitySignal, AuroraSignal, Location, LocationId, Signal, Tier,
    WeatherSignal,
};
use aurora_watch::error::AppError;
use aurora_watch::providers::SignalProviders;
use aurora_watch::scoring::{should_alert, Score, ScoringEngine, UNKNOWN_CLOUD_COVERAGE};
use aurora_watch::telemetry;
use chrono::{DateTime, Utc};
use clap::Args;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) lat: f64,
    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) lon: f64,
    /// Bortle dark-sky class (1-9); unknown when omitted
    #[arg(long)]
    pub(crate) bortle: Option<i64>,
    /// Current planetary Kp index
    #[arg(long)]
    pub(crate) kp: Option<f64>,
    /// Cloud coverage percentage
    #[arg(long)]
    pub(crate) clouds: Option<f64>,
    /// US air quality index
    #[arg(long)]
    pub(crate) aqi: Option<f64>,
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_timestamp)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Fetch live signals for any value not given explicitly
    #[arg(long)]
    pub(crate) live: bool,
}

impl ScoreArgs {
    fn location(&self) -> Location {
        Location {
            id: LocationId("cli".to_string()),
            name: format!("{:.4}, {:.4}", self.lat, self.lon),
            description: None,
            latitude: self.lat,
            longitude: self.lon,
            country: String::new(),
            region: None,
            tier: Tier::Tertiary,
            bortle_scale: self.bortle,
            accessibility: Accessibility::default(),
            amenities: BTreeMap::new(),
            best_months: Vec::new(),
            nearby_city: None,
            nearby_airport: None,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct AlertRunArgs {
    /// Seed document with locations, profiles and saved locations. Defaults to AURORA_SEED_PATH
    /// or the bundled catalogue.
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Log alerts instead of sending e-mail
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = ScoringEngine::new(config.scoring.moon_model());
    let location = args.location();
    location.validate()?;

    let providers = if args.live {
        Some(SignalProviders::from_config(&config.providers)?)
    } else {
        None
    };
    let live = providers.as_ref();

    let explicit_aurora = args.kp.map(|kp_index| AuroraSignal {
        kp_index,
        forecast: Vec::new(),
        updated_at: None,
    });
    let explicit_weather = args.clouds.map(WeatherSignal::with_cloud_coverage);
    let explicit_air = args.aqi.map(AirQualitySignal::with_aqi);

    let (aurora, weather, air_quality) = tokio::join!(
        explicit_or_live(explicit_aurora, live.map(|p| p.current_aurora())),
        explicit_or_live(explicit_weather, live.map(|p| p.weather_at(args.lat, args.lon))),
        explicit_or_live(explicit_air, live.map(|p| p.air_quality_at(args.lat, args.lon))),
    );

    let now = args.at.unwrap_or_else(Utc::now);
    let score = engine.score(&location, &aurora, &weather, &air_quality, now);
    print_score(&location, now, &score, &aurora, &weather, &air_quality);
    Ok(())
}

async fn explicit_or_live<T, F>(explicit: Option<T>, live: Option<F>) -> Signal<T>
where
    F: Future<Output = Signal<T>>,
{
    match (explicit, live) {
        (Some(value), _) => Signal::Present(value),
        (None, Some(fetch)) => fetch.await,
        (None, None) => Signal::Absent,
    }
}

fn print_score(
    location: &Location,
    now: DateTime<Utc>,
    score: &Score,
    aurora: &Signal<AuroraSignal>,
    weather: &Signal<WeatherSignal>,
    air_quality: &Signal<AirQualitySignal>,
) {
    println!("Aurora viewing score");
    println!("  Location: {}", location.name);
    println!("  Evaluated at: {}", now.to_rfc3339());
    println!(
        "  Total: {} ({})",
        score.total_score, score.viewing_recommendation
    );
    println!("  Components:");
    for (label, value) in [
        ("latitude", score.scores.latitude),
        ("kp index", score.scores.kp_index),
        ("clouds", score.scores.clouds),
        ("light pollution", score.scores.light_pollution),
        ("moon phase", score.scores.moon_phase),
        ("air quality", score.scores.air_quality),
    ] {
        println!("    {:<16}{:>6.1}", label, value);
    }

    println!(
        "  Signals: aurora {}, weather {}, air quality {}",
        describe(aurora.present().map(describe_aurora)),
        describe(
            weather
                .present()
                .map(|signal| format!("{}% cloud", signal.cloud_coverage))
        ),
        describe(air_quality.present().map(|signal| format!("AQI {}", signal.aqi))),
    );

    let kp_index = aurora.present().map_or(0.0, |signal| signal.kp_index);
    let cloud_coverage = weather
        .present()
        .map_or(UNKNOWN_CLOUD_COVERAGE, |signal| signal.cloud_coverage);
    let eligible = should_alert(score.total_score, kp_index, cloud_coverage);
    println!("  Alert eligible: {}", if eligible { "yes" } else { "no" });
}

fn describe_aurora(signal: &AuroraSignal) -> String {
    match signal.peak_forecast_kp() {
        Some(peak) => format!("Kp {} (forecast peak Kp {})", signal.kp_index, peak),
        None => format!("Kp {}", signal.kp_index),
    }
}

fn describe(value: Option<String>) -> String {
    value.unwrap_or_else(|| "unavailable".to_string())
}

pub(crate) async fn run_alerts(args: AlertRunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let seed_path = args
        .seed
        .or_else(|| config.alerts.seed_path.as_ref().map(PathBuf::from));
    let store = Arc::new(InMemorySubscriptionStore::from_seed(load_seed(
        seed_path.as_deref(),
    )?));
    let providers = SignalProviders::from_config(&config.providers)?;
    let engine = Arc::new(ScoringEngine::new(config.scoring.moon_model()));
    let settings = dispatch_settings(&config);

    let summary: AlertRunSummary = if args.dry_run {
        let notifier = Arc::new(DryRunNotifier::default());
        let service =
            AlertRunService::new(store, notifier.clone(), providers, engine, settings);
        let summary = service.run(Utc::now()).await?;
        for notification in notifier.outbox() {
            println!("Would send to {}: {}", notification.recipient, notification.subject);
        }
        summary
    } else {
        let notifier = Arc::new(ResendEmailSink::from_config(&config.alerts)?);
        let service = AlertRunService::new(store, notifier, providers, engine, settings);
        service.run(Utc::now()).await?
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Alert run summary unavailable: {err}"),
    }
    Ok(())
}
