use anyhow::Context;
use retrodrop::config::{Campaign, Paths};
use retrodrop::datasource::{parse_event_log, parse_price_series, parse_swap_log};
use retrodrop::engine::Normalizer;
use retrodrop::orchestration::{run_lp_replay, run_swap_distribution};
use retrodrop::output;
use retrodrop::rewards::{Reconciliation, RewardLedger};
use std::fs::File;
use std::io::BufReader;
use tracing::{info, warn};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let paths = match Paths::from_env() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&paths) {
        eprintln!("Run failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(paths: &Paths) -> anyhow::Result<()> {
    let campaign_raw = std::fs::read_to_string(&paths.campaign_config)
        .with_context(|| format!("reading {}", paths.campaign_config.display()))?;
    let campaign = Campaign::from_json(&campaign_raw)?;

    let event_file = File::open(&paths.event_log)
        .with_context(|| format!("opening {}", paths.event_log.display()))?;
    let rows = parse_event_log(BufReader::new(event_file))?;
    info!(rows = rows.len(), "loaded transfer log");

    let prices_file = File::open(&paths.prices)
        .with_context(|| format!("opening {}", paths.prices.display()))?;
    let prices = parse_price_series(BufReader::new(prices_file))?;
    info!(ticks = prices.len(), "loaded price series");

    let normalizer = Normalizer::new(&campaign.registry, &campaign.excluded_addresses);
    let events = normalizer.normalize_all(&rows)?;
    info!(
        events = events.len(),
        skipped = rows.len() - events.len(),
        "normalized transfer log"
    );

    let outcome = run_lp_replay(&campaign, &events, &prices)?;
    info!(
        steps = outcome.report.steps,
        events_applied = outcome.report.events_applied,
        holders = outcome.holder_count(),
        clamps = outcome.report.clamp_count,
        "replay complete"
    );

    std::fs::create_dir_all(&paths.output_dir)
        .with_context(|| format!("creating {}", paths.output_dir.display()))?;
    output::write_json(
        paths.output_dir.join("lp_rewards.json"),
        &output::reward_table(&outcome.rewards),
    )?;
    output::write_json(
        paths.output_dir.join("timeweighted.json"),
        &output::time_weighted_by_pool(&outcome.ledger, &campaign.registry),
    )?;
    output::write_json(
        paths.output_dir.join("timeweighted_by_address.json"),
        &output::time_weighted_by_address(&outcome.ledger, &campaign.registry),
    )?;

    let mut expected_total = campaign.schedule.budget;
    let mut tables = vec![outcome.rewards.clone()];

    match (&campaign.swap, &paths.swap_log) {
        (Some(settings), Some(swap_path)) => {
            let swap_file = File::open(swap_path)
                .with_context(|| format!("opening {}", swap_path.display()))?;
            let swap_rows = parse_swap_log(BufReader::new(swap_file))?;
            let swaps = normalizer.normalize_swaps(&swap_rows)?;
            info!(swaps = swaps.len(), "loaded swap log");

            let swap_outcome = run_swap_distribution(&campaign, settings, &swaps, &prices)?;
            info!(eligible = swap_outcome.eligible, "swap distribution complete");
            output::write_json(
                paths.output_dir.join("swap_rewards.json"),
                &output::reward_table(&swap_outcome.rewards),
            )?;

            expected_total = expected_total
                .checked_add(settings.budget)
                .context("combined budget overflow")?;
            tables.push(swap_outcome.rewards);
        }
        (Some(_), None) => {
            warn!("campaign configures swap rewards but SWAP_LOG_PATH is unset; skipping");
        }
        (None, Some(_)) => {
            warn!("SWAP_LOG_PATH set but the campaign has no swap section; skipping");
        }
        (None, None) => {}
    }

    let merged = RewardLedger::merge(tables.iter()).context("merging reward tables")?;
    Reconciliation::check(expected_total, &merged).surface("merged");
    output::write_json(
        paths.output_dir.join("rewards.json"),
        &output::reward_table(&merged),
    )?;

    info!(
        recipients = merged.len(),
        total = %merged.total(),
        output = %paths.output_dir.display(),
        "reward tables written"
    );
    Ok(())
}
