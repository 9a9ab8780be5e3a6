use std::time::Duration;

use clap::{Args, Subcommand};
use stillpoint_core::storage::PracticeRecord;
use stillpoint_core::{
    builtin_variants, find_variant, phase_at, Config, Database, Emotion, Event, FlowKind,
    FlowStep, OfflineSync, Page, PracticeController, PracticeSync, SessionDeps, SilentBackend,
    SqliteDraftStore, TokenStore,
};
use tokio::runtime::Runtime;

use super::{api_client, runtime, CmdResult};

#[derive(Subcommand)]
pub enum PracticeAction {
    /// List built-in variants
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the phase at a given elapsed second
    Phase {
        /// Variant id (e.g. "4-6-breathing")
        variant: String,
        /// Seconds since the practice started
        elapsed: u64,
    },
    /// Run a practice without a screen
    Run(RunArgs),
    /// Completed practices recorded on the server
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Today's practice status from the server
    Today,
}

#[derive(Args)]
pub struct RunArgs {
    /// Variant id (defaults to practice.default_variant)
    #[arg(long)]
    variant: Option<String>,
    /// Short flow without emotion check and mood record
    #[arg(long)]
    quick: bool,
    /// Answer for the emotion check
    #[arg(long, default_value = "calm")]
    emotion: Emotion,
    /// Reflection entered on the completion page
    #[arg(long)]
    reflection: Option<String>,
    #[arg(long)]
    skip_mood: bool,
    /// Stop after this many practice seconds, leaving a draft
    #[arg(long)]
    stop_after: Option<u64>,
    /// Wait one real second per tick
    #[arg(long)]
    realtime: bool,
    /// Never contact the server
    #[arg(long)]
    offline: bool,
    /// Discard a saved draft instead of resuming it
    #[arg(long)]
    fresh: bool,
    /// Print events as JSON lines
    #[arg(long)]
    events: bool,
}

pub fn run(action: PracticeAction) -> CmdResult {
    match action {
        PracticeAction::List { json } => {
            let variants = builtin_variants();
            if json {
                println!("{}", serde_json::to_string_pretty(&variants)?);
                return Ok(());
            }
            for v in variants {
                println!(
                    "{:<16} {:<28} cycle {:>2}s  total {:>3}s",
                    v.id,
                    v.title,
                    v.cycle_secs(),
                    v.session_secs
                );
            }
        }
        PracticeAction::Phase { variant, elapsed } => {
            let variant = find_variant(&variant)?;
            match phase_at(elapsed, &variant) {
                Some(phase) => println!("{}", serde_json::to_string_pretty(&phase)?),
                None => println!("no phase"),
            }
        }
        PracticeAction::Run(args) => {
            let config = Config::load_or_default();
            let rt = runtime()?;
            if !args.offline {
                let api = api_client(&config)?;
                if api.tokens().is_logged_in() {
                    return run_session(&args, &config, api, &rt);
                }
                tracing::info!("not logged in, practice stays local");
            }
            run_session(&args, &config, OfflineSync, &rt)?;
        }
        PracticeAction::History { limit } => {
            let api = api_client(&Config::load_or_default())?;
            let history = runtime()?.block_on(api.practice_history(limit))?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        PracticeAction::Today => {
            let api = api_client(&Config::load_or_default())?;
            let status = runtime()?.block_on(api.today_status())?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

fn run_session<S: PracticeSync>(
    args: &RunArgs,
    config: &Config,
    sync: S,
    rt: &Runtime,
) -> CmdResult {
    let variant_id = args
        .variant
        .clone()
        .unwrap_or_else(|| config.practice.default_variant.clone());
    let variant = find_variant(&variant_id)?;
    let flow = if args.quick {
        FlowKind::Quick
    } else {
        config.practice.flow
    };
    let sync_every = config.practice.autosave_interval_secs.max(1);

    let deps = SessionDeps {
        sync,
        drafts: Box::new(SqliteDraftStore::open()?),
        audio: Box::new(SilentBackend::new(variant.session_secs.saturating_mul(1000))),
        autosave_interval_secs: config.practice.autosave_interval_secs,
    };
    let fresh = args.fresh;
    let mut ctl = PracticeController::launch(variant, flow, deps, |draft| {
        if fresh {
            return false;
        }
        println!(
            "resuming draft saved {} at {}s",
            draft.saved_at.format("%Y-%m-%d %H:%M"),
            draft.session.elapsed_secs
        );
        true
    })?;
    ctl.set_volume(config.audio.volume)?;
    ctl.set_muted(config.audio.muted)?;

    let mut pacer = args
        .realtime
        .then(|| Pacer::new(rt, config.audio.poll_interval_ms));
    let mut practiced = 0u64;
    loop {
        let step = match ctl.page() {
            Page::Selection | Page::Preparation | Page::MoodRecord => ctl.next()?,
            Page::EmotionCheck => {
                ctl.select_emotion(args.emotion)?;
                ctl.next()?
            }
            Page::Practice => {
                if args.stop_after.is_some_and(|limit| practiced >= limit) {
                    ctl.teardown();
                    emit(&mut ctl, args.events)?;
                    println!("stopped at {}s, draft saved", ctl.session().elapsed_secs);
                    return Ok(());
                }
                if let Some(pacer) = pacer.as_mut() {
                    pacer.wait(&ctl, rt);
                }
                practiced += 1;
                let step = ctl.tick();
                if practiced % sync_every == 0 {
                    if let Err(e) = rt.block_on(ctl.sync_progress()) {
                        tracing::warn!(error = %e, "progress not synced");
                    }
                }
                match step {
                    Some(step) => step,
                    None => {
                        emit(&mut ctl, args.events)?;
                        continue;
                    }
                }
            }
            Page::Completion => {
                if let Some(text) = &args.reflection {
                    ctl.set_answer("reflection", text)?;
                }
                if args.skip_mood {
                    ctl.skip_mood_record()?
                } else {
                    ctl.next()?
                }
            }
            Page::Success => return Ok(()),
        };
        emit(&mut ctl, args.events)?;

        match step {
            FlowStep::Moved { to, .. } => {
                if !args.events {
                    println!("page: {to}");
                }
            }
            FlowStep::Blocked { reason, .. } => return Err(reason.into()),
            FlowStep::Exited => return Ok(()),
            FlowStep::Completed(record) => return finish(&mut ctl, &record, rt),
        }
    }
}

/// Paces `--realtime` runs: polls audio every `poll_ms` and releases one
/// tick per second.
struct Pacer {
    interval: tokio::time::Interval,
    polls_per_tick: u64,
}

impl Pacer {
    fn new(rt: &Runtime, poll_ms: u64) -> Self {
        let poll_ms = poll_ms.clamp(10, 1000);
        let interval = rt.block_on(async { tokio::time::interval(Duration::from_millis(poll_ms)) });
        Self {
            interval,
            polls_per_tick: 1000 / poll_ms,
        }
    }

    fn wait<S: PracticeSync>(&mut self, ctl: &PracticeController<S>, rt: &Runtime) {
        for _ in 0..self.polls_per_tick {
            rt.block_on(self.interval.tick());
            if let Some(status) = ctl.poll_audio() {
                tracing::trace!(
                    position_ms = status.position_ms,
                    playing = status.is_playing,
                    "audio status"
                );
            }
        }
    }
}

fn finish<S: PracticeSync>(
    ctl: &mut PracticeController<S>,
    record: &PracticeRecord,
    rt: &Runtime,
) -> CmdResult {
    Database::open()?.record_practice(record)?;
    match rt.block_on(ctl.submit_completion()) {
        Ok(receipt) => println!(
            "completed {}s, synced as {}",
            record.duration_secs, receipt.remote_id
        ),
        Err(e) => {
            tracing::warn!(error = %e, "completion not synced");
            println!("completed {}s (not synced)", record.duration_secs);
        }
    }
    Ok(())
}

fn emit<S: PracticeSync>(ctl: &mut PracticeController<S>, json: bool) -> CmdResult {
    for event in ctl.drain_events() {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else if let Event::PhaseChanged {
            to,
            seconds_remaining,
            ..
        } = &event
        {
            println!("  {} {}s", to.as_str(), seconds_remaining);
        }
    }
    Ok(())
}
