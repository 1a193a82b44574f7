use clap::Args;
use funnel_core::{Config, Session};

use super::print_event;

#[derive(Args)]
pub struct SimulateArgs {
    /// Virtual seconds to run
    #[arg(long, default_value = "120")]
    seconds: u64,
    /// PRNG seed (overrides the configured one)
    #[arg(long)]
    seed: Option<u64>,
    /// Video seconds played per virtual second; omit to never report progress
    #[arg(long)]
    progress_step: Option<f64>,
    /// Virtual second at which the pointer leaves through the top edge
    #[arg(long)]
    leave_at: Option<u64>,
    /// Print the final snapshot instead of the event stream
    #[arg(long)]
    summary: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut session = Session::new(&config)?;
    let mut events = session.start();
    let mut played = 0.0;

    for second in 1..=args.seconds {
        events.extend(session.advance_to(second * 1_000));
        if let Some(step) = args.progress_step {
            played += step;
            events.extend(session.report_progress(played));
        }
        if args.leave_at == Some(second) {
            events.extend(session.pointer_left(-1.0));
        }
        for event in events.drain(..) {
            if !args.summary {
                print_event(&event)?;
            }
        }
    }

    let snapshot = session.snapshot();
    events.extend(session.teardown());
    if args.summary {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        for event in &events {
            print_event(event)?;
        }
    }
    Ok(())
}
