pub mod ask;
pub mod config;
pub mod run;
pub mod simulate;

use funnel_core::Event;

/// Print one event as a JSON line on stdout.
pub fn print_event(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
