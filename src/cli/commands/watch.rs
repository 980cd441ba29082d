//! Watch command - keep bundles resolved while sources change.

use std::thread;
use std::time::Duration;

use crate::config::Settings;

/// Run the watch command. Returns only on error.
pub fn run(settings: &Settings, idle_timeout: u64) -> anyhow::Result<()> {
    let handler = crate::cli::bundles_handler(settings)?;
    handler.resolve_all()?;
    println!("Resolved {} bundles", handler.registry().len());

    if !settings.watcher.enabled {
        println!("Watching is disabled in [watcher] settings");
        return Ok(());
    }

    let watcher = handler.watch(&settings.watcher)?;
    println!("Watching for changes (Ctrl+C to stop)");

    let poll = Duration::from_millis(settings.watcher.poll_interval_ms.max(10));
    let idle_timeout = Duration::from_secs(idle_timeout);

    let mut last_error = None;
    while watcher.is_running() {
        thread::sleep(poll);
        if !handler.has_dirty() {
            continue;
        }

        match handler.rebuild_dirty(Some(idle_timeout)) {
            Ok(rebuilt) => {
                last_error = None;
                for id in rebuilt {
                    if let Some(bundle) = handler.registry().get(id) {
                        println!("Rebuilt {}", bundle.name);
                    }
                }
            }
            // Bundles stay dirty and are retried on the next pass.
            Err(e) => {
                let message = e.to_string();
                if last_error.as_ref() != Some(&message) {
                    eprintln!("Error: {message}");
                    last_error = Some(message);
                }
            }
        }
    }

    Ok(())
}
