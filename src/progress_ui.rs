//! Terminal progress bars fed by the library's progress events.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use installer_core::download::{ProgressEvent, SharedProgress};
use installer_core::pack::{EntryProgress, ManifestEntry};

const BAR_TEMPLATE: &str = "{msg:40!} {bar:30} {bytes}/{total_bytes} {bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "{spinner} {msg:40!} {bytes} {bytes_per_sec}";

/// Returns true when bars should be drawn: stderr is a terminal and output is
/// not suppressed.
pub(crate) fn should_draw(quiet: bool) -> bool {
    !quiet && io::stderr().is_terminal() && std::env::var("TERM").map_or(true, |t| t != "dumb")
}

/// One bar per active transfer, stacked.
#[derive(Clone)]
pub(crate) struct ProgressUi {
    multi: MultiProgress,
}

impl ProgressUi {
    pub(crate) fn new(enabled: bool) -> Self {
        let target = if enabled {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
        }
    }

    /// Observer driving a new bar labelled `label`, removed on completion.
    pub(crate) fn observer(&self, label: impl Into<String>) -> SharedProgress {
        let bar = self.multi.add(ProgressBar::no_length());
        bar.set_message(label.into());
        Arc::new(move |event: ProgressEvent| update_bar(&bar, event))
    }

    /// Per-entry observer factory for the batch installer.
    pub(crate) fn entry_progress(&self) -> EntryProgress {
        let ui = self.clone();
        Arc::new(move |entry: &ManifestEntry| Some(ui.observer(entry.path.clone())))
    }
}

fn update_bar(bar: &ProgressBar, event: ProgressEvent) {
    match event.total {
        Some(total) if bar.length() != Some(total) => {
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.set_length(total);
        }
        None if bar.length().is_none() && event.transferred == 0 => {
            bar.set_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
        }
        _ => {}
    }
    bar.set_position(event.transferred);
    if event.total == Some(event.transferred) {
        bar.finish_and_clear();
    }
}
