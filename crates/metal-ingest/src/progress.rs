//! Console progress for fan-out stages

use crate::pool::ProgressObserver;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})";

/// Create a bar for a stage whose size is not known until it starts
pub fn create_stage_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(label.to_string());
    pb
}

/// Drives an indicatif bar from pool completions
pub struct BarObserver {
    label: String,
    bar: ProgressBar,
}

impl BarObserver {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            bar: create_stage_bar(label),
        }
    }

    /// Observer whose bar never draws
    pub fn hidden(label: &str) -> Self {
        Self {
            label: label.to_string(),
            bar: ProgressBar::hidden(),
        }
    }

    /// Visible or hidden depending on `show`
    pub fn for_stage(label: &str, show: bool) -> Self {
        if show {
            Self::new(label)
        } else {
            Self::hidden(label)
        }
    }
}

impl ProgressObserver for BarObserver {
    fn on_complete(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
        self.bar
            .set_message(format!("{}: {}/{}", self.label, completed, total));
    }

    fn on_finish(&self) {
        self.bar.finish_with_message(format!("{} completed", self.label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_bar_starts_empty() {
        let pb = create_stage_bar("Scraping band info");
        assert_eq!(pb.length(), Some(0));
        assert_eq!(pb.position(), 0);
    }

    #[test]
    fn test_observer_tracks_position() {
        let observer = BarObserver::hidden("Scraping band info");
        observer.on_complete(1, 7);
        observer.on_complete(2, 7);
        assert_eq!(observer.bar.position(), 2);
        assert_eq!(observer.bar.length(), Some(7));
        observer.on_finish();
        assert!(observer.bar.is_finished());
    }
}
