use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::{Progress, Stage};

/// Percentage bar fed by pipeline [`Progress`] events.
pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    pub fn new(description: &str) -> Result<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar().template("{msg:<16} [{bar:40.cyan/blue}] {pos:>3}%")?.progress_chars("●○ ");

        bar.set_style(style);
        bar.set_message(description.to_owned());

        Ok(Self { bar })
    }

    /// Moves to `progress.percent`, never backwards, and relabels on stage change.
    pub fn update(&self, progress: Progress) {
        match progress.stage {
            Stage::Done => self.finish(),
            Stage::Failed => self.bar.abandon_with_message(Stage::Failed.to_string()),
            stage => {
                let position = u64::from(progress.percent).max(self.bar.position());
                self.bar.set_position(position);
                self.bar.set_message(stage.to_string());
            }
        }
    }

    pub fn finish(&self) {
        self.bar.set_position(100);
        self.bar.finish_with_message(Stage::Done.to_string());
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}
