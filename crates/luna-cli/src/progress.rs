use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use luna_core::pipeline::{PipelineStage, ProgressReporter};

/// Drives one indicatif bar per pipeline stage.
///
/// Stages with a known item count get a bar; the rest get a spinner.
#[derive(Default)]
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter for CliReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let bar = match total_items {
            Some(total) => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(
                    ProgressStyle::with_template("{msg:24} [{bar:40}] {pos}/{len}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                pb
            }
        };
        bar.set_message(stage.to_string());
        *self.bar.lock().expect("reporter mutex poisoned") = Some(bar);
    }

    fn advance(&self, items_done: usize) {
        if let Some(pb) = self.bar.lock().expect("reporter mutex poisoned").as_ref() {
            pb.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        if let Some(pb) = self.bar.lock().expect("reporter mutex poisoned").take() {
            pb.finish_and_clear();
        }
    }
}
