use indicatif::{ProgressBar, ProgressStyle};

/// Progress over every solver run of the benchmark, labelled with the instance being run.
pub struct BenchProgress {
    bar: ProgressBar,
}

impl BenchProgress {
    pub fn new(total_runs: u64, hidden: bool) -> Self {
        if hidden {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_runs);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} runs [{elapsed_precise}] {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|e| {
            log::debug!("Falling back to the default progress style: {e}");
            ProgressStyle::default_bar()
        });
        bar.set_style(style);

        Self { bar }
    }

    pub fn start_instance(&self, label: &str) {
        self.bar.set_message(label.to_string());
    }

    pub fn run_finished(&self) {
        self.bar.inc(1);
    }

    /// Account for runs of an instance that will never happen, so the bar still reaches its end.
    pub fn skip_runs(&self, runs: u64) {
        self.bar.inc(runs);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
