use tabled::settings::Style;
use tabled::{Table, Tabled};
use tsp_bench_summary_model::{AggregateRecord, BenchmarkReport};

#[derive(Tabled)]
pub struct InstanceRow {
    pub name: String,
    pub samples: usize,
    #[tabled(display = "float2")]
    pub avg_distance: f64,
    #[tabled(display = "float2")]
    pub std_dev_distance: f64,
    #[tabled(display = "float4")]
    pub avg_time_s: f64,
    #[tabled(display = "float4")]
    pub std_dev_time_s: f64,
}

impl From<&AggregateRecord> for InstanceRow {
    fn from(record: &AggregateRecord) -> Self {
        Self {
            name: record.name.clone(),
            samples: record.samples,
            avg_distance: record.distance.average,
            std_dev_distance: record.distance.std_dev,
            avg_time_s: record.time.average,
            std_dev_time_s: record.time.std_dev,
        }
    }
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

fn float4(n: &f64) -> String {
    format!("{:.4}", n)
}

/// Render the summarised instances of `report` as a table.
pub fn summary_table(report: &BenchmarkReport) -> String {
    let rows = report
        .results
        .iter()
        .map(InstanceRow::from)
        .collect::<Vec<_>>();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.to_string()
}

/// Print the summary table followed by a line per failed instance.
pub fn print_summary(report: &BenchmarkReport) {
    println!("\nSummary of instances");
    println!("{}", summary_table(report));

    for failure in &report.failures {
        log::warn!(
            "{} ({}) failed while {}: {}",
            failure.name.as_deref().unwrap_or("<unnamed>"),
            failure.source,
            failure.stage,
            failure.reason
        );
    }
}
