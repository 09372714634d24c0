use anyhow::anyhow;
use tsp_bench_runner::prelude::*;

fn main() -> anyhow::Result<()> {
    let cli = init();

    let definition = BenchmarkDefinitionBuilder::from_cli(cli).build()?;
    let outcome = run(definition)?;

    print_summary(&outcome.report);
    println!("Report written to {}", outcome.report_path.display());

    if outcome.interrupted() {
        log::warn!("The benchmark was interrupted, the report is incomplete");
    }

    if outcome.all_failed() {
        return Err(anyhow!(
            "All {} instance(s) failed, see {}",
            outcome.discovered,
            outcome.report_path.display()
        ));
    }

    Ok(())
}
