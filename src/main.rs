use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chartdash::dashboard::Dashboard;
use chartdash::data::Dataset;
use chartdash::loader;
use chartdash::parser::parse_selection;
use chartdash::render::RenderedOutput;
use chartdash::RenderOptions;

#[derive(Parser, Debug)]
#[command(name = "chartdash")]
#[command(
    about = "Generate dashboard charts from CSV or spreadsheet data",
    long_about = None
)]
struct Args {
    /// Path to the dataset (CSV or Excel; JSON row array with --json)
    data: PathBuf,

    /// Chart selection, repeatable; e.g. 'bar(x: region, y: sales)',
    /// 'sankey(source: from, target: to, value: amount)'
    #[arg(long = "chart", required = true)]
    charts: Vec<String>,

    /// Directory for generated PNG files
    #[arg(long, default_value = "charts")]
    out: PathBuf,

    /// Figure width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Treat the input file as a JSON array of row objects
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dataset = if args.json {
        let text = fs::read_to_string(&args.data)
            .with_context(|| format!("Failed to read {}", args.data.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse JSON input")?;
        Dataset::from_json(&value).context("Failed to build dataset from JSON")?
    } else {
        loader::load_path(&args.data)
            .with_context(|| format!("Failed to load {}", args.data.display()))?
    };

    // A bad selection string skips that one chart, the way a validation
    // failure does; the rest of the batch still renders.
    let mut dashboard = Dashboard::new(dataset);
    for spec in &args.charts {
        match parse_selection(spec) {
            Ok((chart, selection)) => dashboard.select(chart, selection),
            Err(e) => eprintln!("Skipping chart '{}': {:#}", spec.trim(), e),
        }
    }

    let options = RenderOptions {
        width: args.width,
        height: args.height,
    };
    let outcomes = dashboard.generate(&options);

    let mut rendered = 0usize;
    for (index, outcome) in outcomes.iter().enumerate() {
        match &outcome.result {
            Ok(RenderedOutput::Figure(png)) => {
                fs::create_dir_all(&args.out)
                    .with_context(|| format!("Failed to create {}", args.out.display()))?;
                let file = args.out.join(format!(
                    "{:02}-{}.png",
                    index + 1,
                    outcome.chart.keyword()
                ));
                fs::write(&file, png)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                println!("{}: {}", outcome.label, file.display());
                rendered += 1;
            }
            Ok(RenderedOutput::Table(view)) => {
                println!("{}", outcome.label);
                println!("{}", view);
                rendered += 1;
            }
            Err(e) => {
                eprintln!("{}: {}", outcome.label, e);
            }
        }
    }

    if rendered == 0 {
        anyhow::bail!("No charts could be generated");
    }
    Ok(())
}
