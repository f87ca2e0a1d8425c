// This file is an example runner for the `cvd_recolor` library.
// It reads `handle color` lines (from a file or stdin), runs one analysis pass and
// prints the report and the replacement map as JSON.
//
//   cvd_recolor [--config engine.toml] [--type tritanopia] [--mutual] [input.txt]

use anyhow::{Context, bail};
use cvd_recolor::logging::init_logging;
use cvd_recolor::{ColorSample, EngineConfig, RecolorPipeline};
use serde_json::json;
use std::collections::BTreeMap;
use std::env;
use std::io::Read;
use tracing::{info, warn};

struct Args {
    config: Option<String>,
    deficiency: Option<String>,
    mutual: bool,
    input: Option<String>,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut parsed = Args {
        config: None,
        deficiency: None,
        mutual: false,
        input: None,
    };
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(args.next().context("--config needs a path")?),
            "--type" => parsed.deficiency = Some(args.next().context("--type needs an identifier")?),
            "--mutual" => parsed.mutual = true,
            "-h" | "--help" => return Ok(None),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => parsed.input = Some(path.to_string()),
        }
    }
    Ok(Some(parsed))
}

/// `handle color...` per line; blank lines and `//` comments are skipped.
fn parse_samples(text: &str) -> Vec<ColorSample<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .filter_map(|line| match line.split_once(char::is_whitespace) {
            Some((subject, color)) => Some(ColorSample::new(subject.to_string(), color.trim())),
            None => {
                warn!(line, "line has no color, skipping");
                None
            }
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let Some(args) = parse_args()? else {
        println!("Usage: cvd_recolor [--config <engine.toml>] [--type <deficiency>] [--mutual] [input]");
        return Ok(());
    };

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => EngineConfig::default(),
    };
    if let Some(deficiency) = args.deficiency {
        config.deficiency = deficiency;
    }
    config.check_replacements_mutually |= args.mutual;

    init_logging(&config.logging).context("initialising logging")?;

    // --- 2. Input ---
    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            buffer
        }
    };
    let samples = parse_samples(&text);

    // --- 3. Analysis ---
    let pipeline = RecolorPipeline::new(config).context("invalid engine configuration")?;
    let analysis = pipeline.analyze(&samples);
    info!(
        groups = analysis.table.len(),
        issues = analysis.report.issue_count,
        replaced = analysis.outcome.assignments.len(),
        "analysis finished"
    );

    // --- 4. Output ---
    let replacements: BTreeMap<_, _> = analysis.outcome.replacements.iter().collect();
    let unresolved: Vec<_> = analysis
        .outcome
        .unresolved()
        .into_iter()
        .map(|a| a.original_key.as_str())
        .collect();
    let output = json!({
        "report": analysis.report,
        "assignments": analysis.outcome.assignments,
        "replacements": replacements,
        "unresolved": unresolved,
        "stats": analysis.table.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
