use anyhow::Context;
use cvd_recolor::core_modules::utils::image_helper::image_helper;
use cvd_recolor::logging::init_logging;
use cvd_recolor::{DeficiencyType, EngineConfig, ParallelPipeline, RecolorPipeline};
use std::env;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: visual_tester <input_image_path> <output_dir> [engine.toml]");
        return Ok(());
    }
    let input_path = &args[1];
    let output_dir = Path::new(&args[2]);

    let config = match args.get(3) {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => EngineConfig::default(),
    };
    init_logging(&config.logging).context("initialising logging")?;

    // --- 2. Image I/O Initialization ---
    let image = image::open(input_path)
        .with_context(|| format!("opening {input_path}"))?
        .to_rgba8();
    std::fs::create_dir_all(output_dir).with_context(|| format!("creating {}", output_dir.display()))?;
    info!(width = image.width(), height = image.height(), "loaded input image");

    // --- 3. Pipeline Initialization ---
    let pipeline = RecolorPipeline::new(config).context("invalid engine configuration")?;
    let parallel: ParallelPipeline<u32, _> = ParallelPipeline::new(pipeline);

    // --- 4. Per-type simulation ---
    for ty in DeficiencyType::ALL {
        let simulated = parallel.simulate_image(&image, ty).await?;
        let path = output_dir.join(format!("simulated_{}.png", ty.id()));
        image_helper::save_png(&path, &simulated).with_context(|| format!("writing {}", path.display()))?;
        info!(deficiency = %ty, path = %path.display(), "wrote simulation");
    }

    // --- 5. Recoloring ---
    let (recolored, analysis) = parallel.pipeline().recolor_image(&image);
    let path = output_dir.join("recolored.png");
    image_helper::save_png(&path, &recolored).with_context(|| format!("writing {}", path.display()))?;

    for assignment in &analysis.outcome.assignments {
        println!(
            "{} -> {} ({:?}, triggered by {:?}{})",
            assignment.original_color,
            assignment.replacement_color,
            assignment.strategy,
            assignment.triggering_types,
            if assignment.resolved { "" } else { ", unresolved" }
        );
    }
    println!("{}", analysis.report.to_json()?);

    parallel.shutdown().await;
    Ok(())
}
