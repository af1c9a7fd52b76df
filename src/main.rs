use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use chaos_notebook::config::{LorenzConfig, MandelbrotConfig, PlotConfig};
use chaos_notebook::fractal::FractalImage;
use chaos_notebook::lorenz::trajectory::COMPONENT_NAMES;
use chaos_notebook::{export, lorenz, plot, NotebookConfig};

#[derive(Parser)]
#[command(
    name = "chaos-notebook",
    version,
    about = "Lorenz attractor and Mandelbrot set demonstrations"
)]
struct Cli {
    /// Configuration file (.json or .toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory, overrides the configured one
    #[arg(short, long, global = true)]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate the Lorenz system for every configured regime
    Lorenz,
    /// Render the configured Mandelbrot views
    Mandelbrot,
    /// Run both demonstrations
    All,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => NotebookConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NotebookConfig::default(),
    };
    if let Some(dir) = cli.out_dir {
        config.output_dir = dir;
    }
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    match cli.command {
        Commands::Lorenz => run_lorenz(&config.lorenz, &config.plot, &config.output_dir),
        Commands::Mandelbrot => run_mandelbrot(&config.mandelbrot, &config.output_dir),
        Commands::All => {
            run_lorenz(&config.lorenz, &config.plot, &config.output_dir)?;
            run_mandelbrot(&config.mandelbrot, &config.output_dir)
        }
    }
}

fn run_lorenz(config: &LorenzConfig, plot_config: &PlotConfig, out_dir: &Path) -> Result<()> {
    if config.regimes.is_empty() {
        warn!("no Lorenz regimes configured");
    }
    let series_options = plot_config.chart_options(&plot_config.time_series);
    let phase_options = plot_config.chart_options(&plot_config.phase_portrait);
    for regime in &config.regimes {
        let start = Instant::now();
        let trajectory = lorenz::solve_on_grid(
            regime.params(),
            config.initial_state(),
            config.t_start,
            config.t_end,
            config.samples,
            &config.solver,
        )
        .with_context(|| format!("integrating regime '{}'", regime.name))?;
        info!("{}: integrated in {:.2?}", regime.name, start.elapsed());
        for (axis, stats) in COMPONENT_NAMES.iter().zip(trajectory.summary().components) {
            info!(
                "{}: {axis} in [{:.3}, {:.3}], mean {:.3}",
                regime.name, stats.min, stats.max, stats.mean
            );
        }

        let series_path = out_dir.join(format!("lorenz_{}_time.png", regime.name));
        plot::time_series_chart(&trajectory, &series_options)
            .save(&series_path)
            .with_context(|| format!("writing {}", series_path.display()))?;
        let phase_path = out_dir.join(format!("lorenz_{}_phase.png", regime.name));
        plot::phase_portrait_chart(&trajectory, &phase_options)
            .save(&phase_path)
            .with_context(|| format!("writing {}", phase_path.display()))?;
        info!("wrote {} and {}", series_path.display(), phase_path.display());

        if let Some(format) = config.export {
            let path = out_dir.join(format!("lorenz_{}.{}", regime.name, format.extension()));
            export::export_auto(&trajectory, &path)
                .with_context(|| format!("exporting {}", path.display()))?;
            info!("exported {}", path.display());
        }
    }
    Ok(())
}

fn run_mandelbrot(config: &MandelbrotConfig, out_dir: &Path) -> Result<()> {
    for view in &config.views {
        let start = Instant::now();
        let image = FractalImage::compute(&view.grid_spec())
            .with_context(|| format!("sampling view '{}'", view.name))?;
        info!(
            "{}: {}x{} samples, max_iter {}, {:.1}% zero, {:.2?}",
            view.name,
            image.nx(),
            image.ny(),
            image.max_iter(),
            image.zero_fraction() * 100.0,
            start.elapsed()
        );
        let path = out_dir.join(format!("mandelbrot_{}.png", view.name));
        plot::image_plot::save(&image, &config.image_options(view), &path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(())
}
