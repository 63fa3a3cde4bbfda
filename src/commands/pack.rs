use std::{
    env,
    io::{self, BufWriter, Write},
    thread,
    time::Duration,
};

use anyhow::{bail, Context};
use fs_err as fs;
use indicatif::{ProgressBar, ProgressStyle};
use rectpack::{
    BoundingBoxFinder, CancelToken, FixedSizePacker, GeneticPacker, GuillotinePlacement,
    HeightThenWidthAscending, HeightThenWidthDescending, PlacementAlgorithm,
    PowerOfTwoSizePacker, PreserveOrder, SkylinePlacement, SortHeuristic, UnknownSizePacker,
};

use crate::{
    data::{Algorithm, Config, SortOrder, Strategy},
    layout::Layout,
    options::{GlobalOptions, PackOptions},
};

pub fn pack(global: GlobalOptions, options: PackOptions) -> anyhow::Result<()> {
    let project_path = match options.project_path {
        Some(path) => path,
        None => env::current_dir()?,
    };

    let mut config = match Config::read_from_folder_or_file(&project_path) {
        Ok(config) => config,
        Err(err) if err.is_not_found() => {
            bail!("Could not find a sheetpack.toml at {}", project_path.display())
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(strategy) = options.strategy {
        config.packer.strategy = strategy;
    }
    if let Some(algorithm) = options.algorithm {
        config.packer.algorithm = algorithm;
    }

    config.validate()?;

    let (names, items) = config.items();
    log::info!(
        "Packing {} rects for '{}' with the {} strategy",
        items.len(),
        config.name,
        config.packer.strategy
    );

    let mut finder = build_finder(&config)?;

    let cancel = CancelToken::new();
    if let Some(seconds) = options.timeout {
        start_timeout(cancel.clone(), Duration::from_secs(seconds));
    }

    let bar = if global.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(ProgressStyle::default_bar().template("{bar:40} {pos:>3}% {msg}"));
        bar
    };

    let listener_bar = bar.clone();
    finder
        .progress_mut()
        .subscribe(move |percent| listener_bar.set_position(u64::from(percent)));

    let result = finder.find_minimum_bounding_box(&items, &cancel);
    bar.finish_and_clear();

    let result = match result? {
        Some(result) => result,
        None if cancel.is_cancelled() => bail!("Timed out before any layout was found"),
        None => bail!(
            "The {} strategy could not fit {} rects",
            config.packer.strategy,
            items.len()
        ),
    };

    if cancel.is_cancelled() {
        log::warn!("Timed out, using the best layout found so far");
    }

    let layout = Layout::from_result(&config.name, &names, &result);

    log::info!(
        "Packed {} rects into {}x{} ({:.1}% used)",
        layout.rects.len(),
        layout.width,
        layout.height,
        layout.occupancy * 100.0
    );

    match &options.output {
        Some(path) => {
            let mut file = BufWriter::new(fs::File::create(path)?);
            serde_json::to_writer_pretty(&mut file, &layout)?;
            file.flush()?;

            log::info!("Wrote layout to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &layout)?;
            writeln!(handle)?;
        }
    }

    Ok(())
}

/// Cancels the search once `timeout` has passed.
fn start_timeout(cancel: CancelToken, timeout: Duration) {
    thread::spawn(move || {
        thread::sleep(timeout);
        log::debug!("Timeout of {:?} reached, cancelling", timeout);
        cancel.cancel();
    });
}

fn build_finder(config: &Config) -> anyhow::Result<Box<dyn BoundingBoxFinder<usize>>> {
    let finder: Box<dyn BoundingBoxFinder<usize>> = match config.packer.strategy {
        Strategy::UnknownSize => Box::new(UnknownSizePacker::new(build_placement(config))),
        Strategy::PowerOfTwo => Box::new(PowerOfTwoSizePacker::new(build_placement(config))),
        Strategy::FixedSize => {
            let (width, height) = config
                .packer
                .size
                .context("the fixed-size strategy needs a packer size")?;

            Box::new(FixedSizePacker::new(width, height, build_placement(config)))
        }
        Strategy::Genetic => Box::new(GeneticPacker::new(config.genetic_config())),
    };

    Ok(finder)
}

fn build_placement(config: &Config) -> Box<dyn PlacementAlgorithm<usize>> {
    let algorithm = config.packer.algorithm;

    match config.packer.sort {
        SortOrder::HeightDescending => placement_with(algorithm, HeightThenWidthDescending),
        SortOrder::HeightAscending => placement_with(algorithm, HeightThenWidthAscending),
        SortOrder::Preserve => placement_with(algorithm, PreserveOrder),
    }
}

fn placement_with<S>(algorithm: Algorithm, sorter: S) -> Box<dyn PlacementAlgorithm<usize>>
where
    S: SortHeuristic + 'static,
{
    match algorithm {
        Algorithm::Guillotine => Box::new(GuillotinePlacement::new().with_sorter(sorter)),
        Algorithm::MaximalRects => {
            Box::new(GuillotinePlacement::maximal_rects().with_sorter(sorter))
        }
        Algorithm::Skyline => Box::new(SkylinePlacement::new().with_sorter(sorter)),
        Algorithm::SkylineFast => Box::new(SkylinePlacement::lightweight().with_sorter(sorter)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::path::Path;

    fn config(contents: &str) -> Config {
        Config::from_toml(contents, Path::new("sheetpack.toml")).unwrap()
    }

    #[test]
    fn every_strategy_and_algorithm_packs() {
        let strategies = ["unknown-size", "power-of-two", "fixed-size", "genetic"];
        let algorithms = ["guillotine", "maximal-rects", "skyline", "skyline-fast"];

        for strategy in &strategies {
            for algorithm in &algorithms {
                let config = config(&format!(
                    r#"
                    name = "sheet"

                    [packer]
                    strategy = "{}"
                    algorithm = "{}"
                    size = [128, 128]

                    [genetic]
                    population-size = 4
                    iterations = 20
                    seed = 1

                    [[rects]]
                    name = "square"
                    size = [32, 32]
                    count = 4

                    [[rects]]
                    name = "bar"
                    size = [64, 8]
                    "#,
                    strategy, algorithm
                ));

                let (names, items) = config.items();
                let mut finder = build_finder(&config).unwrap();
                let result = finder
                    .find_minimum_bounding_box(&items, &CancelToken::new())
                    .unwrap()
                    .unwrap();

                let layout = Layout::from_result(&config.name, &names, &result);
                assert_eq!(layout.rects.len(), 5, "{} / {}", strategy, algorithm);
                assert_eq!(result.find_overlap(), None, "{} / {}", strategy, algorithm);
            }
        }
    }

    #[test]
    fn fixed_size_reports_configured_size() {
        let config = config(
            r#"
            name = "sheet"

            [packer]
            strategy = "fixed-size"
            size = [100, 50]

            [[rects]]
            name = "a"
            size = [10, 10]
            "#,
        );

        let (_, items) = config.items();
        let result = build_finder(&config)
            .unwrap()
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(result.size(), (100, 50));
    }
}
