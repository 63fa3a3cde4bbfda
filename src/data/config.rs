use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use rectpack::{GeneticConfig, Item};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static CONFIG_FILENAME: &str = "sheetpack.toml";

/// Configuration for sheetpack, contained in a sheetpack.toml file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// The name of the sheet, copied into the layout output.
    pub name: String,

    /// How the sheet should be packed.
    #[serde(default)]
    pub packer: PackerConfig,

    /// Tuning for the genetic strategy. Ignored by every other strategy.
    #[serde(default)]
    pub genetic: Option<GeneticSection>,

    /// The rectangles to pack.
    #[serde(default)]
    pub rects: Vec<RectConfig>,

    /// The path that this config came from.
    #[serde(skip)]
    pub file_path: PathBuf,
}

impl Config {
    pub fn read_from_folder_or_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        if meta.is_file() {
            Self::read_from_file(path)
        } else {
            Self::read_from_folder(path)
        }
    }

    pub fn read_from_folder<P: AsRef<Path>>(folder_path: P) -> Result<Self, ConfigError> {
        let folder_path = folder_path.as_ref();
        let file_path = &folder_path.join(CONFIG_FILENAME);

        Self::read_from_file(file_path)
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        Self::from_toml(&contents, path)
    }

    /// Parses a config as if it had been read from `path`.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: path.to_owned(),
            source,
        })?;
        config.file_path = path.to_owned();

        Ok(config)
    }

    /// Checks the parts of the config that serde can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packer.strategy == Strategy::FixedSize && self.packer.size.is_none() {
            return Err(ConfigError::Invalid(
                "the fixed-size strategy needs a packer size, like `size = [512, 512]`".to_owned(),
            ));
        }

        for rect in &self.rects {
            if rect.count == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rect '{}' has a count of zero",
                    rect.name
                )));
            }
        }

        Ok(())
    }

    /// Expands every rect by its count into items for the packer. Each item's
    /// payload is an index into the returned list of names.
    pub fn items(&self) -> (Vec<String>, Vec<Item<usize>>) {
        let mut names = Vec::new();
        let mut items = Vec::new();

        for rect in &self.rects {
            for copy in 0..rect.count {
                let name = if rect.count == 1 {
                    rect.name.clone()
                } else {
                    format!("{}-{}", rect.name, copy)
                };

                items.push(Item::new(rect.size, names.len()));
                names.push(name);
            }
        }

        (names, items)
    }

    pub fn genetic_config(&self) -> GeneticConfig {
        let mut config = GeneticConfig::default();

        if let Some(section) = &self.genetic {
            if let Some(population_size) = section.population_size {
                config.population_size = population_size;
            }
            if let Some(iterations) = section.iterations {
                config.iterations = iterations;
            }
            if let Some(allow_rotation) = section.allow_rotation {
                config.allow_rotation = allow_rotation;
            }
            config.seed = section.seed;
        }

        config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PackerConfig {
    #[serde(default)]
    pub strategy: Strategy,

    #[serde(default)]
    pub algorithm: Algorithm,

    #[serde(default)]
    pub sort: SortOrder,

    /// The box size, used by the fixed-size strategy.
    #[serde(default)]
    pub size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GeneticSection {
    pub population_size: Option<usize>,
    pub iterations: Option<u32>,
    pub seed: Option<u64>,
    pub allow_rotation: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RectConfig {
    pub name: String,
    pub size: (u32, u32),

    /// How many copies of this rect to pack.
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// How the size of the sheet is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    UnknownSize,
    PowerOfTwo,
    FixedSize,
    Genetic,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::UnknownSize
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Strategy, Self::Err> {
        match value {
            "unknown-size" => Ok(Strategy::UnknownSize),
            "power-of-two" => Ok(Strategy::PowerOfTwo),
            "fixed-size" => Ok(Strategy::FixedSize),
            "genetic" => Ok(Strategy::Genetic),

            _ => Err(String::from(
                "Invalid strategy. Valid options are 'unknown-size', 'power-of-two', \
                 'fixed-size' and 'genetic'.",
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Strategy::UnknownSize => "unknown-size",
            Strategy::PowerOfTwo => "power-of-two",
            Strategy::FixedSize => "fixed-size",
            Strategy::Genetic => "genetic",
        };

        formatter.write_str(name)
    }
}

/// Which placement algorithm fills each candidate box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Guillotine,
    MaximalRects,
    Skyline,
    SkylineFast,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Guillotine
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(value: &str) -> Result<Algorithm, Self::Err> {
        match value {
            "guillotine" => Ok(Algorithm::Guillotine),
            "maximal-rects" => Ok(Algorithm::MaximalRects),
            "skyline" => Ok(Algorithm::Skyline),
            "skyline-fast" => Ok(Algorithm::SkylineFast),

            _ => Err(String::from(
                "Invalid algorithm. Valid options are 'guillotine', 'maximal-rects', \
                 'skyline' and 'skyline-fast'.",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    HeightDescending,
    HeightAscending,
    Preserve,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::HeightDescending
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{source} in {}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{source} in {}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Tells whether this ConfigError originated because of a path not
    /// existing.
    pub fn is_not_found(&self) -> bool {
        match self {
            ConfigError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(contents: &str) -> Result<Config, ConfigError> {
        Config::from_toml(contents, Path::new("sheetpack.toml"))
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
            name = "ui"

            [packer]
            strategy = "genetic"
            algorithm = "skyline"
            sort = "preserve"

            [genetic]
            population-size = 40
            iterations = 3000
            seed = 7

            [[rects]]
            name = "button"
            size = [64, 32]

            [[rects]]
            name = "star"
            size = [16, 16]
            count = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "ui");
        assert_eq!(config.packer.strategy, Strategy::Genetic);
        assert_eq!(config.packer.algorithm, Algorithm::Skyline);
        assert_eq!(config.packer.sort, SortOrder::Preserve);
        assert_eq!(config.rects[1].count, 3);

        let genetic = config.genetic_config();
        assert_eq!(genetic.population_size, 40);
        assert_eq!(genetic.iterations, 3000);
        assert_eq!(genetic.seed, Some(7));
        assert!(genetic.allow_rotation);
    }

    #[test]
    fn defaults() {
        let config = parse("name = \"empty\"").unwrap();

        assert_eq!(config.packer, PackerConfig::default());
        assert_eq!(config.packer.strategy, Strategy::UnknownSize);
        assert_eq!(config.packer.algorithm, Algorithm::Guillotine);
        assert_eq!(config.genetic_config(), GeneticConfig::default());
        assert!(config.rects.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn items_expand_counts() {
        let config = parse(
            r#"
            name = "icons"

            [[rects]]
            name = "logo"
            size = [100, 20]

            [[rects]]
            name = "dot"
            size = [4, 4]
            count = 2
            "#,
        )
        .unwrap();

        let (names, items) = config.items();

        assert_eq!(names, vec!["logo", "dot-0", "dot-1"]);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].size(), (100, 20));
        assert_eq!(items[2].size(), (4, 4));
        assert_eq!(items[2].payload, 2);
    }

    #[test]
    fn fixed_size_needs_a_size() {
        let config = parse(
            r#"
            name = "sheet"

            [packer]
            strategy = "fixed-size"
            "#,
        )
        .unwrap();

        match config.validate() {
            Err(ConfigError::Invalid(_)) => {}
            other => panic!("expected an invalid config, got {:?}", other),
        }
    }

    #[test]
    fn zero_count_is_invalid() {
        let config = parse(
            r#"
            name = "sheet"

            [[rects]]
            name = "nothing"
            size = [1, 1]
            count = 0
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = parse(
            r#"
            name = "sheet"
            max-size = [1, 1]
            "#,
        )
        .unwrap_err();

        assert!(matches!(error, ConfigError::Toml { .. }));
    }

    #[test]
    fn strategy_names_round_trip() {
        for strategy in &[
            Strategy::UnknownSize,
            Strategy::PowerOfTwo,
            Strategy::FixedSize,
            Strategy::Genetic,
        ] {
            assert_eq!(strategy.to_string().parse::<Strategy>(), Ok(*strategy));
        }

        assert!("biggest".parse::<Strategy>().is_err());
        assert_eq!("skyline-fast".parse::<Algorithm>(), Ok(Algorithm::SkylineFast));
    }

    #[test]
    fn missing_file() {
        let error = Config::read_from_folder("this/folder/does/not/exist").unwrap_err();
        assert!(error.is_not_found());
    }
}
