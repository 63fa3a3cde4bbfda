use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    error::{validate_rects, PackError},
    finder::BoundingBoxFinder,
    geometry::{Rect, MAX_DIMENSION},
    placement::Placements,
    progress::{CancelToken, Progress, ReportProgress},
    sort::{HeightThenWidthDescending, SortHeuristic},
    types::{Item, PackingResult},
};

/// Fitness given to patterns that can't be decoded into a valid packing. Any
/// real packing scores higher.
const INFEASIBLE_FITNESS: f64 = f64::MIN_POSITIVE;

/// Knobs for [`GeneticPacker`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneticConfig {
    /// Number of individuals kept alive at once. Must be at least 2.
    pub population_size: usize,

    /// Number of offspring produced before the search stops.
    pub iterations: u32,

    /// Chance, per item, that a child's rotation flag is flipped.
    pub rotation_mutation_rate: f64,

    /// Chance that a random run of a child's order is reversed.
    pub reversal_rate: f64,

    /// Whether items may be turned 90 degrees.
    pub allow_rotation: bool,

    /// Fixes the random number generator so runs are repeatable.
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            iterations: 2000,
            rotation_mutation_rate: 0.05,
            reversal_rate: 0.2,
            allow_rotation: true,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_rotation(mut self, allow_rotation: bool) -> Self {
        self.allow_rotation = allow_rotation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<(), PackError> {
        if self.population_size < 2 {
            return Err(PackError::InvalidGeneticConfig(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }

        for (name, rate) in &[
            ("rotation mutation rate", self.rotation_mutation_rate),
            ("reversal rate", self.reversal_rate),
        ] {
            if !(0.0..=1.0).contains(rate) {
                return Err(PackError::InvalidGeneticConfig(format!(
                    "{} must be between 0 and 1, got {}",
                    name, rate
                )));
            }
        }

        Ok(())
    }
}

/// One candidate solution: the order items are packed in, which items are
/// turned, and the strip width that decoded best.
#[derive(Debug, Clone, PartialEq)]
pub struct PackingPattern {
    pub order: Vec<usize>,
    pub rotated: Vec<bool>,
    pub width: Option<u32>,
}

impl PackingPattern {
    fn oriented_size(&self, sizes: &[(u32, u32)], index: usize) -> (u32, u32) {
        let (width, height) = sizes[index];

        if self.rotated[index] {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Lays items out in shelves `width` wide, returning each item's rect in
    /// pattern order along with the size that was used.
    fn decode(&self, sizes: &[(u32, u32)], width: u32) -> (Vec<(usize, Rect)>, (u64, u64)) {
        let mut placed = Vec::with_capacity(self.order.len());
        let (mut x, mut y, mut shelf_height) = (0u64, 0u64, 0u64);
        let mut used_width = 0u64;

        for &index in &self.order {
            let (item_width, item_height) = self.oriented_size(sizes, index);
            let (item_width, item_height) = (u64::from(item_width), u64::from(item_height));

            if x > 0 && x + item_width > u64::from(width) {
                y += shelf_height;
                x = 0;
                shelf_height = 0;
            }

            placed.push((index, (x, y, item_width, item_height)));

            x += item_width;
            shelf_height = shelf_height.max(item_height);
            used_width = used_width.max(x);
        }

        let used = (used_width, y + shelf_height);
        if used.0 > u64::from(MAX_DIMENSION) || used.1 > u64::from(MAX_DIMENSION) {
            return (Vec::new(), used);
        }

        let placed = placed
            .into_iter()
            .map(|(index, (x, y, width, height))| {
                let pos = (x as u32, y as u32);
                (index, Rect::from_pos_size(pos, (width as u32, height as u32)))
            })
            .collect();

        (placed, used)
    }

    /// Strip widths worth trying: the widest item, a square, and a few wider
    /// shapes, plus whatever width this pattern already had.
    fn candidate_widths(&self, sizes: &[(u32, u32)]) -> Vec<u32> {
        let mut min_width = 0;
        let mut total_area = 0u64;

        for index in 0..sizes.len() {
            let (width, height) = self.oriented_size(sizes, index);
            min_width = min_width.max(width);
            total_area += u64::from(width) * u64::from(height);
        }

        let square = (total_area as f64).sqrt().ceil();

        let mut widths = vec![min_width];
        widths.extend(self.width);
        widths.extend([1.0, 1.25, 1.5, 2.0].iter().map(|factor| {
            (square * factor)
                .ceil()
                .min(f64::from(MAX_DIMENSION)) as u32
        }));

        for width in &mut widths {
            *width = (*width).max(min_width).min(MAX_DIMENSION);
        }

        widths.sort_unstable();
        widths.dedup();
        widths
    }
}

#[derive(Debug, Clone)]
struct Individual {
    pattern: PackingPattern,
    fitness: f64,
}

/// Searches for a small box by evolving the order and rotation of items.
///
/// Each individual is decoded with a simple shelf layout at a handful of
/// candidate widths, and the smallest area wins. Parents are chosen by
/// roulette selection, combined with an order crossover, and mutated by
/// flipping rotations and reversing runs. Each child replaces the least fit
/// member of the population.
///
/// One member of the starting population is always the items sorted by
/// decreasing height, so the result is never worse than a plain sorted shelf
/// packing. When cancelled, the best individual so far is returned.
pub struct GeneticPacker {
    config: GeneticConfig,
    progress: Progress,
}

impl GeneticPacker {
    pub fn new(config: GeneticConfig) -> Self {
        Self {
            config,
            progress: Progress::new(true),
        }
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    fn evaluate(&self, mut pattern: PackingPattern, sizes: &[(u32, u32)]) -> Individual {
        let mut best: Option<(u64, u32)> = None;

        for width in pattern.candidate_widths(sizes) {
            let (placed, (used_width, used_height)) = pattern.decode(sizes, width);
            if placed.is_empty() {
                continue;
            }

            let area = used_width * used_height;
            if best.map_or(true, |(best_area, _)| area < best_area) {
                best = Some((area, width));
            }
        }

        match best {
            Some((area, width)) => {
                pattern.width = Some(width);
                Individual {
                    pattern,
                    fitness: 1.0 / area.max(1) as f64,
                }
            }
            None => {
                pattern.width = None;
                Individual {
                    pattern,
                    fitness: INFEASIBLE_FITNESS,
                }
            }
        }
    }

    fn random_pattern(&self, count: usize, rng: &mut StdRng) -> PackingPattern {
        let mut order: Vec<usize> = (0..count).collect();
        order.shuffle(rng);

        let rotated = (0..count)
            .map(|_| self.config.allow_rotation && rng.gen_bool(0.5))
            .collect();

        PackingPattern {
            order,
            rotated,
            width: None,
        }
    }

    fn mutate(&self, pattern: &mut PackingPattern, rng: &mut StdRng) {
        if self.config.allow_rotation {
            for flag in &mut pattern.rotated {
                if rng.gen_bool(self.config.rotation_mutation_rate) {
                    *flag = !*flag;
                }
            }
        }

        let len = pattern.order.len();
        if len >= 2 && rng.gen_bool(self.config.reversal_rate) {
            let (start, end) = ordered_pair(rng.gen_range(0..len), rng.gen_range(0..len));
            pattern.order[start..=end].reverse();
        }
    }
}

impl ReportProgress for GeneticPacker {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }
}

impl<P: Clone> BoundingBoxFinder<P> for GeneticPacker {
    fn find_minimum_bounding_box(
        &mut self,
        rects: &[Item<P>],
        cancel: &CancelToken,
    ) -> Result<Option<PackingResult<P>>, PackError> {
        self.config.validate()?;
        validate_rects(rects.iter().map(|item| &item.rect))?;
        self.progress.reset();

        if rects.is_empty() {
            self.progress.finish();
            return Ok(Some(PackingResult::empty()));
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let bare: Vec<Rect> = rects
            .iter()
            .map(|item| Rect::from_size(item.rect.width(), item.rect.height()))
            .collect();
        let sizes: Vec<(u32, u32)> = bare.iter().map(Rect::size).collect();

        let mut population = Vec::with_capacity(self.config.population_size);

        for member in 0..self.config.population_size {
            if cancel.is_cancelled() {
                break;
            }

            let pattern = if member == 0 {
                PackingPattern {
                    order: HeightThenWidthDescending.order(&bare),
                    rotated: vec![false; rects.len()],
                    width: None,
                }
            } else {
                self.random_pattern(rects.len(), &mut rng)
            };

            population.push(self.evaluate(pattern, &sizes));
        }

        if population.len() >= 2 {
            for generation in 0..self.config.iterations {
                if cancel.is_cancelled() {
                    log::debug!("Genetic search cancelled after {} generations", generation);
                    break;
                }

                let first = roulette(&population, None, &mut rng);
                let second = roulette(&population, Some(first), &mut rng);

                let mut child = order_crossover(
                    &population[first].pattern,
                    &population[second].pattern,
                    &mut rng,
                );
                self.mutate(&mut child, &mut rng);
                let child = self.evaluate(child, &sizes);

                let worst = fittest_by(&population, |a, b| a < b);
                log::trace!(
                    "Generation {}: child with fitness {} replaces #{}",
                    generation,
                    child.fitness,
                    worst
                );
                population[worst] = child;

                self.progress
                    .set_fraction(u64::from(generation) + 1, u64::from(self.config.iterations));
            }
        }

        if population.is_empty() {
            return Ok(None);
        }

        let best = &population[fittest_by(&population, |a, b| a > b)];
        let width = match best.pattern.width {
            Some(width) => width,
            None => {
                self.progress.reset();
                return Ok(None);
            }
        };

        let (placed, (used_width, used_height)) = best.pattern.decode(&sizes, width);

        let mut placements = Placements::new(rects.len());
        for (index, rect) in placed {
            placements.place(rects, index, rect, best.pattern.rotated[index]);
        }

        log::debug!(
            "Genetic search settled on {}x{} (strip width {})",
            used_width,
            used_height,
            width
        );

        self.progress.finish();
        Ok(placements.finish(used_width as u32, used_height as u32))
    }
}

fn ordered_pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Index of the individual that wins every comparison under `better`.
fn fittest_by<F>(population: &[Individual], better: F) -> usize
where
    F: Fn(f64, f64) -> bool,
{
    let mut chosen = 0;

    for (index, individual) in population.iter().enumerate().skip(1) {
        if better(individual.fitness, population[chosen].fitness) {
            chosen = index;
        }
    }

    chosen
}

/// Picks an individual with probability proportional to its fitness, never
/// picking `exclude`.
fn roulette(population: &[Individual], exclude: Option<usize>, rng: &mut StdRng) -> usize {
    let total: f64 = population
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != exclude)
        .map(|(_, individual)| individual.fitness)
        .sum();

    let mut roll = rng.gen::<f64>() * total;
    let mut last = 0;

    for (index, individual) in population.iter().enumerate() {
        if Some(index) == exclude {
            continue;
        }

        last = index;
        roll -= individual.fitness;

        if roll <= 0.0 {
            return index;
        }
    }

    last
}

/// Keeps a random slice of `first` in place and fills the remaining positions
/// with the missing items in the order they appear in `second`. Each item keeps
/// the rotation of the parent it came from.
fn order_crossover(
    first: &PackingPattern,
    second: &PackingPattern,
    rng: &mut StdRng,
) -> PackingPattern {
    let len = first.order.len();
    let (start, end) = ordered_pair(rng.gen_range(0..len), rng.gen_range(0..len));
    let slice = &first.order[start..=end];

    let mut taken = vec![false; len];
    let mut rotated = vec![false; len];

    for &index in slice {
        taken[index] = true;
        rotated[index] = first.rotated[index];
    }

    let rest: Vec<usize> = second
        .order
        .iter()
        .copied()
        .filter(|index| !taken[*index])
        .collect();

    for &index in &rest {
        rotated[index] = second.rotated[index];
    }

    let mut rest = rest.into_iter();
    let mut order = Vec::with_capacity(len);
    order.extend(rest.by_ref().take(start));
    order.extend_from_slice(slice);
    order.extend(rest);

    PackingPattern {
        order,
        rotated,
        width: first.width,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pattern(order: Vec<usize>, rotated: Vec<bool>) -> PackingPattern {
        PackingPattern {
            order,
            rotated,
            width: None,
        }
    }

    fn seeded(seed: u64) -> GeneticPacker {
        GeneticPacker::new(
            GeneticConfig::default()
                .with_population_size(10)
                .with_iterations(200)
                .with_seed(seed),
        )
    }

    #[test]
    fn shelf_decode_wraps() {
        let sizes = vec![(4, 2), (4, 3), (4, 1)];
        let pattern = pattern(vec![0, 1, 2], vec![false; 3]);

        let (placed, used) = pattern.decode(&sizes, 8);

        assert_eq!(used, (8, 4));
        assert_eq!(
            placed,
            vec![
                (0, Rect::new(0, 0, 4, 2)),
                (1, Rect::new(4, 0, 8, 3)),
                (2, Rect::new(0, 3, 4, 4)),
            ]
        );
    }

    #[test]
    fn shelf_decode_honors_rotation() {
        let sizes = vec![(2, 6)];
        let pattern = pattern(vec![0], vec![true]);

        let (placed, used) = pattern.decode(&sizes, 6);

        assert_eq!(used, (6, 2));
        assert_eq!(placed, vec![(0, Rect::new(0, 0, 6, 2))]);
    }

    #[test]
    fn candidate_widths_never_below_widest_item() {
        let sizes = vec![(10, 1), (1, 1), (1, 1)];
        let pattern = pattern(vec![0, 1, 2], vec![false; 3]);

        let widths = pattern.candidate_widths(&sizes);

        assert_eq!(widths[0], 10);
        assert!(widths.iter().all(|width| *width >= 10));
    }

    #[test]
    fn crossover_is_a_permutation() {
        let first = pattern(vec![0, 1, 2, 3, 4, 5], vec![true; 6]);
        let second = pattern(vec![5, 4, 3, 2, 1, 0], vec![false; 6]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let child = order_crossover(&first, &second, &mut rng);

            let mut sorted = child.order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn roulette_skips_excluded() {
        let population: Vec<Individual> = (0..3)
            .map(|_| Individual {
                pattern: pattern(vec![0], vec![false]),
                fitness: 1.0,
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            assert_ne!(roulette(&population, Some(1), &mut rng), 1);
        }
    }

    #[test]
    fn finds_a_valid_packing() {
        let items: Vec<Item<usize>> = (0..12)
            .map(|id| Item::new((3 + (id as u32 * 5) % 11, 2 + (id as u32 * 3) % 7), id))
            .collect();
        let total_area: u64 = items.iter().map(|item| item.rect.area()).sum();

        let mut packer = seeded(42);
        let result = packer
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();

        assert_eq!(result.find_overlap(), None);
        assert_eq!(result.out_of_bounds(), None);
        assert!(result.area() >= total_area);
        assert_eq!(packer.progress().get(), 100);

        for (input, output) in items.iter().zip(&result.items) {
            assert_eq!(input.payload, output.payload);

            let (width, height) = input.size();
            if output.rotated {
                assert_eq!(output.size(), (height, width));
            } else {
                assert_eq!(output.size(), (width, height));
            }
        }
    }

    #[test]
    fn same_seed_same_result() {
        let items: Vec<Item<()>> = (0..8)
            .map(|id| Item::new((2 + id % 5, 1 + id % 3), ()))
            .collect();

        let first = seeded(9)
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();
        let second = seeded(9)
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();

        let rects = |result: &PackingResult<()>| -> Vec<Rect> {
            result.items.iter().map(|item| item.rect).collect()
        };
        assert_eq!(rects(&first), rects(&second));
    }

    #[test]
    fn rotation_can_be_disabled() {
        let items: Vec<Item<()>> = (0..6).map(|id| Item::new((2, 7 + id), ())).collect();

        let mut packer = GeneticPacker::new(
            GeneticConfig::default()
                .with_population_size(6)
                .with_iterations(50)
                .with_rotation(false)
                .with_seed(1),
        );
        let result = packer
            .find_minimum_bounding_box(&items, &CancelToken::new())
            .unwrap()
            .unwrap();

        assert!(result.items.iter().all(|item| !item.rotated));
    }

    #[test]
    fn tiny_population_is_rejected() {
        let mut packer = GeneticPacker::new(GeneticConfig::default().with_population_size(1));
        let error = packer
            .find_minimum_bounding_box(&[Item::new((1, 1), ())], &CancelToken::new())
            .unwrap_err();

        assert!(matches!(error, PackError::InvalidGeneticConfig(_)));
    }

    #[test]
    fn cancelled_midway_returns_best_individual() {
        let items: Vec<Item<usize>> = (0..20)
            .map(|id| Item::new((2 + (id as u32 * 7) % 9, 3 + (id as u32 * 5) % 8), id))
            .collect();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();

        let mut packer = seeded(5);
        packer.progress_mut().subscribe(move |percent| {
            if percent >= 50 {
                trigger.cancel();
            }
        });

        let result = packer
            .find_minimum_bounding_box(&items, &cancel)
            .unwrap()
            .unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(result.find_overlap(), None);
        assert_eq!(result.out_of_bounds(), None);

        for (input, output) in items.iter().zip(&result.items) {
            assert_eq!(input.payload, output.payload);
        }
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = seeded(1)
            .find_minimum_bounding_box(&[Item::new((1, 1), ())], &cancel)
            .unwrap();

        assert!(result.is_none());
    }
}
