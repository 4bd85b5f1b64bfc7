//! Danger ranking and admin filtering.

use log::{debug, warn};

use crate::{parse_category, parse_danger_level, Category, DangerLevel, ResolvedPath};

/// Wildcard accepted by [`FilterCriteria::parse`], in canonical and display form.
const ALL_VALUES: [&str; 2] = ["all", "전체"];

/// Sort key for a danger level: low=1, medium=2, high=3, unset=0.
pub fn danger_priority(level: Option<DangerLevel>) -> u8 {
    match level {
        Some(DangerLevel::Low) => 1,
        Some(DangerLevel::Medium) => 2,
        Some(DangerLevel::High) => 3,
        None => 0,
    }
}

/// Order paths by ascending danger priority.
///
/// The sort is stable: paths with the same priority keep their input order.
/// Renderers draw in this order, so the most dangerous paths end up on top.
///
/// # Example
/// ```
/// use danger_paths::{DangerLevel, DangerPath, GeoPoint, ResolvedPath, rank_by_danger};
///
/// let p = GeoPoint::new(35.854, 128.486);
/// let make = |id: &str, level| {
///     ResolvedPath::from_path(
///         DangerPath::new(id, p, p).with_coords(vec![p, p]).with_danger_level(level),
///     )
///     .unwrap()
/// };
///
/// let ranked = rank_by_danger(&[make("a", DangerLevel::High), make("b", DangerLevel::Low)]);
/// assert_eq!(ranked[0].id, "b");
/// ```
pub fn rank_by_danger(paths: &[ResolvedPath]) -> Vec<ResolvedPath> {
    let mut ranked = paths.to_vec();
    ranked.sort_by_key(|p| danger_priority(p.danger_level));
    ranked
}

/// Every value of a dimension, exactly one, or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
    /// An unrecognised filter value; matches no path.
    NoMatch,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    /// `All` matches anything, including unset values. `Only(x)` matches `Some(x)`.
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted),
            Selection::NoMatch => false,
        }
    }
}

/// Category / danger-level filter applied before overlap counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub category: Selection<Category>,
    pub danger_level: Selection<DangerLevel>,
}

impl FilterCriteria {
    /// Criteria that keep every path.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Selection::Only(category);
        self
    }

    pub fn with_danger_level(mut self, level: DangerLevel) -> Self {
        self.danger_level = Selection::Only(level);
        self
    }

    /// Build criteria from the raw values an admin form submits.
    ///
    /// Values are trimmed. `"all"` / `"전체"` select every value. A value
    /// that names no category or danger level becomes [`Selection::NoMatch`],
    /// so the filtered set is empty rather than the request failing.
    ///
    /// # Example
    /// ```
    /// use danger_paths::{Category, FilterCriteria, Selection};
    ///
    /// let criteria = FilterCriteria::parse("좁은 길목", "전체");
    /// assert_eq!(criteria.category, Selection::Only(Category::NarrowPassage));
    /// assert_eq!(criteria.danger_level, Selection::All);
    ///
    /// assert_eq!(FilterCriteria::parse("everything", "all").category, Selection::NoMatch);
    /// ```
    pub fn parse(category: &str, danger_level: &str) -> Self {
        Self {
            category: parse_selection(category, parse_category),
            danger_level: parse_selection(danger_level, parse_danger_level),
        }
    }

    /// Check a single path against both dimensions.
    pub fn matches(&self, path: &ResolvedPath) -> bool {
        self.category.matches(path.category.as_ref())
            && self.danger_level.matches(path.danger_level.as_ref())
    }
}

fn parse_selection<T>(raw: &str, parse: fn(&str) -> Option<T>) -> Selection<T> {
    let value = raw.trim();
    if ALL_VALUES.contains(&value) {
        return Selection::All;
    }
    match parse(value) {
        Some(v) => Selection::Only(v),
        None => {
            warn!("[Ranking] Unrecognised filter value {:?}, nothing will match", raw);
            Selection::NoMatch
        }
    }
}

/// Keep the paths matching `criteria`, in input order.
pub fn filter_paths(paths: &[ResolvedPath], criteria: &FilterCriteria) -> Vec<ResolvedPath> {
    let filtered: Vec<ResolvedPath> = paths
        .iter()
        .filter(|p| criteria.matches(p))
        .cloned()
        .collect();

    debug!(
        "[Ranking] Filter {:?} kept {}/{} paths",
        criteria,
        filtered.len(),
        paths.len()
    );

    filtered
}
