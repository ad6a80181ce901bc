//! Derived views over a file collection.
//!
//! # Responsibility
//! - Provide side-effect-free selectors shared by the container and
//!   observers: name ordering, completed count, progress.
//!
//! # Invariants
//! - Nothing here mutates its input.
//! - [`compare_names`] is a total order: distinct names never compare equal,
//!   so an ascending sort reversed equals a descending sort.

use crate::model::file_record::FileRecord;
use feruca::{Collator, Locale, Tailoring};
use std::cell::RefCell;
use std::cmp::Ordering;

thread_local! {
    // Ties are resolved below, not by the collator.
    static COLLATOR: RefCell<Collator> =
        RefCell::new(Collator::new(Tailoring::Cldr(Locale::Root), true, false));
}

/// Direction for name ordering. Ascending is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    pub fn is_ascending(self) -> bool {
        self == Self::Ascending
    }
}

/// Compares two file names the way a reader scanning a list expects.
///
/// Levels, in order:
/// 1. Unicode collation with the CLDR root tailoring, so `éclair.html`
///    sorts between `apple.html` and `zebra.html`;
/// 2. case-folded text;
/// 3. at the first position differing only by case, lowercase first;
/// 4. raw code points, so distinct names never tie.
pub fn compare_names(left: &str, right: &str) -> Ordering {
    let collated = COLLATOR.with(|collator| collator.borrow_mut().collate(left, right));
    let folded = left
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase));

    collated
        .then(folded)
        .then_with(|| case_order(left, right))
        .then_with(|| left.cmp(right))
}

fn case_order(left: &str, right: &str) -> Ordering {
    for (l, r) in left.chars().zip(right.chars()) {
        if l == r {
            continue;
        }
        match (l.is_lowercase(), r.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

/// Name comparator honoring `order`.
pub fn compare_by_name(left: &FileRecord, right: &FileRecord, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => compare_names(&left.name, &right.name),
        SortOrder::Descending => compare_names(&right.name, &left.name),
    }
}

/// Stable in-place sort by name.
pub fn sort_by_name(files: &mut [FileRecord], order: SortOrder) {
    files.sort_by(|left, right| compare_by_name(left, right, order));
}

/// Returns the records ordered by name without touching the input.
pub fn sorted_by_name(files: &[FileRecord], order: SortOrder) -> Vec<&FileRecord> {
    let mut sorted: Vec<&FileRecord> = files.iter().collect();
    sorted.sort_by(|left, right| compare_by_name(left, right, order));
    sorted
}

pub fn completed_count(files: &[FileRecord]) -> usize {
    files.iter().filter(|file| file.completed).count()
}

/// Share of completed records in percent; `0.0` for an empty collection.
pub fn progress_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Convenience for [`progress_percentage`] over a collection.
pub fn progress(files: &[FileRecord]) -> f64 {
    progress_percentage(completed_count(files), files.len())
}

#[cfg(test)]
mod tests {
    use super::{
        compare_names, completed_count, progress, progress_percentage, sort_by_name,
        sorted_by_name, SortOrder,
    };
    use crate::model::file_record::FileRecord;
    use chrono::Utc;
    use std::cmp::Ordering;

    fn record(id: &str, name: &str) -> FileRecord {
        FileRecord::with_id(id, name, "", 0, Utc::now())
    }

    fn names(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|file| file.name.as_str()).collect()
    }

    #[test]
    fn names_compare_case_insensitively_first() {
        assert_eq!(compare_names("apple.html", "Banana.html"), Ordering::Less);
        assert_eq!(compare_names("Zeta.html", "alpha.html"), Ordering::Greater);
    }

    #[test]
    fn case_only_differences_put_lowercase_first() {
        assert_eq!(compare_names("a.html", "A.html"), Ordering::Less);
        assert_eq!(compare_names("A.html", "a.html"), Ordering::Greater);
        assert_eq!(compare_names("same.html", "same.html"), Ordering::Equal);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        assert_eq!(compare_names("éclair.html", "zebra.html"), Ordering::Less);
        assert_eq!(compare_names("Über.html", "vogel.html"), Ordering::Less);
        assert_eq!(compare_names("eclair.html", "éclair.html"), Ordering::Less);

        let mut files = vec![
            record("1", "zebra.html"),
            record("2", "éclair.html"),
            record("3", "apple.html"),
        ];
        sort_by_name(&mut files, SortOrder::Ascending);
        assert_eq!(names(&files), vec!["apple.html", "éclair.html", "zebra.html"]);
    }

    #[test]
    fn non_ascii_descending_is_exact_reverse() {
        let mut files = vec![
            record("1", "Ärger.html"),
            record("2", "arbeit.html"),
            record("3", "Øre.html"),
            record("4", "ørsted.html"),
            record("5", "naïve.html"),
            record("6", "naive.html"),
        ];
        sort_by_name(&mut files, SortOrder::Ascending);
        let ascending: Vec<String> = names(&files).iter().map(|n| n.to_string()).collect();

        sort_by_name(&mut files, SortOrder::Descending);
        let mut descending: Vec<String> = names(&files).iter().map(|n| n.to_string()).collect();
        descending.reverse();
        assert_eq!(descending, ascending);
    }

    #[test]
    fn descending_is_exact_reverse_for_distinct_names() {
        let mut files = vec![
            record("1", "b.html"),
            record("2", "A.html"),
            record("3", "a.html"),
            record("4", "c.htm"),
        ];

        sort_by_name(&mut files, SortOrder::Ascending);
        let ascending: Vec<String> = names(&files).iter().map(|n| n.to_string()).collect();
        assert_eq!(ascending, vec!["a.html", "A.html", "b.html", "c.htm"]);

        sort_by_name(&mut files, SortOrder::Descending);
        let mut descending: Vec<String> = names(&files).iter().map(|n| n.to_string()).collect();
        descending.reverse();
        assert_eq!(descending, ascending);
    }

    #[test]
    fn equal_names_keep_relative_order() {
        let mut files = vec![
            record("first", "same.html"),
            record("other", "a.html"),
            record("second", "same.html"),
        ];
        sort_by_name(&mut files, SortOrder::Descending);
        let ids: Vec<&str> = files.iter().map(|file| file.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "other"]);
    }

    #[test]
    fn sorted_by_name_leaves_input_untouched() {
        let files = vec![record("1", "b.html"), record("2", "a.html")];
        let sorted = sorted_by_name(&files, SortOrder::default());
        assert_eq!(sorted[0].name, "a.html");
        assert_eq!(names(&files), vec!["b.html", "a.html"]);
    }

    #[test]
    fn progress_is_zero_for_empty_collection() {
        assert_eq!(progress_percentage(0, 0), 0.0);
        assert_eq!(progress(&[]), 0.0);
    }

    #[test]
    fn progress_reflects_completed_share() {
        let files = vec![
            record("1", "a.html").completed(true),
            record("2", "b.html"),
            record("3", "c.html").completed(true),
            record("4", "d.html"),
        ];
        assert_eq!(completed_count(&files), 2);
        assert_eq!(progress(&files), 50.0);
    }
}
