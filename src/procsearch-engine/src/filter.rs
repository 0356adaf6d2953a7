//! Filter pipeline: category, then specialty, then procedure name.
//!
//! Stages are combined with logical AND and evaluated cheapest first, so a
//! record rejected by the category check never has its text folded. The
//! relative order of surviving records is always the input order.

use crate::config::CategoryLabels;
use crate::matcher::Pattern;
use crate::query::QueryState;
use crate::record::Record;

/// A query state compiled for repeated evaluation against records.
#[derive(Debug, Clone)]
pub struct RecordFilter<'q> {
    category: Option<&'q str>,
    specialty: Option<Pattern>,
    name: Option<Pattern>,
}

impl<'q> RecordFilter<'q> {
    /// Compiles the active stages of `query`.
    ///
    /// A blank text query disables its stage rather than matching nothing.
    pub fn new(query: &'q QueryState, labels: &'q CategoryLabels) -> Self {
        Self {
            category: query.category_filter.resolve(labels),
            specialty: Pattern::new(&query.specialty_filter, query.match_mode),
            name: Pattern::new(&query.search_text, query.match_mode),
        }
    }

    /// Returns true when every stage is disabled.
    pub fn is_pass_through(&self) -> bool {
        self.category.is_none() && self.specialty.is_none() && self.name.is_none()
    }

    /// Checks a single record against all active stages.
    pub fn accepts(&self, record: &Record) -> bool {
        if let Some(label) = self.category
            && record.standard_category != label
        {
            return false;
        }
        if let Some(pattern) = &self.specialty
            && !pattern.matches(&record.specialty)
        {
            return false;
        }
        if let Some(pattern) = &self.name
            && !pattern.matches(&record.procedure_name)
        {
            return false;
        }
        true
    }
}

/// Returns the records that pass every active stage, in input order.
pub fn filter<'a>(
    records: &'a [Record],
    query: &QueryState,
    labels: &CategoryLabels,
) -> Vec<&'a Record> {
    let compiled = RecordFilter::new(query, labels);
    if compiled.is_pass_through() {
        return records.iter().collect();
    }

    let result: Vec<&Record> = records.iter().filter(|r| compiled.accepts(r)).collect();
    tracing::debug!(
        total = records.len(),
        matched = result.len(),
        mode = %query.match_mode,
        "filtered records"
    );
    result
}

/// Like [`filter`], returning owned records.
pub fn filter_owned(records: &[Record], query: &QueryState, labels: &CategoryLabels) -> Vec<Record> {
    filter(records, query, labels).into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchMode;
    use crate::query::CategoryFilter;

    fn record(id: &str, category: &str, specialty: &str, name: &str) -> Record {
        Record {
            id: id.to_string(),
            standard_category: category.to_string(),
            issuing_decision_ref: String::new(),
            specialty: specialty.to_string(),
            procedure_name: name.to_string(),
            created_at: None,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("1", "old", "Tieu hoa", "1. Noi soi da day"),
            record("2", "new", "Tim mach", "2. Sieu am tim"),
            record("3", "old", "Ngoai khoa", "3. Phau thuat noi soi o bung"),
            record("4", "new", "Tieu hoa", "4. Noi khoa soi da day"),
            record("5", "pilot", "Tim mach", "5. Soi noi khoa"),
        ]
    }

    fn labels() -> CategoryLabels {
        CategoryLabels::new("old", "new")
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_query_passes_everything() {
        let records = sample();
        let result = filter(&records, &QueryState::new(), &labels());
        assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_blank_text_disables_stage() {
        let records = sample();
        let query = QueryState::new().with_search_text("   ").with_specialty("\t");
        assert_eq!(filter(&records, &query, &labels()).len(), 5);
    }

    #[test]
    fn test_category_stage() {
        let records = sample();
        let query = QueryState::new().with_category(CategoryFilter::Old);
        assert_eq!(ids(&filter(&records, &query, &labels())), vec!["1", "3"]);

        let query = QueryState::new().with_category(CategoryFilter::Label("pilot".into()));
        assert_eq!(ids(&filter(&records, &query, &labels())), vec!["5"]);
    }

    #[test]
    fn test_category_uses_configured_labels() {
        let records = sample();
        let query = QueryState::new().with_category(CategoryFilter::Old);
        assert!(filter(&records, &query, &CategoryLabels::default()).is_empty());
    }

    #[test]
    fn test_name_stage_modes() {
        let records = sample();
        let flexible = QueryState::new().with_search_text("noi soi");
        assert_eq!(ids(&filter(&records, &flexible, &labels())), vec!["1", "3", "4", "5"]);

        let sequential = flexible.clone().with_match_mode(MatchMode::Sequential);
        assert_eq!(ids(&filter(&records, &sequential, &labels())), vec!["1", "3", "4"]);

        let exact = flexible.with_match_mode(MatchMode::Exact);
        assert_eq!(ids(&filter(&records, &exact, &labels())), vec!["1", "3"]);
    }

    #[test]
    fn test_mode_applies_to_specialty_too() {
        let records = sample();
        let query = QueryState::new()
            .with_specialty("hoa tieu")
            .with_match_mode(MatchMode::Flexible);
        assert_eq!(ids(&filter(&records, &query, &labels())), vec!["1", "4"]);

        let query = query.with_match_mode(MatchMode::Sequential);
        assert!(filter(&records, &query, &labels()).is_empty());
    }

    #[test]
    fn test_stages_combine_with_and() {
        let records = sample();
        let query = QueryState::new()
            .with_category(CategoryFilter::New)
            .with_specialty("tieu")
            .with_search_text("soi");
        assert_eq!(ids(&filter(&records, &query, &labels())), vec!["4"]);
    }

    #[test]
    fn test_filter_is_stable() {
        let records = sample();
        let queries = [
            QueryState::new().with_search_text("o"),
            QueryState::new().with_specialty("a"),
            QueryState::new().with_category(CategoryFilter::New),
            QueryState::new()
                .with_search_text("i a")
                .with_match_mode(MatchMode::Sequential),
        ];
        for query in queries {
            let result = filter(&records, &query, &labels());
            let positions: Vec<usize> = result
                .iter()
                .map(|r| records.iter().position(|x| x.id == r.id).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "{query:?}");
        }
    }

    #[test]
    fn test_filter_owned() {
        let records = sample();
        let query = QueryState::new().with_search_text("tim");
        let owned = filter_owned(&records, &query, &labels());
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, "2");
    }
}
