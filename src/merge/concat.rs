use crate::config::ConcatCategory;

/// Returns the first category whose module markers occur in `module_name`,
/// compared case-insensitively.
pub fn matching_category<'a>(
    categories: &'a [ConcatCategory],
    module_name: &str,
) -> Option<&'a ConcatCategory> {
    let module_name = module_name.to_lowercase();
    categories.iter().find(|category| {
        category
            .module_markers
            .iter()
            .any(|marker| module_name.contains(&marker.to_lowercase()))
    })
}

/// Joins, with single spaces and in column order, the values of every column
/// whose lower-cased header contains one of `fragments`.
pub fn concat_answers(columns: &[String], row: &[String], fragments: &[String]) -> String {
    let fragments: Vec<String> = fragments.iter().map(|fragment| fragment.to_lowercase()).collect();
    columns
        .iter()
        .zip(row)
        .filter(|(column, _)| {
            let header = column.to_lowercase();
            fragments.iter().any(|fragment| header.contains(fragment.as_str()))
        })
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
