//! Row label fix-up for structural grid operations.

/// Merge `new_labels` into `labels` for an operation touching `count` rows
/// starting at `start`. Returns true if the label array changed.
///
/// Three cases:
/// - `start` at or past the end: pad with empty labels up to `start`, then
///   append every new label (nothing happens without new labels).
/// - insert: insert `count` labels at `start`, empty once `new_labels` runs out.
/// - replace: overwrite `[start, start + count)`, append past the old end
///   while new labels remain, and blank existing labels with no replacement.
pub fn fix_row_labels(
    labels: &mut Vec<String>,
    start: usize,
    count: usize,
    new_labels: &[String],
    is_insert: bool,
) -> bool {
    let current_size = labels.len();

    if start >= current_size {
        if new_labels.is_empty() {
            return false;
        }
        labels.resize(start, String::new());
        labels.extend_from_slice(new_labels);
        return true;
    }

    if is_insert {
        for i in 0..count {
            let label = new_labels.get(i).cloned().unwrap_or_default();
            labels.insert(start + i, label);
        }
        return count > 0;
    }

    let mut changed = false;
    for (new_index, i) in (start..start + count).enumerate() {
        match new_labels.get(new_index) {
            Some(label) if i >= current_size => {
                labels.push(label.clone());
                changed = true;
            }
            // Appending empty labels past the end is pointless
            None if i >= current_size => break,
            Some(label) => {
                if labels[i] != *label {
                    labels[i] = label.clone();
                    changed = true;
                }
            }
            None => {
                if !labels[i].is_empty() {
                    labels[i].clear();
                    changed = true;
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pad_past_end() {
        let mut labels = Vec::new();
        assert!(fix_row_labels(&mut labels, 5, 1, &strings(&["Q5"]), false));
        assert_eq!(labels.len(), 6);
        assert!(labels[..5].iter().all(|l| l.is_empty()));
        assert_eq!(labels[5], "Q5");
    }

    #[test]
    fn test_past_end_without_labels_is_noop() {
        let mut labels = strings(&["a"]);
        assert!(!fix_row_labels(&mut labels, 4, 2, &[], false));
        assert_eq!(labels, strings(&["a"]));
    }

    #[test]
    fn test_insert_with_placeholders() {
        let mut labels = strings(&["a", "b", "c"]);
        assert!(fix_row_labels(&mut labels, 1, 3, &strings(&["x"]), true));
        assert_eq!(labels, strings(&["a", "x", "", "", "b", "c"]));
    }

    #[test]
    fn test_replace_appends_and_blanks() {
        let mut labels = strings(&["a", "b", "c"]);
        assert!(fix_row_labels(&mut labels, 1, 2, &strings(&["x"]), false));
        assert_eq!(labels, strings(&["a", "x", ""]));

        let mut labels = strings(&["a", "b"]);
        assert!(fix_row_labels(&mut labels, 1, 3, &strings(&["x", "y", "z"]), false));
        assert_eq!(labels, strings(&["a", "x", "y", "z"]));
    }

    #[test]
    fn test_replace_identical_reports_unchanged() {
        let mut labels = strings(&["a", "b"]);
        assert!(!fix_row_labels(&mut labels, 0, 2, &strings(&["a", "b"]), false));
    }
}
