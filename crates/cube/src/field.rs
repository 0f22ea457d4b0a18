/// Key used when a field name slugs down to nothing.
pub const UNKNOWN_FIELD_KEY: &str = "unknownField";

/// Deterministic template key for a field display name.
///
/// Lowercases, folds whitespace runs to `_`, strips everything outside
/// `[a-z0-9_]`, then strips leading characters until the key starts with a
/// letter or underscore. Distinct names may collide.
pub fn safe_key(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_space {
                folded.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            folded.push(ch);
        }
    }

    let key = folded.trim_start_matches(|c: char| c.is_ascii_digit());
    if key.is_empty() {
        UNKNOWN_FIELD_KEY.to_string()
    } else {
        key.to_string()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Dimension,
    Measure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position within its own block (dimensions or measures).
    pub index: usize,
    pub name: String,
    pub label: String,
    pub safe_key: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, index: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            index,
            label: name.clone(),
            safe_key: safe_key(&name),
            name,
            kind,
        }
    }

    pub fn dimension(index: usize, name: impl Into<String>) -> Self {
        Self::new(FieldKind::Dimension, index, name)
    }

    pub fn measure(index: usize, name: impl Into<String>) -> Self {
        Self::new(FieldKind::Measure, index, name)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Counts that fix the width of a complete matrix.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CubeShape {
    pub dimension_count: usize,
    pub measure_count: usize,
    pub row_count: usize,
}

impl CubeShape {
    pub fn total_cols(&self) -> usize {
        self.dimension_count + self.measure_count
    }
}

/// Field metadata and size of a cube as described by the query host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeDescriptor {
    pub dimensions: Vec<FieldDescriptor>,
    pub measures: Vec<FieldDescriptor>,
    pub row_count: usize,
}

impl CubeDescriptor {
    pub fn from_names<D, M>(dimensions: D, measures: M, row_count: usize) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            dimensions: dimensions
                .into_iter()
                .enumerate()
                .map(|(i, n)| FieldDescriptor::dimension(i, n))
                .collect(),
            measures: measures
                .into_iter()
                .enumerate()
                .map(|(i, n)| FieldDescriptor::measure(i, n))
                .collect(),
            row_count,
        }
    }

    pub fn shape(&self) -> CubeShape {
        CubeShape {
            dimension_count: self.dimensions.len(),
            measure_count: self.measures.len(),
            row_count: self.row_count,
        }
    }

    /// Descriptor of the column at `col` in a full-width row.
    pub fn column(&self, col: usize) -> Option<&FieldDescriptor> {
        if col < self.dimensions.len() {
            self.dimensions.get(col)
        } else {
            self.measures.get(col - self.dimensions.len())
        }
    }

    /// Checks the descriptor contract; violations are programmer errors.
    pub fn validate(&self) -> Result<(), String> {
        if self.dimensions.is_empty() {
            return Err("cube has no dimensions".to_string());
        }
        for (block, kind, fields) in [
            ("dimension", FieldKind::Dimension, &self.dimensions),
            ("measure", FieldKind::Measure, &self.measures),
        ] {
            for (pos, field) in fields.iter().enumerate() {
                if field.index != pos {
                    return Err(format!(
                        "{block} at position {pos} carries index {}",
                        field.index
                    ));
                }
                if field.kind != kind {
                    return Err(format!("{block} at position {pos} has kind {:?}", field.kind));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CubeDescriptor, FieldDescriptor, FieldKind, UNKNOWN_FIELD_KEY, safe_key};

    #[test]
    fn safe_key_slugs_display_names() {
        assert_eq!(safe_key("Job Title"), "job_title");
        assert_eq!(safe_key("  Sales  (EUR) "), "_sales_eur_");
        assert_eq!(safe_key("Région"), "rgion");
        assert_eq!(safe_key("2024 Revenue"), "_revenue");
        assert_eq!(safe_key("42"), UNKNOWN_FIELD_KEY);
        assert_eq!(safe_key(""), UNKNOWN_FIELD_KEY);
        assert_eq!(safe_key("%%"), UNKNOWN_FIELD_KEY);
    }

    #[test]
    fn safe_keys_may_collide() {
        assert_eq!(safe_key("Co-Op"), safe_key("coop"));
    }

    #[test]
    fn column_lookup_spans_both_blocks() {
        let d = CubeDescriptor::from_names(["Lat", "Lng", "Name"], ["Sales"], 10);
        assert_eq!(d.shape().total_cols(), 4);
        assert_eq!(d.column(2).map(|f| f.name.as_str()), Some("Name"));
        assert_eq!(d.column(3).map(|f| f.kind), Some(FieldKind::Measure));
        assert!(d.column(4).is_none());
        assert!(d.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inconsistent_descriptors() {
        let mut d = CubeDescriptor::from_names(["Lat"], Vec::<String>::new(), 1);
        d.dimensions.push(FieldDescriptor::dimension(5, "Oops"));
        assert!(d.validate().is_err());

        let empty = CubeDescriptor::from_names(Vec::<String>::new(), ["Sales"], 1);
        assert!(empty.validate().is_err());
    }
}
